pub mod api;
pub mod config;

use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use config::ServerConfig;
use feed_adapter::JsonSaleFeed;
use sales_core::aggregate::BucketLayout;
use sales_core::application::DashboardService;
use sqlite_adapter::SqliteRecordStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use api::AppState;

/// Builds the dashboard routes over the given state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/initialize-database", get(api::initialize_database))
        .route("/transactions", get(api::list_transactions))
        .route("/statistics", get(api::statistics))
        .route("/bar-chart", get(api::bar_chart))
        .route("/pie-chart", get(api::pie_chart))
        .route("/combined-data", get(api::combined_data))
        .route("/health", get(api::health))
        .with_state(state)
}

/// Wires the SQLite store and the JSON feed into a DashboardService
pub fn build_service(config: &ServerConfig) -> Result<DashboardService> {
    let store = SqliteRecordStore::open(&config.storage.database_path)?;
    let feed = JsonSaleFeed::new(&config.feed.url);
    let buckets = BucketLayout::new(config.chart.bucket_width, config.chart.ceiling)
        .ok_or_else(|| anyhow!("invalid bar chart bucket layout"))?;

    Ok(DashboardService::new(Box::new(store), Box::new(feed))
        .with_bucket_layout(buckets)
        .with_default_per_page(config.listing.default_per_page))
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "server=info,sales_core=info,sqlite_adapter=info,feed_adapter=info,tower_http=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Runs the HTTP server until Ctrl-C
/// With `initialize` set, one bulk import runs before the listener opens.
pub async fn run_server(config: ServerConfig, initialize: bool) -> Result<()> {
    tracing::info!("Starting sales dashboard server");
    tracing::debug!("Configuration: {:#?}", config);

    config.validate()?;
    let addr = config.listen_addr()?;

    let service = build_service(&config)?;
    let state = AppState::new(service);

    if initialize {
        let service = state.service.clone();
        let summary = tokio::task::spawn_blocking(move || service.initialize_database()).await??;
        tracing::info!(inserted = summary.inserted, "seeded database from feed");
    }

    let mut app = create_router(state).layer(TraceLayer::new_for_http());
    if config.server.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
