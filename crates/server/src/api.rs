use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sales_core::application::DashboardService;
use sales_core::domain::{CategoryCount, CombinedData, PriceBucket, SaleRecord, Statistics};
use sales_core::query::TransactionQuery;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// API error type
///
/// Every variant renders as 500 with a generic message; the cause is only logged.
#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to initialize database")]
    Initialize,

    #[error("Failed to fetch transactions")]
    Transactions,

    #[error("Failed to fetch statistics")]
    Statistics,

    #[error("Failed to fetch bar chart data")]
    BarChart,

    #[error("Failed to fetch pie chart data")]
    PieChart,

    #[error("Failed to fetch combined data")]
    Combined,

    #[error("Failed to check health")]
    Health,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(service: DashboardService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub records: u64,
}

/// Unwraps query-string parameters; undecodable ones fail like the endpoint itself
fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
    failure: ApiError,
) -> Result<T, ApiError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        error!(error = %rejection, "{}: bad query string", failure);
        failure
    })
}

/// Runs a service call on the blocking pool and maps any failure to `failure`
async fn call_service<T, F>(state: &AppState, failure: ApiError, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&DashboardService) -> sales_core::ports::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(error = %e, "{}", failure);
            Err(failure)
        }
        Err(e) => {
            error!(error = %e, "{}: task aborted", failure);
            Err(failure)
        }
    }
}

/// GET /initialize-database - Seed the store from the sale feed
pub async fn initialize_database(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let summary = call_service(&state, ApiError::Initialize, |service| {
        service.initialize_database()
    })
    .await?;
    info!(inserted = summary.inserted, "database initialized");

    Ok(Json(MessageResponse {
        message: "Database initialized successfully".to_string(),
    }))
}

/// GET /transactions - Filtered, paginated listing
///
/// The total number of matches is returned in the `X-Total-Count` header.
pub async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query_params(query, ApiError::Transactions)?;
    let page = call_service(&state, ApiError::Transactions, move |service| {
        service.list_transactions(&query)
    })
    .await?;

    Ok((
        [(TOTAL_COUNT_HEADER, page.total.to_string())],
        Json::<Vec<SaleRecord>>(page.records),
    ))
}

/// GET /statistics
pub async fn statistics(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<Statistics>, ApiError> {
    let query = query_params(query, ApiError::Statistics)?;
    call_service(&state, ApiError::Statistics, move |service| {
        service.statistics(query.month.as_deref())
    })
    .await
    .map(Json)
}

/// GET /bar-chart
pub async fn bar_chart(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<Vec<PriceBucket>>, ApiError> {
    let query = query_params(query, ApiError::BarChart)?;
    call_service(&state, ApiError::BarChart, move |service| {
        service.bar_chart(query.month.as_deref())
    })
    .await
    .map(Json)
}

/// GET /pie-chart
pub async fn pie_chart(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    let query = query_params(query, ApiError::PieChart)?;
    call_service(&state, ApiError::PieChart, move |service| {
        service.pie_chart(query.month.as_deref())
    })
    .await
    .map(Json)
}

/// GET /combined-data - Listing, statistics and both charts in one payload
pub async fn combined_data(
    State(state): State<AppState>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<CombinedData>, ApiError> {
    let query = query_params(query, ApiError::Combined)?;
    call_service(&state, ApiError::Combined, move |service| {
        service.combined_data(query.month.as_deref())
    })
    .await
    .map(Json)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let records = call_service(&state, ApiError::Health, |service| service.record_count()).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        records,
    }))
}
