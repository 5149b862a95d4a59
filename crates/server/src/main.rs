use anyhow::Result;
use clap::Parser;
use server::{config::ServerConfig, init_tracing, run_server};
use std::path::PathBuf;

/// REST backend for the sales transactions dashboard
#[derive(Parser, Debug)]
#[command(name = "sales-dashboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config file)
    #[arg(long, env = "SALES_DASHBOARD_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// SQLite database path (overrides config file)
    #[arg(short = 'd', long = "database", env = "SALES_DASHBOARD_DATABASE")]
    database: Option<PathBuf>,

    /// Seed feed URL or file path (overrides config file)
    #[arg(long, env = "SALES_DASHBOARD_FEED_URL")]
    feed_url: Option<String>,

    /// Import the feed once before serving
    #[arg(long)]
    initialize: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Load configuration
    let mut config = ServerConfig::load(cli.config)?;

    // Apply CLI overrides
    if let Some(addr) = cli.listen_addr {
        config.server.listen_addr = addr;
    }
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }
    if let Some(feed_url) = cli.feed_url {
        config.feed.url = feed_url;
    }

    run_server(config, cli.initialize).await
}
