use anyhow::{bail, Context, Result};
use feed_adapter::DEFAULT_FEED_URL;
use sales_core::aggregate::{DEFAULT_BUCKET_CEILING, DEFAULT_BUCKET_WIDTH, MAX_BUCKETS};
use sales_core::query::DEFAULT_PER_PAGE;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Sales dashboard server configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP listen address (e.g., "127.0.0.1:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Allow any origin, so a dashboard served elsewhere can poll the API
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite database file; ":memory:" keeps records for the process lifetime only
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// http(s) URL, file:// URL or plain path of the seed document
    #[serde(default = "default_feed_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChartConfig {
    #[serde(default = "default_bucket_width")]
    pub bucket_width: u64,

    /// Upper bound of the last bar; pricier records are left out of the chart
    #[serde(default = "default_bucket_ceiling")]
    pub ceiling: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,
}

// Default values
fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./sales.db")
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_bucket_width() -> u64 {
    DEFAULT_BUCKET_WIDTH
}

fn default_bucket_ceiling() -> u64 {
    DEFAULT_BUCKET_CEILING
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            bucket_width: default_bucket_width(),
            ceiling: default_bucket_ceiling(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults, then the optional TOML file, then environment variables
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overrides fields from environment variables
    ///
    /// Supported environment variables:
    /// - SALES_DASHBOARD_LISTEN_ADDR: HTTP listen address (default: 127.0.0.1:3000)
    /// - SALES_DASHBOARD_ENABLE_CORS: Enable CORS (default: true)
    /// - SALES_DASHBOARD_DATABASE: SQLite database path (default: ./sales.db)
    /// - SALES_DASHBOARD_FEED_URL: Seed feed location
    /// - SALES_DASHBOARD_BUCKET_WIDTH: Bar chart bucket width (default: 100)
    /// - SALES_DASHBOARD_BUCKET_CEILING: Bar chart ceiling (default: 300)
    /// - SALES_DASHBOARD_PER_PAGE: Default listing page size (default: 10)
    ///
    /// Unparseable numeric or boolean values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("SALES_DASHBOARD_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }

        if let Some(Ok(cors)) = lookup("SALES_DASHBOARD_ENABLE_CORS").map(|v| v.parse::<bool>()) {
            self.server.enable_cors = cors;
        }

        if let Some(path) = lookup("SALES_DASHBOARD_DATABASE") {
            self.storage.database_path = PathBuf::from(path);
        }

        if let Some(url) = lookup("SALES_DASHBOARD_FEED_URL") {
            self.feed.url = url;
        }

        if let Some(Ok(width)) = lookup("SALES_DASHBOARD_BUCKET_WIDTH").map(|v| v.parse::<u64>()) {
            self.chart.bucket_width = width;
        }

        if let Some(Ok(ceiling)) = lookup("SALES_DASHBOARD_BUCKET_CEILING").map(|v| v.parse::<u64>()) {
            self.chart.ceiling = ceiling;
        }

        if let Some(Ok(per_page)) = lookup("SALES_DASHBOARD_PER_PAGE").map(|v| v.parse::<u64>()) {
            self.listing.default_per_page = per_page;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if self.chart.bucket_width == 0 {
            bail!("chart.bucket_width must be greater than 0");
        }
        if self.chart.ceiling < self.chart.bucket_width {
            bail!(
                "chart.ceiling ({}) must be at least one bucket wide ({})",
                self.chart.ceiling,
                self.chart.bucket_width
            );
        }
        if self.chart.ceiling / self.chart.bucket_width > MAX_BUCKETS {
            bail!(
                "chart.ceiling / chart.bucket_width gives {} buckets, at most {} allowed",
                self.chart.ceiling / self.chart.bucket_width,
                MAX_BUCKETS
            );
        }
        if self.listing.default_per_page == 0 {
            bail!("listing.default_per_page must be greater than 0");
        }
        if self.feed.url.trim().is_empty() {
            bail!("feed.url must not be empty");
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.server.listen_addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.chart.bucket_width, 100);
        assert_eq!(config.chart.ceiling, 300);
        assert_eq!(config.listing.default_per_page, 10);
        assert_eq!(config.feed.url, DEFAULT_FEED_URL);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [chart]
            ceiling = 900

            [storage]
            database_path = ":memory:"
            "#,
        )
        .unwrap();
        assert_eq!(config.chart.ceiling, 900);
        assert_eq!(config.chart.bucket_width, 100);
        assert_eq!(config.storage.database_path, PathBuf::from(":memory:"));
        assert!(config.server.enable_cors);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, "[server]\nlisten_addr = \"0.0.0.0:8080\"\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_from_missing_file_fails() {
        assert!(ServerConfig::from_file("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SALES_DASHBOARD_LISTEN_ADDR", "0.0.0.0:9000"),
            ("SALES_DASHBOARD_DATABASE", "/tmp/other.db"),
            ("SALES_DASHBOARD_BUCKET_CEILING", "1000"),
            ("SALES_DASHBOARD_PER_PAGE", "not-a-number"),
            ("SALES_DASHBOARD_ENABLE_CORS", "false"),
        ]);
        let mut config = ServerConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.chart.ceiling, 1000);
        assert_eq!(config.listing.default_per_page, 10);
        assert!(!config.server.enable_cors);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.chart.bucket_width = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.chart.ceiling = 50;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.chart.bucket_width = 1;
        config.chart.ceiling = 1_000_000_000_000_000_000;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.chart.bucket_width = 1;
        config.chart.ceiling = MAX_BUCKETS;
        assert!(config.validate().is_ok());

        let mut config = ServerConfig::default();
        config.listing.default_per_page = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.listen_addr = "nowhere".to_string();
        assert!(config.validate().is_err());
    }
}
