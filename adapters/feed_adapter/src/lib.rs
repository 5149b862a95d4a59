use sales_core::domain::NewSale;
use sales_core::ports::{DashboardError, Result, SaleFeed};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_FEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One element of the feed array
/// Upstream calls the product `title`; unknown keys such as `image` or `sold` are ignored
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSale {
    #[serde(default)]
    date_of_sale: Option<String>,
    #[serde(default, alias = "title")]
    product: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    price: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

/// Accepts a number, a numeric string ("50") or null; a blank string counts as no price
fn deserialize_price<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawPrice>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPrice::Number(price)) => Ok(Some(price)),
        Some(RawPrice::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .ok()
                .filter(|price| price.is_finite())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid price {:?}", text)))
        }
    }
}

impl From<RawSale> for NewSale {
    fn from(raw: RawSale) -> Self {
        NewSale {
            date_of_sale: raw.date_of_sale.unwrap_or_default(),
            product: raw.product.unwrap_or_default(),
            price: raw.price,
            description: raw.description.unwrap_or_default(),
            category: raw.category,
        }
    }
}

/// Parses a feed document: a JSON array of raw sale objects
pub fn parse_feed(body: &str) -> Result<Vec<NewSale>> {
    let raw: Vec<RawSale> = serde_json::from_str(body).map_err(DashboardError::feed)?;
    Ok(raw.into_iter().map(NewSale::from).collect())
}

/// Where the feed document lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum FeedSource {
    Http(Url),
    File(PathBuf),
}

impl FeedSource {
    fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => FeedSource::Http(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => FeedSource::File(path),
                Err(_) => FeedSource::File(PathBuf::from(url.path())),
            },
            // Bare paths, including Windows drive letters that parse as a scheme
            _ => FeedSource::File(PathBuf::from(location)),
        }
    }
}

/// SaleFeed implementation reading the feed over HTTP(S) or from a local JSON file
pub struct JsonSaleFeed {
    source: FeedSource,
}

impl JsonSaleFeed {
    /// Creates a feed from a URL (`http`, `https`, `file`) or a filesystem path
    pub fn new(location: &str) -> Self {
        Self {
            source: FeedSource::parse(location),
        }
    }

    fn fetch_http(&self, url: &Url) -> Result<String> {
        // Built per call; a blocking client must not be created on an async worker
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(DashboardError::feed)?;

        client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(DashboardError::feed)
    }
}

impl SaleFeed for JsonSaleFeed {
    fn fetch(&self) -> Result<Vec<NewSale>> {
        let body = match &self.source {
            FeedSource::Http(url) => {
                info!(%url, "downloading sale feed");
                self.fetch_http(url)?
            }
            FeedSource::File(path) => {
                info!(path = %path.display(), "reading sale feed");
                fs::read_to_string(path).map_err(DashboardError::feed)?
            }
        };
        parse_feed(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM_SAMPLE: &str = r#"[
        {
            "id": 1,
            "title": "Fjallraven  - Foldsack No. 1 Backpack, Fits 15 Laptops",
            "price": 329.85,
            "description": "Your perfect pack for everyday use",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "sold": false,
            "dateOfSale": "2021-11-27T20:29:54+05:30"
        },
        {
            "id": 2,
            "title": "Mens Casual Slim Fit",
            "description": "The color could be slightly different",
            "sold": false,
            "dateOfSale": "2021-10-27T20:29:54+05:30"
        }
    ]"#;

    #[test]
    fn test_parse_upstream_format() {
        let sales = parse_feed(UPSTREAM_SAMPLE).unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].product, "Fjallraven  - Foldsack No. 1 Backpack, Fits 15 Laptops");
        assert_eq!(sales[0].price, Some(329.85));
        assert_eq!(sales[0].category.as_deref(), Some("men's clothing"));
        assert_eq!(sales[0].date_of_sale, "2021-11-27T20:29:54+05:30");
        assert_eq!(sales[1].price, None);
        assert_eq!(sales[1].category, None);
    }

    #[test]
    fn test_parse_accepts_product_key_and_null_price() {
        let sales = parse_feed(r#"[{"product": "Lamp", "price": null, "dateOfSale": "2022-03-15"}]"#)
            .unwrap();
        assert_eq!(sales[0].product, "Lamp");
        assert_eq!(sales[0].price, None);
        assert_eq!(sales[0].description, "");
    }

    #[test]
    fn test_parse_accepts_numeric_string_prices() {
        let sales = parse_feed(
            r#"[
                {"title": "Lamp", "price": "50", "dateOfSale": "2022-03-01"},
                {"title": "Rug", "price": " 44.6 ", "dateOfSale": "2022-03-02"},
                {"title": "Vase", "price": "", "dateOfSale": "2022-03-03"}
            ]"#,
        )
        .unwrap();
        let prices: Vec<_> = sales.iter().map(|s| s.price).collect();
        assert_eq!(prices, [Some(50.0), Some(44.6), None]);
    }

    #[test]
    fn test_parse_rejects_malformed_feed() {
        assert!(matches!(parse_feed("{\"not\": \"an array\"}"), Err(DashboardError::Feed(_))));
        assert!(matches!(parse_feed("[{\"price\": \"cheap\"}]"), Err(DashboardError::Feed(_))));
        assert!(matches!(parse_feed("[{\"price\": \"NaN\"}]"), Err(DashboardError::Feed(_))));
        assert!(matches!(parse_feed("[{\"price\": true}]"), Err(DashboardError::Feed(_))));
    }

    #[test]
    fn test_source_detection() {
        assert!(matches!(FeedSource::parse(DEFAULT_FEED_URL), FeedSource::Http(_)));
        assert_eq!(
            FeedSource::parse("./seed/sales.json"),
            FeedSource::File(PathBuf::from("./seed/sales.json"))
        );
        assert_eq!(
            FeedSource::parse("file:///tmp/sales.json"),
            FeedSource::File(PathBuf::from("/tmp/sales.json"))
        );
    }

    #[test]
    fn test_fetch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        fs::write(&path, UPSTREAM_SAMPLE).unwrap();

        let feed = JsonSaleFeed::new(path.to_str().unwrap());
        assert_eq!(feed.fetch().unwrap().len(), 2);
    }

    #[test]
    fn test_fetch_missing_file_is_feed_error() {
        let dir = tempfile::tempdir().unwrap();
        let feed = JsonSaleFeed::new(dir.path().join("absent.json").to_str().unwrap());
        assert!(matches!(feed.fetch(), Err(DashboardError::Feed(_))));
    }
}
