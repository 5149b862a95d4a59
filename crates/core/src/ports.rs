use crate::domain::{NewSale, SaleId, SaleRecord};
use crate::query::{Page, SaleFilter};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("record store failure: {0}")]
    Store(#[source] BoxError),

    #[error("sale feed failure: {0}")]
    Feed(#[source] BoxError),

    #[error("invalid page request: {0}")]
    InvalidPage(String),
}

impl DashboardError {
    pub fn store(err: impl Into<BoxError>) -> Self {
        DashboardError::Store(err.into())
    }

    pub fn feed(err: impl Into<BoxError>) -> Self {
        DashboardError::Feed(err.into())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Persistent collection of sale records
/// This is a port (interface) implemented by storage adapters
pub trait RecordStore: Send + Sync {
    /// Inserts one sale and returns the id the store assigned to it
    fn insert(&self, sale: &NewSale) -> Result<SaleId>;

    // Matches come back in ascending id order; `window` applies offset/limit
    fn find(&self, filter: &SaleFilter, window: Option<Page>) -> Result<Vec<SaleRecord>>;

    fn count(&self, filter: &SaleFilter) -> Result<u64>;
}

/// Source of raw sales used to seed the store
pub trait SaleFeed: Send + Sync {
    fn fetch(&self) -> Result<Vec<NewSale>>;
}
