use crate::domain::SaleRecord;
use crate::ports::{DashboardError, Result};
use crate::utils::{date_text, fold_case, price_text};
use serde::Deserialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Store-side predicate built from the month and search terms
///
/// Both terms are kept case-folded. An absent or empty term places no
/// restriction, which is the same as an empty pattern matching every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    month: Option<String>,
    search: Option<String>,
}

impl SaleFilter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter used by the aggregators: month only
    pub fn by_month(month: Option<&str>) -> Self {
        Self::new(month, None)
    }

    pub fn new(month: Option<&str>, search: Option<&str>) -> Self {
        Self {
            month: normalize(month),
            search: normalize(search),
        }
    }

    /// Case-folded month term, if any
    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    /// Case-folded search term, if any
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Evaluates the filter against a record in memory
    /// Storage adapters translate the same rules into their own query language
    pub fn matches(&self, record: &SaleRecord) -> bool {
        if let Some(month) = &self.month {
            if !fold_case(&date_text(&record.date_of_sale)).contains(month.as_str()) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let in_product = fold_case(&record.product).contains(search.as_str());
            let in_description = fold_case(&record.description).contains(search.as_str());
            let in_price = record
                .price
                .map(|price| price_text(price).contains(search.as_str()))
                .unwrap_or(false);
            if !(in_product || in_description || in_price) {
                return false;
            }
        }

        true
    }
}

fn normalize(term: Option<&str>) -> Option<String> {
    term.filter(|t| !t.is_empty()).map(fold_case)
}

/// One-based page window over an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u64,
    per_page: u64,
}

impl Page {
    pub fn new(number: u64, per_page: u64) -> Result<Self> {
        if number < 1 {
            return Err(DashboardError::InvalidPage(format!(
                "page must be at least 1 (got {})",
                number
            )));
        }
        if per_page < 1 {
            return Err(DashboardError::InvalidPage(format!(
                "per_page must be at least 1 (got {})",
                per_page
            )));
        }
        Ok(Self { number, per_page })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of matches skipped before this page
    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// Applies the window to an already ordered slice
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(items.len());
        let len = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(items.len());
        &items[start..end]
    }
}

/// Listing request as received on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    pub month: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl TransactionQuery {
    pub fn for_month(month: Option<&str>) -> Self {
        Self {
            month: month.map(str::to_string),
            ..Self::default()
        }
    }

    /// Translates the request into a store filter and a page window
    pub fn translate(&self, default_per_page: u64) -> Result<(SaleFilter, Page)> {
        let filter = SaleFilter::new(self.month.as_deref(), self.search.as_deref());
        let number = parse_count("page", self.page.as_deref(), DEFAULT_PAGE)?;
        let per_page = parse_count("per_page", self.per_page.as_deref(), default_per_page)?;
        Ok((filter, Page::new(number, per_page)?))
    }
}

fn parse_count(name: &str, raw: Option<&str>, default: u64) -> Result<u64> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse::<u64>().map_err(|_| {
            DashboardError::InvalidPage(format!(
                "{} must be a positive integer (got {:?})",
                name, value
            ))
        }),
    }
}
