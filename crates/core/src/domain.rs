use serde::{Deserialize, Serialize};

/// Store-assigned record identifier
pub type SaleId = i64;

/// A stored sale entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: SaleId,
    pub date_of_sale: String,
    pub product: String,
    pub price: Option<f64>,
    pub description: String,
    pub category: Option<String>,
}

/// A sale as it arrives from the feed, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewSale {
    pub date_of_sale: String,
    pub product: String,
    pub price: Option<f64>,
    pub description: String,
    pub category: Option<String>,
}

impl NewSale {
    pub fn with_id(self, id: SaleId) -> SaleRecord {
        SaleRecord {
            id,
            date_of_sale: self.date_of_sale,
            product: self.product,
            price: self.price,
            description: self.description,
            category: self.category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_sale_amount: f64,
    pub total_sold_items: u64,
    pub total_not_sold_items: u64,
}

/// One bar of the price histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBucket {
    pub range: String,
    pub count: u64,
}

/// One slice of the category pie; `None` groups records without a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    #[serde(rename = "_id")]
    pub category: Option<String>,
    pub count: u64,
}

/// One page of the filtered listing plus the total number of matches
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPage {
    pub records: Vec<SaleRecord>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedData {
    pub transactions: Vec<SaleRecord>,
    pub statistics: Statistics,
    pub bar_chart: Vec<PriceBucket>,
    pub pie_chart: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub fetched: usize,
    pub inserted: usize,
}
