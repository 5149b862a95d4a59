use crate::domain::{CategoryCount, PriceBucket, SaleRecord, Statistics};
use std::collections::BTreeMap;

pub const DEFAULT_BUCKET_WIDTH: u64 = 100;
pub const DEFAULT_BUCKET_CEILING: u64 = 300;
/// Upper bound on bars per chart
pub const MAX_BUCKETS: u64 = 1000;

/// Sums prices and counts sold/not-sold records among month matches
///
/// `total_sold_items` counts every matching record, priced or not.
pub fn statistics(records: &[SaleRecord]) -> Statistics {
    let mut stats = Statistics::default();
    for record in records {
        stats.total_sold_items += 1;
        match record.price {
            Some(price) => stats.total_sale_amount += price,
            None => stats.total_not_sold_items += 1,
        }
    }
    stats
}

/// Fixed-width price buckets from 0 up to a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketLayout {
    width: u64,
    ceiling: u64,
}

impl Default for BucketLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_BUCKET_WIDTH,
            ceiling: DEFAULT_BUCKET_CEILING,
        }
    }
}

impl BucketLayout {
    /// Returns None when the width is zero, the ceiling is below one bucket
    /// or the layout would need more than MAX_BUCKETS bars
    pub fn new(width: u64, ceiling: u64) -> Option<Self> {
        if width == 0 || ceiling < width || ceiling / width > MAX_BUCKETS {
            return None;
        }
        Some(Self { width, ceiling })
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    fn bucket_count(&self) -> usize {
        (self.ceiling / self.width) as usize
    }

    /// Label for bucket `index`: "0-100", "101-200", ...
    fn label(&self, index: usize) -> String {
        let high = (index as u64 + 1) * self.width;
        let low = if index == 0 { 0 } else { index as u64 * self.width + 1 };
        format!("{}-{}", low, high)
    }

    /// Bucket a price falls into, if any
    ///
    /// Bucket k covers (k*width, (k+1)*width], with 0 itself in the first
    /// bucket. Integer prices land exactly in their labelled range.
    pub fn bucket_of(&self, price: f64) -> Option<usize> {
        if !price.is_finite() || price < 0.0 {
            return None;
        }
        let width = self.width as f64;
        let index = if price <= width {
            0
        } else {
            ((price / width).ceil() as usize).saturating_sub(1)
        };
        (index < self.bucket_count()).then_some(index)
    }

    /// Counts records per bucket in ascending bucket order
    pub fn partition(&self, records: &[SaleRecord]) -> Vec<PriceBucket> {
        let mut counts = vec![0u64; self.bucket_count()];
        for price in records.iter().filter_map(|r| r.price) {
            if let Some(index) = self.bucket_of(price) {
                counts[index] += 1;
            }
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(index, count)| PriceBucket {
                range: self.label(index),
                count,
            })
            .collect()
    }
}

/// Groups records by category; records without one share the `None` group
/// Output is ordered by category with `None` first
pub fn category_counts(records: &[SaleRecord]) -> Vec<CategoryCount> {
    let mut grouped: BTreeMap<Option<&str>, u64> = BTreeMap::new();
    for record in records {
        *grouped.entry(record.category.as_deref()).or_insert(0) += 1;
    }

    grouped
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.map(str::to_string),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(price: Option<f64>, category: Option<&str>) -> SaleRecord {
        SaleRecord {
            id: 0,
            date_of_sale: "2022-03-01".to_string(),
            product: String::new(),
            price,
            description: String::new(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_statistics_empty_is_zero() {
        assert_eq!(statistics(&[]), Statistics::default());
    }

    #[test]
    fn test_statistics_counts_all_matches_as_sold() {
        let stats = statistics(&[sale(Some(50.0), None), sale(None, None)]);
        assert_eq!(stats.total_sale_amount, 50.0);
        assert_eq!(stats.total_sold_items, 2);
        assert_eq!(stats.total_not_sold_items, 1);
        assert!(stats.total_not_sold_items <= stats.total_sold_items);
    }

    #[test]
    fn test_default_layout_labels() {
        let buckets = BucketLayout::default().partition(&[]);
        let labels: Vec<_> = buckets.iter().map(|b| b.range.as_str()).collect();
        assert_eq!(labels, ["0-100", "101-200", "201-300"]);
        assert!(buckets.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_bucket_boundaries_are_inclusive() {
        let layout = BucketLayout::default();
        assert_eq!(layout.bucket_of(0.0), Some(0));
        assert_eq!(layout.bucket_of(100.0), Some(0));
        assert_eq!(layout.bucket_of(101.0), Some(1));
        assert_eq!(layout.bucket_of(200.0), Some(1));
        assert_eq!(layout.bucket_of(201.0), Some(2));
        assert_eq!(layout.bucket_of(300.0), Some(2));
    }

    #[test]
    fn test_fractional_price_between_labels_lands_in_next_bucket() {
        let layout = BucketLayout::default();
        assert_eq!(layout.bucket_of(100.5), Some(1));
        assert_eq!(layout.bucket_of(0.01), Some(0));
    }

    #[test]
    fn test_prices_outside_layout_are_excluded() {
        let layout = BucketLayout::default();
        assert_eq!(layout.bucket_of(-1.0), None);
        assert_eq!(layout.bucket_of(300.01), None);
        assert_eq!(layout.bucket_of(f64::NAN), None);

        let buckets = layout.partition(&[
            sale(Some(-5.0), None),
            sale(Some(999.0), None),
            sale(None, None),
            sale(Some(150.0), None),
        ]);
        let total: u64 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 1);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_custom_layout() {
        let layout = BucketLayout::new(250, 1000).unwrap();
        let labels: Vec<_> = layout.partition(&[]).into_iter().map(|b| b.range).collect();
        assert_eq!(labels, ["0-250", "251-500", "501-750", "751-1000"]);
    }

    #[test]
    fn test_invalid_layout() {
        assert!(BucketLayout::new(0, 300).is_none());
        assert!(BucketLayout::new(100, 50).is_none());
        assert!(BucketLayout::new(1, 1_000_000_000_000_000_000).is_none());
        assert!(BucketLayout::new(1, MAX_BUCKETS + 1).is_none());
        assert_eq!(BucketLayout::new(1, MAX_BUCKETS).unwrap().partition(&[]).len(), 1000);
    }

    #[test]
    fn test_category_counts_groups_missing_under_none() {
        let counts = category_counts(&[
            sale(None, Some("electronics")),
            sale(None, None),
            sale(None, Some("jewelery")),
            sale(None, Some("electronics")),
        ]);
        assert_eq!(
            counts,
            vec![
                CategoryCount { category: None, count: 1 },
                CategoryCount { category: Some("electronics".to_string()), count: 2 },
                CategoryCount { category: Some("jewelery".to_string()), count: 1 },
            ]
        );
    }

    #[test]
    fn test_category_counts_serializes_id_key() {
        let json = serde_json::to_value(CategoryCount { category: None, count: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({ "_id": null, "count": 3 }));
    }
}
