use crate::aggregate::{self, BucketLayout};
use crate::domain::{
    CategoryCount, CombinedData, ImportSummary, PriceBucket, Statistics, TransactionPage,
};
use crate::ports::{RecordStore, Result, SaleFeed};
use crate::query::{SaleFilter, TransactionQuery, DEFAULT_PER_PAGE};
use std::thread;
use tracing::{debug, info};

/// Application service behind every dashboard endpoint
pub struct DashboardService {
    store: Box<dyn RecordStore>,
    feed: Box<dyn SaleFeed>,
    buckets: BucketLayout,
    default_per_page: u64,
}

impl DashboardService {
    /// Creates a new DashboardService with the given dependencies
    pub fn new(store: Box<dyn RecordStore>, feed: Box<dyn SaleFeed>) -> Self {
        Self {
            store,
            feed,
            buckets: BucketLayout::default(),
            default_per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_bucket_layout(mut self, buckets: BucketLayout) -> Self {
        self.buckets = buckets;
        self
    }

    pub fn with_default_per_page(mut self, per_page: u64) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    /// Fetches the feed and inserts every sale as a new record
    ///
    /// Not idempotent: running it twice stores every sale twice. Records
    /// inserted before a failure stay in the store.
    pub fn initialize_database(&self) -> Result<ImportSummary> {
        let sales = self.feed.fetch()?;
        info!(count = sales.len(), "fetched sales from feed");

        let mut inserted = 0;
        for sale in &sales {
            self.store.insert(sale)?;
            inserted += 1;
        }

        info!(inserted, "bulk import finished");
        Ok(ImportSummary {
            fetched: sales.len(),
            inserted,
        })
    }

    /// Filtered, paginated listing plus the total number of matches
    pub fn list_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        let (filter, page) = query.translate(self.default_per_page)?;
        debug!(?filter, offset = page.offset(), limit = page.limit(), "listing transactions");

        let records = self.store.find(&filter, Some(page))?;
        let total = self.store.count(&filter)?;
        Ok(TransactionPage { records, total })
    }

    pub fn statistics(&self, month: Option<&str>) -> Result<Statistics> {
        let records = self.store.find(&SaleFilter::by_month(month), None)?;
        Ok(aggregate::statistics(&records))
    }

    pub fn bar_chart(&self, month: Option<&str>) -> Result<Vec<PriceBucket>> {
        let records = self.store.find(&SaleFilter::by_month(month), None)?;
        Ok(self.buckets.partition(&records))
    }

    pub fn pie_chart(&self, month: Option<&str>) -> Result<Vec<CategoryCount>> {
        let records = self.store.find(&SaleFilter::by_month(month), None)?;
        Ok(aggregate::category_counts(&records))
    }

    /// Runs the listing and the three aggregations concurrently and merges them
    /// Any failing part fails the whole call
    pub fn combined_data(&self, month: Option<&str>) -> Result<CombinedData> {
        let listing = TransactionQuery::for_month(month);

        thread::scope(|scope| -> Result<CombinedData> {
            let transactions = scope.spawn(|| self.list_transactions(&listing));
            let statistics = scope.spawn(|| self.statistics(month));
            let bar_chart = scope.spawn(|| self.bar_chart(month));
            let pie_chart = scope.spawn(|| self.pie_chart(month));

            Ok(CombinedData {
                transactions: join(transactions)?.records,
                statistics: join(statistics)?,
                bar_chart: join(bar_chart)?,
                pie_chart: join(pie_chart)?,
            })
        })
    }

    /// Total number of stored records
    pub fn record_count(&self) -> Result<u64> {
        self.store.count(&SaleFilter::all())
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}
