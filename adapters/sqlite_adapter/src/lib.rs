use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use sales_core::domain::{NewSale, SaleId, SaleRecord};
use sales_core::ports::{DashboardError, RecordStore, Result};
use sales_core::query::{Page, SaleFilter};
use sales_core::utils::{date_text, fold_case, price_text};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sales (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        date_of_sale    TEXT NOT NULL,
        product         TEXT NOT NULL,
        price           REAL,
        description     TEXT NOT NULL,
        category        TEXT,
        date_key        TEXT NOT NULL,
        product_key     TEXT NOT NULL,
        description_key TEXT NOT NULL,
        price_key       TEXT
    )
"#;

/// SQLite implementation of the RecordStore trait
///
/// One connection is opened up front and shared by every request. Next to
/// each column the filter looks at, a case-folded search key is written at
/// insert time so matching in SQL follows the same rules as `SaleFilter::matches`.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (or creates) the database at the given path
    /// ":memory:" gives a private in-memory database
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(DashboardError::store)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DashboardError::store)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(DashboardError::store)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn map_row(row: &Row) -> rusqlite::Result<SaleRecord> {
        Ok(SaleRecord {
            id: row.get(0)?,
            date_of_sale: row.get(1)?,
            product: row.get(2)?,
            price: row.get(3)?,
            description: row.get(4)?,
            category: row.get(5)?,
        })
    }
}

/// WHERE clause and its positional parameters for a filter
fn where_clause(filter: &SaleFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(month) = filter.month() {
        values.push(month.to_string());
        conditions.push(format!("instr(date_key, ?{}) > 0", values.len()));
    }

    if let Some(search) = filter.search() {
        values.push(search.to_string());
        let n = values.len();
        conditions.push(format!(
            "(instr(product_key, ?{n}) > 0 OR instr(description_key, ?{n}) > 0 \
             OR instr(price_key, ?{n}) > 0)"
        ));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, sale: &NewSale) -> Result<SaleId> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                r#"
                INSERT INTO sales (
                    date_of_sale, product, price, description, category,
                    date_key, product_key, description_key, price_key
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .map_err(DashboardError::store)?;

        stmt.execute(params![
            sale.date_of_sale,
            sale.product,
            sale.price,
            sale.description,
            sale.category,
            fold_case(&date_text(&sale.date_of_sale)),
            fold_case(&sale.product),
            fold_case(&sale.description),
            sale.price.map(price_text),
        ])
        .map_err(DashboardError::store)?;

        Ok(conn.last_insert_rowid())
    }

    fn find(&self, filter: &SaleFilter, window: Option<Page>) -> Result<Vec<SaleRecord>> {
        let (clause, values) = where_clause(filter);
        let mut sql = format!(
            "SELECT id, date_of_sale, product, price, description, category \
             FROM sales {} ORDER BY id ASC",
            clause
        );
        let mut limits: Vec<i64> = Vec::new();
        if let Some(page) = window {
            // SQLite wants LIMIT before OFFSET
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", values.len() + 1, values.len() + 2));
            limits.push(i64::try_from(page.limit()).unwrap_or(i64::MAX));
            limits.push(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        }
        debug!(%sql, "querying sales");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(DashboardError::store)?;
        let sql_params: Vec<&dyn ToSql> = values
            .iter()
            .map(|v| v as &dyn ToSql)
            .chain(limits.iter().map(|b| b as &dyn ToSql))
            .collect();

        let records = stmt
            .query_map(sql_params.as_slice(), Self::map_row)
            .map_err(DashboardError::store)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            .map_err(DashboardError::store)?;

        Ok(records)
    }

    fn count(&self, filter: &SaleFilter) -> Result<u64> {
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM sales {}", clause);

        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .map_err(DashboardError::store)?;
        Ok(count as u64)
    }
}
