use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Builds the searchable textual form of a sale date
/// The raw value is kept and the English month name is appended when the
/// value parses, so "2022-03-01" becomes "2022-03-01 March"
pub fn date_text(raw: &str) -> String {
    match month_name(raw) {
        Some(month) => format!("{} {}", raw, month),
        None => raw.to_string(),
    }
}

/// Extracts the full English month name from a date string
/// Supports formats: RFC 3339, ISO 8601 without timezone, SQLite datetime, date only
pub fn month_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Keep the offset as written; converting to UTC could move the month
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format("%B").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.format("%B").to_string());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.format("%B").to_string());
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive_dt.format("%B").to_string());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%B").to_string());
    }

    // Anything else dateparser understands, e.g. "Mar 1, 2022"
    // Zone-less input is read as UTC midnight so the host timezone never shifts the month
    dateparser::parse_with(raw, &Utc, NaiveTime::MIN)
        .ok()
        .map(|dt| dt.format("%B").to_string())
}

/// Textual form of a price: shortest decimal that round-trips ("50", "44.6")
pub fn price_text(price: f64) -> String {
    price.to_string()
}

/// Lowercased key used for case-insensitive substring matching
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive substring test; an empty needle matches everything
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    fold_case(haystack).contains(&fold_case(needle))
}
