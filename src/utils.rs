// Utility functions
use chrono::NaiveDate;

/// Formats a date the way the announcement source expects it: `YYYYMMDD`.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
