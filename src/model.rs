// Core structs: Announcement, DailyBar, Snapshot, MergedRecord
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// One ex-dividend/rights announcement row for one security on one date.
///
/// `fields` keeps every upstream column verbatim, keyed by the upstream
/// field name. Core code only ever reads `security_id` and
/// `announcement_date`; the rest is passthrough for display.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub security_id: String,
    /// The scanned calendar date this row was discovered under. Distinct
    /// from any record date embedded in the upstream fields.
    pub announcement_date: NaiveDate,
    pub fields: BTreeMap<String, String>,
}

/// One daily price bar, un-adjusted close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Latest market state for one security, derived from its daily series.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub security_id: String,
    pub last_close: f64,
    /// Arithmetic mean of the last 5 bars' volume, in raw shares.
    pub avg_volume_5d: f64,
    pub macd: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

/// Left join of an announcement and its price snapshot. Only produced when
/// the snapshot resolved; at most one per security in a pipeline result.
#[derive(Debug, Clone)]
pub struct MergedRecord {
    pub security_id: String,
    pub announcement_date: NaiveDate,
    pub last_close: f64,
    pub avg_volume_5d: f64,
    pub macd: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub fields: BTreeMap<String, String>,
}

/// One row of the single-security detail view: the bar plus the indicator
/// series values aligned to it.
#[derive(Debug, Clone)]
pub struct HistoryPoint {
    pub bar: DailyBar,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub sma_5: Option<f64>,
    pub sma_20: Option<f64>,
}

/// Operator-supplied thresholds for the candidate filter.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub price_min: f64,
    pub price_max: f64,
    /// Lower bound on 5-day average volume, in lots of 1000 shares.
    /// Multiplied by 1000 before comparison against `avg_volume_5d`.
    pub min_avg_volume_lots: f64,
}

/// Trailing window for the quote history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    /// Aggregate scan path.
    SixMonths,
    /// Detail-view path.
    OneYear,
}

impl Lookback {
    pub fn range_token(self) -> &'static str {
        match self {
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(String),
    #[error("unexpected status: {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Security identifiers are 4 or 6 digit numeric codes; anything else is
/// an index, warrant or preferred-share leg and is dropped before the merge.
pub fn is_valid_security_id(id: &str) -> bool {
    matches!(id.len(), 4 | 6) && id.bytes().all(|b| b.is_ascii_digit())
}
