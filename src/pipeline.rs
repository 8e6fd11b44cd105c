//! Acquisition-enrichment-merge pipeline.
//!
//! Polls the announcement source across a forward window, enriches every
//! distinct security with a price snapshot, then joins, orders and
//! deduplicates. Nothing in here is fatal: a failed day or security is
//! logged and the result degrades to a partial or empty dataset.

use crate::analyzer::enrich::snapshot_from_bars;
use crate::fetch::traits::{AnnouncementSource, QuoteSource};
use crate::model::{Announcement, Lookback, MergedRecord, Snapshot};
use chrono::{Days, NaiveDate};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub struct Pipeline<A, Q> {
    announcements: A,
    quotes: Q,
    window_days: u32,
}

impl<A: AnnouncementSource, Q: QuoteSource> Pipeline<A, Q> {
    pub fn new(announcements: A, quotes: Q, window_days: u32) -> Self {
        Self {
            announcements,
            quotes,
            window_days,
        }
    }

    /// The quote source, for the single-security detail path.
    pub fn quotes(&self) -> &Q {
        &self.quotes
    }

    /// Runs the full scan anchored at `as_of` (inclusive).
    pub async fn run(&self, as_of: NaiveDate) -> Vec<MergedRecord> {
        let rows = self.collect_announcements(as_of).await;
        if rows.is_empty() {
            info!(window_days = self.window_days, "no announcements in window");
            return Vec::new();
        }
        info!(rows = rows.len(), "collected announcement rows");

        let snapshots = self.enrich(&rows).await;
        info!(securities = snapshots.len(), "enriched securities");

        merge(rows, &snapshots)
    }

    async fn collect_announcements(&self, as_of: NaiveDate) -> Vec<Announcement> {
        let mut rows = Vec::new();
        for offset in 0..self.window_days {
            let date = as_of + Days::new(u64::from(offset));
            match self.announcements.fetch_day(date).await {
                Ok(day_rows) => {
                    debug!(%date, rows = day_rows.len(), "scanned announcement date");
                    rows.extend(day_rows);
                }
                Err(e) => {
                    warn!(%date, error = %e, "announcement fetch failed, treating day as empty");
                }
            }
        }
        rows
    }

    async fn enrich(&self, rows: &[Announcement]) -> HashMap<String, Snapshot> {
        let mut snapshots = HashMap::new();
        for id in distinct_ids(rows) {
            match self.quotes.history(&id, Lookback::SixMonths).await {
                Ok(bars) => match snapshot_from_bars(&id, &bars) {
                    Some(snap) => {
                        snapshots.insert(id, snap);
                    }
                    None => {
                        debug!(security_id = %id, bars = bars.len(), "insufficient history, skipping");
                    }
                },
                Err(e) => {
                    warn!(security_id = %id, error = %e, "quote fetch failed, skipping security");
                }
            }
        }
        snapshots
    }
}

/// Distinct security ids in first-appearance order.
fn distinct_ids(rows: &[Announcement]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|a| seen.insert(a.security_id.clone()))
        .map(|a| a.security_id.clone())
        .collect()
}

/// Left-joins announcements to snapshots, dropping unmatched rows, then
/// sorts ascending by announcement date and keeps the first occurrence per
/// security. The sort is stable, so the earliest announcement wins.
fn merge(mut rows: Vec<Announcement>, snapshots: &HashMap<String, Snapshot>) -> Vec<MergedRecord> {
    rows.sort_by_key(|a| a.announcement_date);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        let Some(snap) = snapshots.get(&row.security_id) else {
            continue;
        };
        if !seen.insert(row.security_id.clone()) {
            continue;
        }
        out.push(MergedRecord {
            security_id: row.security_id,
            announcement_date: row.announcement_date,
            last_close: snap.last_close,
            avg_volume_5d: snap.avg_volume_5d,
            macd: snap.macd,
            stoch_k: snap.stoch_k,
            stoch_d: snap.stoch_d,
            fields: row.fields,
        });
    }
    out
}
