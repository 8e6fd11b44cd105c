//! TTL cache in front of the pipeline.
//!
//! Two independently keyed views: the merged scan dataset, and per-security
//! one-year detail histories. Entries are created empty at startup,
//! populated lazily, expired by TTL and cleared wholesale by
//! `invalidate()`. Each view's mutex is held across recomputation, so at
//! most one computation per view is ever in flight; a concurrent
//! invalidation takes effect only after the in-flight run completes.

use crate::analyzer::enrich::history_points;
use crate::fetch::traits::{AnnouncementSource, QuoteSource};
use crate::model::{HistoryPoint, Lookback, MergedRecord};
use crate::pipeline::Pipeline;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Injectable time source so expiry is testable with a fake clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

struct Entry<T> {
    value: T,
    computed_at: DateTime<Utc>,
}

impl<T> Entry<T> {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.computed_at) < ttl
    }
}

pub struct ScanCache<A, Q, C = SystemClock> {
    pipeline: Pipeline<A, Q>,
    ttl: Duration,
    clock: C,
    dataset: Mutex<Option<Entry<Vec<MergedRecord>>>>,
    history: Mutex<HashMap<String, Entry<Vec<HistoryPoint>>>>,
}

impl<A: AnnouncementSource, Q: QuoteSource> ScanCache<A, Q, SystemClock> {
    pub fn new(pipeline: Pipeline<A, Q>, ttl: Duration) -> Self {
        Self::with_clock(pipeline, ttl, SystemClock)
    }
}

impl<A: AnnouncementSource, Q: QuoteSource, C: Clock> ScanCache<A, Q, C> {
    pub fn with_clock(pipeline: Pipeline<A, Q>, ttl: Duration, clock: C) -> Self {
        Self {
            pipeline,
            ttl,
            clock,
            dataset: Mutex::new(None),
            history: Mutex::new(HashMap::new()),
        }
    }

    /// The merged scan dataset, recomputed lazily once the entry expires.
    /// Anchored at the clock's current date.
    pub async fn dataset(&self) -> Vec<MergedRecord> {
        let mut slot = self.dataset.lock().await;
        let now = self.clock.now();

        if let Some(entry) = slot.as_ref() {
            if entry.is_fresh(now, self.ttl) {
                debug!("serving scan dataset from cache");
                return entry.value.clone();
            }
        }

        info!("scan dataset stale or missing, recomputing");
        let value = self.pipeline.run(now.date_naive()).await;
        *slot = Some(Entry {
            value: value.clone(),
            computed_at: now,
        });
        value
    }

    /// One-year detail series for a single security, keyed per id. A failed
    /// fetch returns empty and is not cached, so the next access retries.
    pub async fn history(&self, security_id: &str) -> Vec<HistoryPoint> {
        let mut map = self.history.lock().await;
        let now = self.clock.now();

        if let Some(entry) = map.get(security_id) {
            if entry.is_fresh(now, self.ttl) {
                debug!(security_id, "serving history from cache");
                return entry.value.clone();
            }
        }

        match self
            .pipeline
            .quotes()
            .history(security_id, Lookback::OneYear)
            .await
        {
            Ok(bars) => {
                let value = history_points(&bars);
                map.insert(
                    security_id.to_string(),
                    Entry {
                        value: value.clone(),
                        computed_at: now,
                    },
                );
                value
            }
            Err(e) => {
                warn!(security_id, error = %e, "history fetch failed");
                Vec::new()
            }
        }
    }

    /// Clears every cached entry. The next access recomputes synchronously.
    pub async fn invalidate(&self) {
        let mut slot = self.dataset.lock().await;
        let mut map = self.history.lock().await;
        *slot = None;
        map.clear();
        info!("cache invalidated");
    }
}
