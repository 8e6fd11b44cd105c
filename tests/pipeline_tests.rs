//! End-to-end pipeline and cache tests against scripted sources.

use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use exdiv_radar::cache::{Clock, ScanCache};
use exdiv_radar::fetch::traits::{AnnouncementSource, QuoteSource};
use exdiv_radar::model::{Announcement, DailyBar, FetchError, Lookback};
use exdiv_radar::pipeline::Pipeline;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct ScriptedAnnouncements {
    days: HashMap<NaiveDate, Vec<Announcement>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAnnouncements {
    fn new(days: HashMap<NaiveDate, Vec<Announcement>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                days,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl AnnouncementSource for ScriptedAnnouncements {
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<Announcement>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }
}

/// Securities without a scripted series fail with a transport error.
struct ScriptedQuotes {
    series: HashMap<String, Vec<DailyBar>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedQuotes {
    fn new(series: HashMap<String, Vec<DailyBar>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                series,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuotes {
    async fn history(
        &self,
        security_id: &str,
        _lookback: Lookback,
    ) -> Result<Vec<DailyBar>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.series
            .get(security_id)
            .cloned()
            .ok_or_else(|| FetchError::Http("scripted transport failure".to_string()))
    }
}

struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, day).expect("valid date")
}

fn announcement(id: &str, day: u32) -> Announcement {
    Announcement {
        security_id: id.to_string(),
        announcement_date: date(day),
        fields: BTreeMap::new(),
    }
}

/// A series of `n` bars ending at `last_close`, constant volume.
fn bars(n: usize, last_close: f64, volume: f64) -> Vec<DailyBar> {
    let start = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
    (0..n)
        .map(|i| {
            let close = last_close - (n - 1 - i) as f64 * 0.5;
            DailyBar {
                date: start + Days::new(i as u64),
                open: close - 0.2,
                high: close + 0.8,
                low: close - 0.8,
                close,
                volume,
            }
        })
        .collect()
}

/// The canonical scan scenario: a 3-day window where day 1 announces 1101
/// and 1102, day 2 re-announces 1102, day 3 is quiet, and 1102's quote
/// fetch fails.
fn scenario() -> (
    HashMap<NaiveDate, Vec<Announcement>>,
    HashMap<String, Vec<DailyBar>>,
) {
    let days = HashMap::from([
        (date(1), vec![announcement("1101", 1), announcement("1102", 1)]),
        (date(2), vec![announcement("1102", 2)]),
    ]);
    let series = HashMap::from([("1101".to_string(), bars(30, 55.0, 150_000.0))]);
    (days, series)
}

#[tokio::test]
async fn test_end_to_end_scan() {
    let (days, series) = scenario();
    let (announcements, _) = ScriptedAnnouncements::new(days);
    let (quotes, _) = ScriptedQuotes::new(series);

    let pipeline = Pipeline::new(announcements, quotes, 3);
    let out = pipeline.run(date(1)).await;

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].security_id, "1101");
    assert_eq!(out[0].announcement_date, date(1));
    assert_eq!(out[0].last_close, 55.0);
    assert_eq!(out[0].avg_volume_5d, 150_000.0);
}

#[tokio::test]
async fn test_duplicate_announcements_keep_earliest_date() {
    let days = HashMap::from([
        (date(1), vec![announcement("1101", 1)]),
        (date(3), vec![announcement("1101", 3)]),
    ]);
    let series = HashMap::from([("1101".to_string(), bars(30, 55.0, 150_000.0))]);
    let (announcements, _) = ScriptedAnnouncements::new(days);
    let (quotes, _) = ScriptedQuotes::new(series);

    let out = Pipeline::new(announcements, quotes, 5).run(date(1)).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].announcement_date, date(1));
}

#[tokio::test]
async fn test_empty_window_is_a_normal_empty_result() {
    let (announcements, _) = ScriptedAnnouncements::new(HashMap::new());
    let (quotes, quote_calls) = ScriptedQuotes::new(HashMap::new());

    let out = Pipeline::new(announcements, quotes, 3).run(date(1)).await;
    assert!(out.is_empty());
    // No securities implies no enrichment calls at all.
    assert_eq!(quote_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_history_length_boundary() {
    for (n, expected) in [(25usize, 0usize), (26, 1)] {
        let days = HashMap::from([(date(1), vec![announcement("1101", 1)])]);
        let series = HashMap::from([("1101".to_string(), bars(n, 55.0, 150_000.0))]);
        let (announcements, _) = ScriptedAnnouncements::new(days);
        let (quotes, _) = ScriptedQuotes::new(series);

        let out = Pipeline::new(announcements, quotes, 1).run(date(1)).await;
        assert_eq!(out.len(), expected, "series of {n} bars");
    }
}

#[tokio::test]
async fn test_each_distinct_security_enriched_once() {
    let days = HashMap::from([
        (date(1), vec![announcement("1101", 1), announcement("1102", 1)]),
        (date(2), vec![announcement("1101", 2)]),
    ]);
    let series = HashMap::from([
        ("1101".to_string(), bars(30, 55.0, 150_000.0)),
        ("1102".to_string(), bars(30, 20.0, 90_000.0)),
    ]);
    let (announcements, _) = ScriptedAnnouncements::new(days);
    let (quotes, quote_calls) = ScriptedQuotes::new(series);

    let out = Pipeline::new(announcements, quotes, 2).run(date(1)).await;
    assert_eq!(out.len(), 2);
    assert_eq!(quote_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_dataset_memoized_within_ttl() {
    let (days, series) = scenario();
    let (announcements, day_calls) = ScriptedAnnouncements::new(days);
    let (quotes, _) = ScriptedQuotes::new(series);
    let clock = ManualClock::new(date(1).and_hms_opt(8, 0, 0).expect("valid time").and_utc());

    let cache = ScanCache::with_clock(
        Pipeline::new(announcements, quotes, 3),
        Duration::hours(24),
        clock.clone(),
    );

    let first = cache.dataset().await;
    clock.advance(Duration::hours(23));
    let second = cache.dataset().await;

    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].security_id, second[0].security_id);
    // One pipeline run: exactly window_days announcement fetches.
    assert_eq!(day_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_dataset_recomputed_after_ttl_expiry() {
    let (days, series) = scenario();
    let (announcements, day_calls) = ScriptedAnnouncements::new(days);
    let (quotes, _) = ScriptedQuotes::new(series);
    let clock = ManualClock::new(date(1).and_hms_opt(8, 0, 0).expect("valid time").and_utc());

    let cache = ScanCache::with_clock(
        Pipeline::new(announcements, quotes, 3),
        Duration::hours(24),
        clock.clone(),
    );

    cache.dataset().await;
    clock.advance(Duration::hours(25));
    cache.dataset().await;

    assert_eq!(day_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_invalidate_forces_recompute() {
    let (days, series) = scenario();
    let (announcements, day_calls) = ScriptedAnnouncements::new(days);
    let (quotes, _) = ScriptedQuotes::new(series);
    let clock = ManualClock::new(date(1).and_hms_opt(8, 0, 0).expect("valid time").and_utc());

    let cache = ScanCache::with_clock(
        Pipeline::new(announcements, quotes, 3),
        Duration::hours(24),
        clock.clone(),
    );

    cache.dataset().await;
    cache.invalidate().await;
    cache.dataset().await;

    assert_eq!(day_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_history_cached_per_security() {
    let series = HashMap::from([
        ("1101".to_string(), bars(40, 55.0, 150_000.0)),
        ("2330".to_string(), bars(40, 120.0, 800_000.0)),
    ]);
    let (announcements, _) = ScriptedAnnouncements::new(HashMap::new());
    let (quotes, quote_calls) = ScriptedQuotes::new(series);
    let clock = ManualClock::new(date(1).and_hms_opt(8, 0, 0).expect("valid time").and_utc());

    let cache = ScanCache::with_clock(
        Pipeline::new(announcements, quotes, 3),
        Duration::hours(24),
        clock.clone(),
    );

    let a = cache.history("1101").await;
    let b = cache.history("1101").await;
    assert_eq!(a.len(), 40);
    assert_eq!(a.len(), b.len());
    assert_eq!(quote_calls.load(Ordering::SeqCst), 1);

    let c = cache.history("2330").await;
    assert_eq!(c.len(), 40);
    assert_eq!(quote_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_history_not_cached() {
    let (announcements, _) = ScriptedAnnouncements::new(HashMap::new());
    let (quotes, quote_calls) = ScriptedQuotes::new(HashMap::new());
    let clock = ManualClock::new(date(1).and_hms_opt(8, 0, 0).expect("valid time").and_utc());

    let cache = ScanCache::with_clock(
        Pipeline::new(announcements, quotes, 3),
        Duration::hours(24),
        clock.clone(),
    );

    assert!(cache.history("9999").await.is_empty());
    assert!(cache.history("9999").await.is_empty());
    // The failure is retried, not served from cache.
    assert_eq!(quote_calls.load(Ordering::SeqCst), 2);
}
