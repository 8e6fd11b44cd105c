//! Derives per-security views from a raw daily series: the single-row
//! snapshot used by the aggregate scan, and the full aligned indicator
//! series used by the detail view.

use crate::analyzer::indicators::{macd, sma, stochastic};
use crate::model::{DailyBar, HistoryPoint, Snapshot};

/// Shortest series the trend oscillator is defined on. Anything shorter
/// yields no snapshot and the security is excluded from the scan.
pub const MIN_BARS_FOR_SNAPSHOT: usize = 26;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

const STOCH_K: usize = 9;
const STOCH_SMOOTH_K: usize = 3;
const STOCH_D: usize = 3;

const AVG_VOLUME_WINDOW: usize = 5;

const SMA_SHORT: usize = 5;
const SMA_LONG: usize = 20;

/// Latest-bar snapshot, or `None` when the series is too short.
pub fn snapshot_from_bars(security_id: &str, bars: &[DailyBar]) -> Option<Snapshot> {
    if bars.len() < MIN_BARS_FOR_SNAPSHOT {
        return None;
    }

    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let trend = macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let stoch = stochastic(&high, &low, &close, STOCH_K, STOCH_SMOOTH_K, STOCH_D);

    let last = bars.len() - 1;
    Some(Snapshot {
        security_id: security_id.to_string(),
        last_close: bars[last].close,
        avg_volume_5d: avg_volume(bars, AVG_VOLUME_WINDOW),
        macd: trend.line[last],
        stoch_k: stoch.k[last],
        stoch_d: stoch.d[last],
    })
}

/// Full indicator series for the detail view, one point per input bar.
pub fn history_points(bars: &[DailyBar]) -> Vec<HistoryPoint> {
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let trend = macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let stoch = stochastic(&high, &low, &close, STOCH_K, STOCH_SMOOTH_K, STOCH_D);
    let sma_short = sma(&close, SMA_SHORT);
    let sma_long = sma(&close, SMA_LONG);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| HistoryPoint {
            bar: *bar,
            macd: trend.line[i],
            macd_signal: trend.signal[i],
            stoch_k: stoch.k[i],
            stoch_d: stoch.d[i],
            sma_5: sma_short[i],
            sma_20: sma_long[i],
        })
        .collect()
}

fn avg_volume(bars: &[DailyBar], window: usize) -> f64 {
    let tail = &bars[bars.len().saturating_sub(window)..];
    tail.iter().map(|b| b.volume).sum::<f64>() / tail.len() as f64
}
