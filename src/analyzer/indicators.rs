//! Indicator series over daily closes.
//!
//! Every function returns a vector aligned index-for-index with its input;
//! positions where the indicator is not yet defined hold `None`. EMAs are
//! seeded with the SMA of the first `period` values.

/// Simple moving average.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Exponential moving average, SMA-seeded.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let mult = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);
    for i in period..values.len() {
        current = (values[i] - current) * mult + current;
        out[i] = Some(current);
    }
    out
}

#[derive(Debug)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

/// MACD line = EMA(fast) - EMA(slow); signal = EMA of the line.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let fast_ema = ema(close, fast);
    let slow_ema = ema(close, slow);

    let mut line = vec![None; close.len()];
    for i in 0..close.len() {
        if let (Some(f), Some(s)) = (fast_ema[i], slow_ema[i]) {
            line[i] = Some(f - s);
        }
    }

    let signal = ema_tail(&line, signal_period);
    MacdSeries { line, signal }
}

#[derive(Debug)]
pub struct StochSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

/// Stochastic oscillator: raw %K over `k_period` highs/lows, smoothed by an
/// SMA of length `smooth_k`, with a `d_period` SMA signal line.
pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    smooth_k: usize,
    d_period: usize,
) -> StochSeries {
    let n = close.len();
    let mut raw = vec![None; n];
    if k_period == 0 || n < k_period {
        return StochSeries { k: raw.clone(), d: raw };
    }

    for i in (k_period - 1)..n {
        let window = i + 1 - k_period..=i;
        let hh = high[window.clone()].iter().copied().fold(f64::MIN, f64::max);
        let ll = low[window].iter().copied().fold(f64::MAX, f64::min);
        // Flat range: price sat exactly mid-band, report neutral.
        raw[i] = if hh == ll {
            Some(50.0)
        } else {
            Some((close[i] - ll) / (hh - ll) * 100.0)
        };
    }

    let k = sma_tail(&raw, smooth_k);
    let d = sma_tail(&k, d_period);
    StochSeries { k, d }
}

/// Applies an SMA to the defined tail of a partially-defined series and
/// re-aligns the result to the original indices.
fn sma_tail(series: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    smooth_tail(series, period, sma)
}

fn ema_tail(series: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    smooth_tail(series, period, ema)
}

fn smooth_tail(
    series: &[Option<f64>],
    period: usize,
    smooth: fn(&[f64], usize) -> Vec<Option<f64>>,
) -> Vec<Option<f64>> {
    let mut out = vec![None; series.len()];
    let Some(start) = series.iter().position(Option::is_some) else {
        return out;
    };
    let defined: Vec<f64> = series[start..].iter().flatten().copied().collect();
    for (j, v) in smooth(&defined, period).into_iter().enumerate() {
        out[start + j] = v;
    }
    out
}
