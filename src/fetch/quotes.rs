//! Yahoo Finance chart client for daily price bars.
//!
//! Requests un-adjusted quotes (the `quote` block, not `adjclose`) so the
//! indicator inputs match what the exchange actually printed. Bars with a
//! null in any OHLCV slot (trading halts) are skipped.

use crate::fetch::gate::RequestGate;
use crate::fetch::traits::QuoteSource;
use crate::model::{DailyBar, FetchError, Lookback};
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooChartClient {
    client: Client,
    base_url: String,
    /// Appended to the security id, e.g. ".TW".
    market_suffix: String,
    gate: RequestGate,
}

impl YahooChartClient {
    pub fn new(market_suffix: impl Into<String>, gate: RequestGate) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, market_suffix, gate)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        market_suffix: impl Into<String>,
        gate: RequestGate,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) ExdivRadar/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            market_suffix: market_suffix.into(),
            gate,
        }
    }

    async fn query(
        &self,
        security_id: &str,
        lookback: Lookback,
    ) -> Result<Vec<DailyBar>, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}{}?range={}&interval=1d&includeAdjustedClose=false",
            self.base_url,
            security_id,
            self.market_suffix,
            lookback.range_token()
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let payload: ChartResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        bars_from_chart(&payload)
    }
}

fn bars_from_chart(payload: &ChartResponse) -> Result<Vec<DailyBar>, FetchError> {
    let result = payload
        .chart
        .result
        .as_ref()
        .and_then(|r| r.first())
        .ok_or_else(|| FetchError::Malformed("empty chart result".into()))?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| FetchError::Malformed("missing quote block".into()))?;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let ohlcv = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = ohlcv else {
            continue;
        };
        let Some(dt) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };
        bars.push(DailyBar {
            date: dt.date_naive(),
            open,
            high,
            low,
            close,
            volume,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[async_trait::async_trait]
impl QuoteSource for YahooChartClient {
    async fn history(
        &self,
        security_id: &str,
        lookback: Lookback,
    ) -> Result<Vec<DailyBar>, FetchError> {
        let result = self.query(security_id, lookback).await;
        self.gate.pause().await;
        result
    }
}
