//! TWSE ex-dividend/rights announcement client.
//!
//! The exchange publishes upcoming ex-dividend dates through the TWT49U
//! exchange report, queried one calendar day at a time (strDate == endDate).
//! The payload carries a `fields` list and a `data` row set positionally
//! aligned to it; rows are reshaped into name-keyed maps here so nothing
//! downstream ever touches a positional index.

use crate::fetch::gate::RequestGate;
use crate::fetch::traits::AnnouncementSource;
use crate::model::{is_valid_security_id, Announcement, FetchError};
use crate::utils::compact_date;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.twse.com.tw/exchangeReport/TWT49U";

/// Upstream field name carrying the security code.
const SECURITY_ID_FIELD: &str = "股票代號";

#[derive(Debug, Deserialize)]
struct DayPayload {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    data: Option<Vec<Vec<serde_json::Value>>>,
}

pub struct TwseClient {
    client: Client,
    base_url: String,
    gate: RequestGate,
}

impl TwseClient {
    pub fn new(gate: RequestGate) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, gate)
    }

    pub fn with_base_url(base_url: impl Into<String>, gate: RequestGate) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
            )
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            gate,
        }
    }

    async fn query(&self, date: NaiveDate) -> Result<Vec<Announcement>, FetchError> {
        let day = compact_date(date);
        let url = format!(
            "{}?response=json&strDate={}&endDate={}",
            self.base_url, day, day
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

        let payload: DayPayload = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        Ok(rows_from_payload(&payload, date))
    }
}

/// Reshapes the positional row set into name-keyed announcements, dropping
/// rows whose security id fails the shape invariant.
fn rows_from_payload(payload: &DayPayload, date: NaiveDate) -> Vec<Announcement> {
    let Some(rows) = payload.data.as_ref() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in rows {
        let fields: BTreeMap<String, String> = payload
            .fields
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), cell_to_string(value)))
            .collect();

        let Some(security_id) = fields.get(SECURITY_ID_FIELD).cloned() else {
            continue;
        };
        if !is_valid_security_id(&security_id) {
            continue;
        }

        out.push(Announcement {
            security_id,
            announcement_date: date,
            fields,
        });
    }
    out
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl AnnouncementSource for TwseClient {
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<Announcement>, FetchError> {
        let result = self.query(date).await;
        // Spacing applies even to failed requests.
        self.gate.pause().await;
        result
    }
}
