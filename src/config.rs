use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_price_min")]
    pub price_min: f64,
    #[serde(default = "default_price_max")]
    pub price_max: f64,
    /// In lots of 1000 shares.
    #[serde(default = "default_min_avg_volume_lots")]
    pub min_avg_volume_lots: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Forward scan window in calendar days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Pause after each announcement-source request.
    #[serde(default = "default_announcement_delay_ms")]
    pub announcement_delay_ms: u64,
    /// Pause after each quote-source request.
    #[serde(default = "default_quote_delay_ms")]
    pub quote_delay_ms: u64,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: i64,
    /// Appended to the security id when querying the quote source.
    #[serde(default = "default_market_suffix")]
    pub market_suffix: String,
    #[serde(default)]
    pub filter: FilterConfig,
}

fn default_price_min() -> f64 {
    10.0
}

fn default_price_max() -> f64 {
    200.0
}

fn default_min_avg_volume_lots() -> f64 {
    100.0
}

fn default_window_days() -> u32 {
    90
}

fn default_announcement_delay_ms() -> u64 {
    300
}

fn default_quote_delay_ms() -> u64 {
    200
}

fn default_cache_ttl_hours() -> i64 {
    24
}

fn default_market_suffix() -> String {
    ".TW".to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            price_min: default_price_min(),
            price_max: default_price_max(),
            min_avg_volume_lots: default_min_avg_volume_lots(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            announcement_delay_ms: default_announcement_delay_ms(),
            quote_delay_ms: default_quote_delay_ms(),
            cache_ttl_hours: default_cache_ttl_hours(),
            market_suffix: default_market_suffix(),
            filter: FilterConfig::default(),
        }
    }
}

/// Loads the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
