use chrono::Duration;
use exdiv_radar::analyzer::filter::find_candidates;
use exdiv_radar::cache::{Clock, ScanCache};
use exdiv_radar::config::{load_config, AppConfig};
use exdiv_radar::fetch::{
    AnnouncementSource, QuoteSource, RequestGate, TwseClient, YahooChartClient,
};
use exdiv_radar::model::{is_valid_security_id, FilterCriteria, HistoryPoint};
use exdiv_radar::pipeline::Pipeline;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config: AppConfig = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let announcements = TwseClient::new(RequestGate::from_millis(config.announcement_delay_ms));
    let quotes = YahooChartClient::new(
        config.market_suffix.clone(),
        RequestGate::from_millis(config.quote_delay_ms),
    );
    let pipeline = Pipeline::new(announcements, quotes, config.window_days);
    let cache = ScanCache::new(pipeline, Duration::hours(config.cache_ttl_hours));

    let criteria = FilterCriteria {
        price_min: config.filter.price_min,
        price_max: config.filter.price_max,
        min_avg_volume_lots: config.filter.min_avg_volume_lots,
    };

    info!(
        window_days = config.window_days,
        "Scanning upcoming ex-dividend announcements..."
    );
    scan_and_report(&cache, &criteria).await;

    // Operator loop: rescan, inspect a single security, or quit.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!();
        println!("enter a security id for its one-year history, 'r' to force a refresh, 'q' to quit");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        match line.trim() {
            "" | "q" | "quit" => break,
            "r" | "refresh" => {
                cache.invalidate().await;
                info!("Cache cleared, rescanning...");
                scan_and_report(&cache, &criteria).await;
            }
            id if is_valid_security_id(id) => {
                let points = cache.history(id).await;
                if points.is_empty() {
                    error!("No history available for {}.", id);
                } else {
                    print_history(id, &points);
                }
            }
            other => println!("unrecognized input: {other}"),
        }
    }
}

async fn scan_and_report<A, Q, C>(cache: &ScanCache<A, Q, C>, criteria: &FilterCriteria)
where
    A: AnnouncementSource,
    Q: QuoteSource,
    C: Clock,
{
    let dataset = cache.dataset().await;
    if dataset.is_empty() {
        info!("No ex-dividend announcements published for the window yet.");
        return;
    }
    info!(securities = dataset.len(), "Scan complete.");

    let candidates = find_candidates(&dataset, criteria);
    if candidates.is_empty() {
        info!("No announced security passes the current thresholds.");
        return;
    }

    println!(
        "{:<8} {:<12} {:>10} {:>12} {:>8} {:>7} {:>7}",
        "id", "ex-date", "close", "avg vol 5d", "macd", "%K", "%D"
    );
    for r in &candidates {
        println!(
            "{:<8} {:<12} {:>10.2} {:>12.0} {:>8} {:>7} {:>7}",
            r.security_id,
            r.announcement_date.to_string(),
            r.last_close,
            r.avg_volume_5d,
            fmt_opt(r.macd),
            fmt_opt(r.stoch_k),
            fmt_opt(r.stoch_d),
        );
    }
}

/// Prints the tail of the detail-view series as a plain table.
fn print_history(security_id: &str, points: &[HistoryPoint]) {
    println!("history for {security_id} (last 20 sessions):");
    println!(
        "{:<12} {:>9} {:>10} {:>9} {:>9} {:>8} {:>8} {:>7} {:>7}",
        "date", "close", "volume", "sma5", "sma20", "macd", "signal", "%K", "%D"
    );
    for p in points.iter().rev().take(20).rev() {
        println!(
            "{:<12} {:>9.2} {:>10.0} {:>9} {:>9} {:>8} {:>8} {:>7} {:>7}",
            p.bar.date.to_string(),
            p.bar.close,
            p.bar.volume,
            fmt_opt(p.sma_5),
            fmt_opt(p.sma_20),
            fmt_opt(p.macd),
            fmt_opt(p.macd_signal),
            fmt_opt(p.stoch_k),
            fmt_opt(p.stoch_d),
        );
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}"))
        .unwrap_or_else(|| "-".to_string())
}
