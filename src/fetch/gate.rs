//! Fixed-interval request gate.
//!
//! Both upstream sources rate-limit aggressive clients, so every request is
//! followed by a configured pause regardless of outcome. Tests construct a
//! disabled gate so they run with zero delay.

use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RequestGate {
    interval: Duration,
}

impl RequestGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// A gate that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits out the configured interval. Called after every request,
    /// success or failure.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}
