use crate::model::{Announcement, DailyBar, FetchError, Lookback};
use chrono::NaiveDate;

/// Daily announcement source. One call covers exactly one calendar date.
#[async_trait::async_trait]
pub trait AnnouncementSource: Send + Sync {
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<Announcement>, FetchError>;
}

/// Historical quote source. Bars come back ascending by date.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    async fn history(
        &self,
        security_id: &str,
        lookback: Lookback,
    ) -> Result<Vec<DailyBar>, FetchError>;
}
