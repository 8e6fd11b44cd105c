// Fetch module: network clients for the two upstream sources.

pub mod announcements;
pub mod gate;
pub mod quotes;
pub mod traits;

pub use announcements::TwseClient;
pub use gate::RequestGate;
pub use quotes::YahooChartClient;
pub use traits::{AnnouncementSource, QuoteSource};
