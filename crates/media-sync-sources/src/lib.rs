pub mod error;
pub mod toggl;
pub mod traits;
pub mod trakt;

pub use error::SourceError;
pub use toggl::TogglClient;
pub use traits::{HistorySource, TimeEntryDestination};
pub use trakt::{DeviceCode, DevicePoll, TokenGrant, TraktClient};
