pub mod credential;
pub mod media;
pub mod time_entry;
pub mod watch_history;

pub use credential::{parse_instant, CredentialRecord};
pub use media::{MediaKind, WatchedMedia};
pub use time_entry::{TimeEntry, TimeEntryCandidate};
pub use watch_history::WatchHistory;
