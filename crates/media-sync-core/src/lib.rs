pub mod clock;
pub mod credentials;
pub mod dedup;
pub mod error;
pub mod sink;
pub mod sync;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, SystemClock};
pub use credentials::{CredentialManager, CredentialState, DevicePrompt};
pub use dedup::{find_duplicate, is_same_entry, normalize_timestamp, DuplicateDetector};
pub use error::SyncError;
pub use sink::{SubmitOutcome, TimeEntrySink};
pub use sync::{prepare_settings, SyncObserver, SyncOrchestrator, SyncResult};
pub use transform::build_candidate;
