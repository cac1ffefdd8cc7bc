use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use crate::media::{MediaKind, WatchedMedia};

/// A single watch event reported by the history source.
///
/// `watched_at` keeps the offset the source reported so the entry end can be
/// sent back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchHistory {
    pub watched_at: DateTime<FixedOffset>,
    pub media: WatchedMedia,
    /// Runtime in minutes, 0 when the source does not know it.
    #[serde(default)]
    pub runtime_minutes: u32,
}

impl WatchHistory {
    pub fn kind(&self) -> MediaKind {
        self.media.kind()
    }

    pub fn display_title(&self) -> String {
        self.media.display_title()
    }
}
