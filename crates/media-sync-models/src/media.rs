use serde::{Deserialize, Serialize};

/// Placeholder used when a movie has no release year.
pub const UNKNOWN_YEAR: &str = "N/A";

/// Placeholder used when an episode has not been given a title yet.
pub const UNTITLED_EPISODE: &str = "TBA";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Episode,
    Movie,
}

impl MediaKind {
    /// Prefix that tells episodes and movies apart in entry descriptions.
    pub fn marker(&self) -> &'static str {
        match self {
            MediaKind::Episode => "📺",
            MediaKind::Movie => "🎞️",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Episode => "episode",
            MediaKind::Movie => "movie",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatchedMedia {
    Episode {
        show_title: String,
        season: u32,
        number: u32,
        title: Option<String>,
    },
    Movie {
        title: String,
        year: Option<u32>,
    },
}

impl WatchedMedia {
    pub fn kind(&self) -> MediaKind {
        match self {
            WatchedMedia::Episode { .. } => MediaKind::Episode,
            WatchedMedia::Movie { .. } => MediaKind::Movie,
        }
    }

    /// Human-readable title, e.g. `Show - S01E02 - Pilot` or `Movie (1999)`.
    pub fn display_title(&self) -> String {
        match self {
            WatchedMedia::Episode {
                show_title,
                season,
                number,
                title,
            } => format!(
                "{} - S{:02}E{:02} - {}",
                show_title,
                season,
                number,
                title.as_deref().unwrap_or(UNTITLED_EPISODE)
            ),
            WatchedMedia::Movie { title, year } => match year {
                Some(year) => format!("{} ({})", title, year),
                None => format!("{} ({})", title, UNKNOWN_YEAR),
            },
        }
    }
}
