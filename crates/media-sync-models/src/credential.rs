use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// The single OAuth token set kept for the history source.
///
/// Replaced wholesale on refresh or re-authentication, never merged.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "deserialize_instant")]
    pub expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// Build a record whose expiration is `issued_at + expires_in_secs`.
    ///
    /// `None` when the expiration falls outside the representable range.
    pub fn issued(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in_secs: i64,
    ) -> Option<Self> {
        let expires_at = Duration::try_seconds(expires_in_secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))?;
        Some(Self::new(access_token, refresh_token, expires_at))
    }

    /// Instant from which the token counts as near expiration.
    pub fn refresh_due_at(&self, buffer: Duration) -> DateTime<Utc> {
        self.expires_at
            .checked_sub_signed(buffer)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// True once `now` has reached `expires_at - buffer`.
    pub fn is_near_expiration(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now >= self.refresh_due_at(buffer)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Parse an ISO-8601 instant.
///
/// RFC 3339 values keep their offset. Values without an offset are read as
/// local time, which is how older token files were written.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid expiration timestamp: {}", raw)))
}
