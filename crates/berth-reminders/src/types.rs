//! Runtime-facing reminder types.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The opaque identifier of the entity owning a reminder.
///
/// Never parsed: used only as a document-id component and a hash input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an entity identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A reminder's first-tick instant as supplied by the caller.
///
/// Callers sometimes hand over wall-clock readings with no zone attached;
/// the ledger persists only unambiguous absolute instants, so an unzoned
/// reading is taken to already be in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAt {
    /// An absolute UTC instant.
    Utc(DateTime<Utc>),
    /// A wall-clock reading with no zone; treated as UTC.
    Unzoned(NaiveDateTime),
}

impl StartAt {
    /// Normalizes to an absolute UTC instant.
    #[must_use]
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            Self::Utc(instant) => instant,
            Self::Unzoned(naive) => Utc.from_utc_datetime(&naive),
        }
    }
}

impl From<DateTime<Utc>> for StartAt {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Utc(instant)
    }
}

impl From<NaiveDateTime> for StartAt {
    fn from(naive: NaiveDateTime) -> Self {
        Self::Unzoned(naive)
    }
}

/// One reminder registration as the runtime sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    /// The owning entity.
    pub owner: EntityId,
    /// The reminder name, unique per owner.
    pub name: String,
    /// When the reminder should first tick.
    pub start_at: StartAt,
    /// The period between ticks.
    pub period: Duration,
    /// The version token of the stored document this entry was read from;
    /// empty for a registration that has never been persisted.
    pub etag: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn unzoned_start_is_treated_as_utc() {
        let naive = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let normalized = StartAt::from(naive).to_utc();
        assert_eq!(normalized, Utc.from_utc_datetime(&naive));
    }

    #[test]
    fn utc_start_passes_through() {
        let instant = Utc::now();
        assert_eq!(StartAt::from(instant).to_utc(), instant);
    }
}
