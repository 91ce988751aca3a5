//! Persisted document shape for the reminder ledger.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use berth_core::document::Document;
use berth_core::error::{Error, Result};
use berth_core::keys;
use berth_core::scope::ClusterScope;

use crate::ring;
use crate::types::ReminderEntry;

/// The data version of this provider, stamped into every document.
pub const PROVIDER_VERSION: u32 = 1;

/// One durable reminder registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDoc {
    /// Document id: `reminders/{service}-{owner}-{name}`.
    pub id: String,
    /// The data version of this provider.
    pub provider_version: u32,
    /// The service this reminder is stored for.
    pub service_id: String,
    /// The cluster generation that created the reminder. Diagnostics only.
    pub cluster_id: String,
    /// The reminder name, unique per owner.
    pub reminder_name: String,
    /// The owning entity's opaque identifier.
    pub owner_id: String,
    /// The owner's ring position, always derived from `owner_id` on write.
    pub owner_hash: u32,
    /// The absolute UTC instant of the first tick.
    pub start_at: DateTime<Utc>,
    /// The period between ticks.
    pub period: Duration,
}

impl ReminderDoc {
    /// Builds the document for `entry` under `scope`, deriving the ring
    /// hash and normalizing the start instant.
    #[must_use]
    pub fn new(scope: &ClusterScope, entry: &ReminderEntry) -> Self {
        Self {
            id: keys::reminder_doc_id(scope.service_id(), entry.owner.as_str(), &entry.name),
            provider_version: PROVIDER_VERSION,
            service_id: scope.service_id().to_string(),
            cluster_id: scope.cluster_id().to_string(),
            reminder_name: entry.name.clone(),
            owner_id: entry.owner.as_str().to_string(),
            owner_hash: ring::owner_hash(entry.owner.as_str()),
            start_at: entry.start_at.to_utc(),
            period: entry.period,
        }
    }

    /// Maps back to the runtime-facing entry with the given ETag.
    #[must_use]
    pub fn into_entry(self, etag: String) -> ReminderEntry {
        ReminderEntry {
            owner: crate::types::EntityId::new(self.owner_id),
            name: self.reminder_name,
            start_at: self.start_at.into(),
            period: self.period,
            etag,
        }
    }
}

/// Serializes a document body.
pub(crate) fn json_bytes<T: Serialize>(id: &str, value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|e| Error::serialization(id, e))
}

/// Parses a stored document body.
pub(crate) fn parse_body<T: for<'de> Deserialize<'de>>(document: &Document) -> Result<T> {
    serde_json::from_slice(&document.body).map_err(|e| Error::serialization(&document.id, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, StartAt};
    use chrono::NaiveDate;

    #[test]
    fn doc_derives_hash_and_normalizes_start() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let naive = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let entry = ReminderEntry {
            owner: EntityId::new("entity/42"),
            name: "refresh".into(),
            start_at: StartAt::Unzoned(naive),
            period: Duration::from_secs(300),
            etag: String::new(),
        };

        let doc = ReminderDoc::new(&scope, &entry);
        assert_eq!(doc.id, "reminders/svc-entity/42-refresh");
        assert_eq!(doc.owner_hash, ring::owner_hash("entity/42"));
        assert_eq!(doc.start_at.timezone(), Utc);
        assert_eq!(doc.cluster_id, "dev");

        let bytes = json_bytes(&doc.id, &doc).unwrap();
        let parsed: ReminderDoc = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn doc_maps_back_to_entry() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let entry = ReminderEntry {
            owner: EntityId::new("entity/42"),
            name: "refresh".into(),
            start_at: StartAt::Utc(Utc::now()),
            period: Duration::from_secs(60),
            etag: String::new(),
        };

        let roundtripped = ReminderDoc::new(&scope, &entry).into_entry("7".into());
        assert_eq!(roundtripped.owner, entry.owner);
        assert_eq!(roundtripped.name, entry.name);
        assert_eq!(roundtripped.start_at.to_utc(), entry.start_at.to_utc());
        assert_eq!(roundtripped.period, entry.period);
        assert_eq!(roundtripped.etag, "7");
    }
}
