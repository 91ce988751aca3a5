//! Persisted document shapes for the membership ledger.
//!
//! Pure data: the behavior lives in [`crate::membership`]. Version tokens
//! are store metadata and never appear in the body.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use berth_core::document::Document;
use berth_core::error::{Error, Result};
use berth_core::keys;
use berth_core::scope::ClusterScope;

use crate::types::MembershipEntry;

/// The data version of this provider, stamped into every document.
pub const PROVIDER_VERSION: u32 = 1;

/// JSON pointer to the heartbeat field inside a membership document.
pub const HEARTBEAT_POINTER: &str = "/entry/i_am_alive_time";

/// The state of one silo within a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipDoc {
    /// Document id: `memberships/{service}/{cluster}-{silo}`.
    pub id: String,
    /// The data version of this provider.
    pub provider_version: u32,
    /// The service this silo is part of.
    pub service_id: String,
    /// The cluster generation this silo is part of.
    pub cluster_id: String,
    /// The membership record itself.
    pub entry: MembershipEntry,
}

impl MembershipDoc {
    /// Builds the document for `entry` under `scope`.
    #[must_use]
    pub fn new(scope: &ClusterScope, entry: MembershipEntry) -> Self {
        Self {
            id: keys::member_doc_id(scope, entry.silo_address.as_str()),
            provider_version: PROVIDER_VERSION,
            service_id: scope.service_id().to_string(),
            cluster_id: scope.cluster_id().to_string(),
            entry,
        }
    }
}

/// The version of the cluster across all silos.
///
/// The revision is a monotonically increasing number owned by the runtime's
/// membership protocol; this provider persists it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVersionDoc {
    /// Document id: `cluster-versions/{service}/{cluster}`.
    pub id: String,
    /// The data version of this provider.
    pub provider_version: u32,
    /// The caller-supplied table revision.
    pub revision: u64,
}

impl ClusterVersionDoc {
    /// Builds the tenant's cluster-version document at `revision`.
    #[must_use]
    pub fn new(scope: &ClusterScope, revision: u64) -> Self {
        Self {
            id: keys::cluster_version_doc_id(scope),
            provider_version: PROVIDER_VERSION,
            revision,
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
    use crate::types::{SiloAddress, SiloStatus};
    use chrono::Utc;

    fn entry() -> MembershipEntry {
        MembershipEntry {
            silo_name: "silo-1".into(),
            host_name: "host-1".into(),
            silo_address: SiloAddress::new("198.51.100.1:11111@100"),
            proxy_port: Some(30000),
            role_name: None,
            update_zone: None,
            fault_zone: None,
            suspect_times: Vec::new(),
            start_time: Utc::now(),
            i_am_alive_time: Utc::now(),
            status: SiloStatus::Active,
        }
    }

    #[test]
    fn membership_doc_roundtrips_through_json() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let doc = MembershipDoc::new(&scope, entry());
        assert_eq!(doc.id, "memberships/svc/dev-198.51.100.1:11111@100");
        assert_eq!(doc.provider_version, PROVIDER_VERSION);

        let bytes = json_bytes(&doc.id, &doc).unwrap();
        let parsed: MembershipDoc = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn heartbeat_pointer_resolves_in_serialized_doc() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let doc = MembershipDoc::new(&scope, entry());
        let bytes = json_bytes(&doc.id, &doc).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(parsed.pointer(HEARTBEAT_POINTER).is_some());
    }

    #[test]
    fn cluster_version_doc_carries_caller_revision() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let doc = ClusterVersionDoc::new(&scope, 42);
        assert_eq!(doc.id, "cluster-versions/svc/dev");
        assert_eq!(doc.revision, 42);
    }
}
