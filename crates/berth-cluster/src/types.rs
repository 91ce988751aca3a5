//! Runtime-facing membership types.
//!
//! These are the shapes the host runtime's membership protocol exchanges
//! with the ledger. Identifiers are opaque to this layer: a [`SiloAddress`]
//! is never parsed, only used as a map key and a document-id component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use berth_core::document::ABSENT_VERSION;

/// The opaque network identity of a silo, globally unique within a cluster
/// generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiloAddress(String);

impl SiloAddress {
    /// Wraps an address string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiloAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SiloAddress {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

/// Lifecycle status of a silo, as driven by the runtime's membership
/// protocol. The ledger stores it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiloStatus {
    /// Process created but not yet joining.
    Created,
    /// Joining the cluster.
    Joining,
    /// Full member, serving traffic.
    Active,
    /// Graceful shutdown started.
    ShuttingDown,
    /// Hard stop in progress.
    Stopping,
    /// Declared dead by the membership protocol.
    Dead,
}

/// One silo's suspicion that another silo is dead.
///
/// Consumed by the runtime's failure-detector voting; the ledger neither
/// validates nor bounds the list beyond persisting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspectTime {
    /// The suspecting silo.
    pub silo: SiloAddress,
    /// When the suspicion was recorded.
    pub timestamp: DateTime<Utc>,
}

/// The full membership record for one silo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipEntry {
    /// Human-readable silo name.
    pub silo_name: String,
    /// Host the silo runs on.
    pub host_name: String,
    /// The silo's opaque network identity.
    pub silo_address: SiloAddress,
    /// Client-facing proxy port; present and non-zero marks the silo as
    /// gateway-capable.
    pub proxy_port: Option<u16>,
    /// Deployment role placement hint.
    pub role_name: Option<String>,
    /// Update-domain placement hint.
    pub update_zone: Option<i32>,
    /// Fault-domain placement hint.
    pub fault_zone: Option<i32>,
    /// Outstanding liveness suspicions against this silo.
    pub suspect_times: Vec<SuspectTime>,
    /// When the silo started.
    pub start_time: DateTime<Utc>,
    /// Last self-reported heartbeat. Diagnostics-only: updated outside the
    /// version-token protocol.
    pub i_am_alive_time: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: SiloStatus,
}

/// The cluster's monotonically-versioned view: a caller-owned revision plus
/// the ETag of the stored cluster-version document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableVersion {
    /// Monotonically increasing revision, supplied by the runtime's
    /// membership protocol and never computed here.
    pub revision: u64,
    /// ETag of the cluster-version document this revision was read from.
    pub etag: String,
}

impl TableVersion {
    /// The synthetic version reported when no cluster-version document
    /// exists yet: revision 0 with the absent ETag.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            revision: 0,
            etag: ABSENT_VERSION.to_string(),
        }
    }
}

/// One membership row paired with its document ETag.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipRow {
    /// The membership record.
    pub entry: MembershipEntry,
    /// The record's current version token.
    pub etag: String,
}

/// A membership read result: zero or more rows plus the cluster version
/// observed alongside them.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipSnapshot {
    /// The matching membership rows.
    pub rows: Vec<MembershipRow>,
    /// The tenant's cluster version at read time.
    pub version: TableVersion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_table_version_is_revision_zero() {
        let version = TableVersion::absent();
        assert_eq!(version.revision, 0);
        assert_eq!(version.etag, ABSENT_VERSION);
    }

    #[test]
    fn silo_address_is_opaque() {
        let address = SiloAddress::new("198.51.100.1:11111@100");
        assert_eq!(address.as_str(), "198.51.100.1:11111@100");
        assert_eq!(address.to_string(), "198.51.100.1:11111@100");
    }
}
