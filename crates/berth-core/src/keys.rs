//! Deterministic document identifiers.
//!
//! This module is the single source of truth for every document id the
//! ledgers write. No hardcoded id strings should exist outside it.
//!
//! Ids are flat strings namespaced by a collection prefix:
//!
//! ```text
//! memberships/{service}/{cluster}-{silo}
//! cluster-versions/{service}/{cluster}
//! reminders/{service}-{owner}-{name}
//! ```
//!
//! Every id is derivable from the operation's inputs alone — there are no
//! generated ids anywhere in the store, and tests rely on that determinism.
//! Note that opaque identifiers may themselves contain `-`, so ids are not
//! reversible; readers always filter on parsed body fields rather than on
//! id structure.

use crate::scope::ClusterScope;

/// Collection prefix for membership documents.
pub const MEMBERSHIPS: &str = "memberships/";

/// Collection prefix for cluster-version documents.
pub const CLUSTER_VERSIONS: &str = "cluster-versions/";

/// Collection prefix for reminder documents.
pub const REMINDERS: &str = "reminders/";

/// Returns the id of the membership document for one silo.
#[must_use]
pub fn member_doc_id(scope: &ClusterScope, silo_address: &str) -> String {
    format!(
        "{MEMBERSHIPS}{}/{}-{silo_address}",
        scope.service_id(),
        scope.cluster_id()
    )
}

/// Returns the query prefix covering every membership document of a service.
#[must_use]
pub fn member_service_prefix(service_id: &str) -> String {
    format!("{MEMBERSHIPS}{service_id}/")
}

/// Returns the id of the tenant's single cluster-version document.
#[must_use]
pub fn cluster_version_doc_id(scope: &ClusterScope) -> String {
    format!(
        "{CLUSTER_VERSIONS}{}/{}",
        scope.service_id(),
        scope.cluster_id()
    )
}

/// Returns the id of one reminder document.
#[must_use]
pub fn reminder_doc_id(service_id: &str, owner_id: &str, reminder_name: &str) -> String {
    format!("{REMINDERS}{service_id}-{owner_id}-{reminder_name}")
}

/// Returns the query prefix covering every reminder document of a service.
#[must_use]
pub fn reminder_service_prefix(service_id: &str) -> String {
    format!("{REMINDERS}{service_id}-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deterministic_and_derivable() {
        let scope = ClusterScope::new("svc", "dev").unwrap();

        assert_eq!(
            member_doc_id(&scope, "198.51.100.1:11111@100"),
            "memberships/svc/dev-198.51.100.1:11111@100"
        );
        assert_eq!(cluster_version_doc_id(&scope), "cluster-versions/svc/dev");
        assert_eq!(
            reminder_doc_id("svc", "user/42", "refresh"),
            "reminders/svc-user/42-refresh"
        );
    }

    #[test]
    fn member_ids_fall_under_the_service_prefix() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let id = member_doc_id(&scope, "silo-1");
        assert!(id.starts_with(&member_service_prefix("svc")));
    }

    #[test]
    fn cluster_version_id_is_outside_the_membership_collection() {
        let scope = ClusterScope::new("svc", "dev").unwrap();
        let version_id = cluster_version_doc_id(&scope);
        assert!(!version_id.starts_with(MEMBERSHIPS));
    }
}
