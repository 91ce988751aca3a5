//! Cluster scoping primitives.
//!
//! Every ledger operation is scoped to a `(service, cluster)` pair: the
//! service identifier names the logical deployment across cluster
//! generations, the cluster identifier names one generation. The scope is
//! routed explicitly through every constructor rather than captured in
//! shared state, since one process may serve several tenants in tests or
//! multi-tenant deployments.
//!
//! # Example
//!
//! ```rust
//! use berth_core::scope::ClusterScope;
//!
//! let scope = ClusterScope::new("orders-svc", "prod-7").unwrap();
//! assert_eq!(scope.service_id(), "orders-svc");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A validated `(service, cluster)` tenant pair.
///
/// Identifiers are opaque beyond the validation here: they must be
/// non-empty and free of path separators and control characters, because
/// both participate in deterministic document ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterScope {
    service_id: String,
    cluster_id: String,
}

impl ClusterScope {
    /// Creates a new scope after validating both identifiers.
    ///
    /// # Errors
    ///
    /// Returns an error if either identifier is empty or contains `/`,
    /// whitespace, or control characters.
    pub fn new(service_id: impl Into<String>, cluster_id: impl Into<String>) -> Result<Self> {
        let service_id = service_id.into();
        let cluster_id = cluster_id.into();

        Self::validate_id(&service_id, "service_id")?;
        Self::validate_id(&cluster_id, "cluster_id")?;

        Ok(Self {
            service_id,
            cluster_id,
        })
    }

    /// Returns the service identifier.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Returns the cluster identifier.
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// Validates an identifier for use in document ids.
    fn validate_id(id: &str, field: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidId {
                message: format!("{field} cannot be empty"),
            });
        }

        if id.contains('/') || id.contains('\\') {
            return Err(Error::InvalidId {
                message: format!("{field} cannot contain path separators"),
            });
        }

        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::InvalidId {
                message: format!("{field} cannot contain whitespace or control characters"),
            });
        }

        Ok(())
    }
}

impl fmt::Display for ClusterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_id, self.cluster_id)
    }
}
