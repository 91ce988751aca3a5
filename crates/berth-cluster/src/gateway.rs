//! Read-only gateway projection over the membership ledger.
//!
//! Client processes connect to the cluster through gateway-capable silos:
//! members that are `Active` and advertise a non-zero proxy port. This view
//! lists them in a connect-able form; it holds no state and repeated calls
//! reflect new writes, so callers may cache results up to
//! [`GatewayView::MAX_STALENESS`] with no separate invalidation channel.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use berth_core::document::DocumentStore;
use berth_core::error::Result;
use berth_core::keys;
use berth_core::scope::ClusterScope;

use crate::docs::{parse_body, MembershipDoc};
use crate::types::SiloStatus;

/// A connect-able gateway endpoint: the member's host plus its proxy port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    /// Host the gateway silo runs on.
    pub host: String,
    /// The advertised client-facing proxy port.
    pub port: u16,
}

impl fmt::Display for GatewayEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}:{}", self.host, self.port)
    }
}

/// Gateway list provider over the membership documents.
#[derive(Clone)]
pub struct GatewayView {
    store: Arc<dyn DocumentStore>,
    scope: ClusterScope,
}

impl GatewayView {
    /// How stale a cached gateway list may be before callers must refresh.
    pub const MAX_STALENESS: Duration = Duration::from_secs(60);

    /// Creates a view scoped to one `(service, cluster)` tenant.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, scope: ClusterScope) -> Self {
        Self { store, scope }
    }

    /// Whether repeated calls reflect membership changes.
    ///
    /// Always true: every call re-queries the shared store.
    #[must_use]
    pub const fn is_updatable(&self) -> bool {
        true
    }

    /// Lists every active, gateway-capable member of the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn list_gateways(&self) -> Result<Vec<GatewayEndpoint>> {
        trace!(scope = %self.scope, "listing gateways");

        let prefix = keys::member_service_prefix(self.scope.service_id());
        let mut gateways = Vec::new();
        for document in self.store.query(&prefix).await? {
            let doc: MembershipDoc = parse_body(&document)?;
            if doc.service_id != self.scope.service_id()
                || doc.cluster_id != self.scope.cluster_id()
            {
                continue;
            }
            if doc.entry.status != SiloStatus::Active {
                continue;
            }
            let Some(port) = doc.entry.proxy_port.filter(|port| *port > 0) else {
                continue;
            };
            gateways.push(GatewayEndpoint {
                host: doc.entry.host_name,
                port,
            });
        }

        trace!(scope = %self.scope, count = gateways.len(), "listed gateways");
        Ok(gateways)
    }
}
