//! # berth-cluster
//!
//! Cluster-membership persistence for a distributed-actor runtime.
//!
//! Two documents back the ledger: one membership record per silo, and a
//! single cluster-version record per `(service, cluster)` tenant whose
//! revision is the cluster's monotonically-versioned view. Membership-
//! changing writes advance both in one all-or-nothing unit of work, gated
//! by the version tokens the caller last observed; the runtime's
//! membership protocol owns the revision number, this crate only persists
//! and version-gates it.
//!
//! - [`MembershipLedger`]: read / insert / update / heartbeat / purge
//! - [`GatewayView`]: read-only projection of connectable gateway silos

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod docs;
pub mod gateway;
pub mod membership;
pub mod types;

pub use gateway::{GatewayEndpoint, GatewayView};
pub use membership::MembershipLedger;
pub use types::{
    MembershipEntry, MembershipRow, MembershipSnapshot, SiloAddress, SiloStatus, SuspectTime,
    TableVersion,
};
