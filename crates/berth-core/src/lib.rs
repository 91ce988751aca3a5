//! # berth-core
//!
//! Core abstractions for the Berth coordination store.
//!
//! Berth persists the two coordination primitives of a distributed-actor
//! runtime — cluster membership and scheduled reminders — in a generic
//! document store arbitrated by per-document optimistic concurrency.
//! This crate provides the pieces shared by both ledgers:
//!
//! - **Document Store**: the [`DocumentStore`] trait (load / query /
//!   unit-of-work commit) and the in-memory reference implementation
//! - **Cluster Scope**: the validated `(service, cluster)` tenant pair
//!   routed explicitly through every ledger operation
//! - **Document Keys**: the single source of truth for deterministic
//!   document identifiers
//! - **Error Types**: shared error definitions and result types
//! - **Observability**: structured-logging bootstrap
//!
//! ## Crate Boundary
//!
//! `berth-core` knows nothing about membership or reminders. The ledger
//! crates (`berth-cluster`, `berth-reminders`) define their own document
//! shapes and drive the store through the contracts defined here.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod document;
pub mod error;
pub mod keys;
pub mod observability;
pub mod scope;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use berth_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::document::{
        CommitOutcome, ConflictKind, DocOp, Document, DocumentStore, MemoryDocumentStore,
        UnitOfWork, ABSENT_VERSION,
    };
    pub use crate::error::{Error, Result};
    pub use crate::scope::ClusterScope;
}

// Re-export key types at crate root for ergonomics
pub use document::{
    CommitOutcome, ConflictKind, DocOp, Document, DocumentStore, MemoryDocumentStore, UnitOfWork,
    ABSENT_VERSION,
};
pub use error::{Error, Result};
pub use observability::{init_logging, LogFormat};
pub use scope::ClusterScope;
