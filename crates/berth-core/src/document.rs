//! Generic document store with per-document optimistic concurrency.
//!
//! This module defines the storage contract the coordination ledgers are
//! built on. The contract is deliberately narrow so that any backend with
//! per-document compare-and-swap can satisfy it:
//!
//! - Documents are opaque JSON bodies addressed by a flat string id
//! - Every stored document carries an opaque version token, advanced by the
//!   store on each write and exposed to callers as an ETag string
//! - Writes are staged in a [`UnitOfWork`] and applied all-or-nothing; a
//!   stale expected version on *any* staged operation aborts the whole unit
//! - A lost race is a normal [`CommitOutcome`], never an error, and names
//!   the conflicting document so callers can tell concurrent-writer races
//!   apart by document kind
//!
//! Backends without a native multi-document transaction must order the unit
//! so the version-bearing document is written last and treat its failure as
//! an overall abort; the in-memory implementation below validates every
//! precondition under one write lock before applying anything, which gives
//! the exact semantics.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// The version token reported for a document that does not exist.
///
/// Readers use this as the synthetic ETag of absent version records.
pub const ABSENT_VERSION: &str = "0";

/// A stored document: id, JSON body, and store-managed version token.
///
/// The version token is opaque — backends interpret it according to their
/// own semantics (numeric generation, ETag, row version). Callers only ever
/// round-trip it back as an expected version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document identifier.
    pub id: String,
    /// The serialized document body.
    pub body: Bytes,
    /// The version token stamped by the store on the last write.
    pub version: String,
}

/// A single staged operation within a [`UnitOfWork`].
#[derive(Debug, Clone)]
pub enum DocOp {
    /// Create a document that must not already exist.
    Insert {
        /// Target document id.
        id: String,
        /// Full replacement body.
        body: Bytes,
    },
    /// Replace a document whose current version must match `expected`.
    Update {
        /// Target document id.
        id: String,
        /// Full replacement body.
        body: Bytes,
        /// The version token the stored document must currently carry.
        expected: String,
    },
    /// Set a single field in place, identified by JSON pointer.
    ///
    /// Patches neither consult nor advance the version token: they can race
    /// with a concurrent [`DocOp::Update`] and lose silently. The ledgers
    /// reserve this for advisory fields where that latitude is acceptable.
    Patch {
        /// Target document id.
        id: String,
        /// JSON pointer to the field to set (e.g. `/entry/i_am_alive_time`).
        pointer: String,
        /// The new field value.
        value: serde_json::Value,
    },
    /// Delete a document, optionally gated by an expected version.
    ///
    /// An unconditional delete of a missing document is a no-op (idempotent);
    /// a conditional delete of a missing document is a conflict.
    Delete {
        /// Target document id.
        id: String,
        /// The version token the stored document must carry, if any.
        expected: Option<String>,
    },
}

impl DocOp {
    /// Returns the id of the document this operation targets.
    #[must_use]
    pub fn document_id(&self) -> &str {
        match self {
            Self::Insert { id, .. }
            | Self::Update { id, .. }
            | Self::Patch { id, .. }
            | Self::Delete { id, .. } => id,
        }
    }
}

/// An ordered group of operations applied all-or-nothing.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    ops: Vec<DocOp>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an insert of a brand-new document.
    pub fn insert(&mut self, id: impl Into<String>, body: Bytes) {
        self.ops.push(DocOp::Insert {
            id: id.into(),
            body,
        });
    }

    /// Stages a version-gated replacement of an existing document.
    pub fn update(&mut self, id: impl Into<String>, body: Bytes, expected: impl Into<String>) {
        self.ops.push(DocOp::Update {
            id: id.into(),
            body,
            expected: expected.into(),
        });
    }

    /// Stages a version-agnostic single-field patch.
    pub fn patch(
        &mut self,
        id: impl Into<String>,
        pointer: impl Into<String>,
        value: serde_json::Value,
    ) {
        self.ops.push(DocOp::Patch {
            id: id.into(),
            pointer: pointer.into(),
            value,
        });
    }

    /// Stages a delete, gated by an expected version when given.
    pub fn delete(&mut self, id: impl Into<String>, expected: Option<String>) {
        self.ops.push(DocOp::Delete {
            id: id.into(),
            expected,
        });
    }

    /// Returns `true` if no operations have been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the number of staged operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns the staged operations in commit order.
    #[must_use]
    pub fn ops(&self) -> &[DocOp] {
        &self.ops
    }
}

/// Why a staged operation conflicted with the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An insert targeted a document that already exists.
    AlreadyExists,
    /// An expected version token did not match the stored version.
    VersionMismatch,
    /// An update or conditional delete targeted a missing document.
    Missing,
}

/// Result of committing a [`UnitOfWork`].
///
/// Conflicts are normal results, never errors: both outcomes mean the store
/// did its job. Only infrastructure failures surface as `Err`.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// Every staged operation took effect.
    Applied {
        /// New version token per written document id. Patched documents keep
        /// their prior token and do not appear here; deletes map to
        /// [`ABSENT_VERSION`].
        versions: HashMap<String, String>,
    },
    /// No staged operation took effect; `id` names the first document whose
    /// precondition failed.
    Conflict {
        /// The conflicting document id.
        id: String,
        /// The precondition that failed.
        kind: ConflictKind,
    },
}

impl CommitOutcome {
    /// Returns the new version token for `id` if the unit applied.
    #[must_use]
    pub fn version_of(&self, id: &str) -> Option<&str> {
        match self {
            Self::Applied { versions } => versions.get(id).map(String::as_str),
            Self::Conflict { .. } => None,
        }
    }
}

/// Document store trait for coordination-ledger backends.
///
/// Implementations must be safe to call from many tasks concurrently; the
/// ledgers hold no locks of their own and rely entirely on the per-document
/// version check for write arbitration.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Loads one document by id.
    ///
    /// Returns `Ok(None)` if the document does not exist — a missing
    /// document is never an error.
    async fn load(&self, id: &str) -> Result<Option<Document>>;

    /// Lists every document whose id starts with `prefix`.
    ///
    /// Results are returned in arbitrary order. Callers filter on parsed
    /// body fields; the prefix only narrows the scan to one collection.
    async fn query(&self, prefix: &str) -> Result<Vec<Document>>;

    /// Applies a unit of work all-or-nothing.
    ///
    /// Returns [`CommitOutcome::Conflict`] when any staged precondition
    /// fails — never an error for the lost-race case.
    async fn commit(&self, unit: UnitOfWork) -> Result<CommitOutcome>;
}

/// In-memory document store for testing.
///
/// Thread-safe via `RwLock`. Not suitable for production. Uses numeric
/// versions internally (exposed as strings) to simulate store-stamped
/// version tokens.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, StoredDocument>>>,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    body: Bytes,
    /// Numeric version stored as i64 internally, exposed as String via API.
    version: i64,
}

impl MemoryDocumentStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Checks one staged operation against current state without applying it.
fn check_op(documents: &HashMap<String, StoredDocument>, op: &DocOp) -> Option<ConflictKind> {
    match op {
        DocOp::Insert { id, .. } => documents.get(id).map(|_| ConflictKind::AlreadyExists),
        DocOp::Update { id, expected, .. } => match documents.get(id) {
            None => Some(ConflictKind::Missing),
            Some(doc) if doc.version.to_string() != *expected => {
                Some(ConflictKind::VersionMismatch)
            }
            Some(_) => None,
        },
        DocOp::Patch { id, .. } => match documents.get(id) {
            None => Some(ConflictKind::Missing),
            Some(_) => None,
        },
        DocOp::Delete { id, expected } => match (documents.get(id), expected) {
            (None, Some(_)) => Some(ConflictKind::Missing),
            (Some(doc), Some(expected)) if doc.version.to_string() != *expected => {
                Some(ConflictKind::VersionMismatch)
            }
            _ => None,
        },
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(documents.get(id).map(|doc| Document {
            id: id.to_string(),
            body: doc.body.clone(),
            version: doc.version.to_string(),
        }))
    }

    async fn query(&self, prefix: &str) -> Result<Vec<Document>> {
        let documents = self.documents.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(documents
            .iter()
            .filter(|(id, _)| id.starts_with(prefix))
            .map(|(id, doc)| Document {
                id: id.clone(),
                body: doc.body.clone(),
                version: doc.version.to_string(),
            })
            .collect())
    }

    async fn commit(&self, unit: UnitOfWork) -> Result<CommitOutcome> {
        let mut documents = self.documents.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        // Validate every precondition before applying anything: the first
        // failing operation aborts the whole unit with nothing written.
        for op in unit.ops() {
            if let Some(kind) = check_op(&documents, op) {
                return Ok(CommitOutcome::Conflict {
                    id: op.document_id().to_string(),
                    kind,
                });
            }
        }

        let mut versions = HashMap::new();
        for op in unit.ops() {
            match op {
                DocOp::Insert { id, body } => {
                    documents.insert(
                        id.clone(),
                        StoredDocument {
                            body: body.clone(),
                            version: 1,
                        },
                    );
                    versions.insert(id.clone(), "1".to_string());
                }
                DocOp::Update { id, body, .. } => {
                    let next = documents.get(id).map_or(1, |doc| doc.version + 1);
                    documents.insert(
                        id.clone(),
                        StoredDocument {
                            body: body.clone(),
                            version: next,
                        },
                    );
                    versions.insert(id.clone(), next.to_string());
                }
                DocOp::Patch { id, pointer, value } => {
                    let doc = documents.get_mut(id).ok_or_else(|| Error::Internal {
                        message: format!("patch target vanished mid-commit: {id}"),
                    })?;
                    let mut parsed: serde_json::Value = serde_json::from_slice(&doc.body)
                        .map_err(|e| Error::serialization(id, e))?;
                    let field = parsed.pointer_mut(pointer).ok_or_else(|| Error::Internal {
                        message: format!("unresolvable patch pointer {pointer} in {id}"),
                    })?;
                    *field = value.clone();
                    doc.body = Bytes::from(serde_json::to_vec(&parsed).map_err(|e| {
                        Error::serialization(id, e)
                    })?);
                    // Version token deliberately left untouched.
                }
                DocOp::Delete { id, .. } => {
                    documents.remove(id);
                    versions.insert(id.clone(), ABSENT_VERSION.to_string());
                }
            }
        }
        drop(documents);

        Ok(CommitOutcome::Applied { versions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> Bytes {
        Bytes::from(text.to_string())
    }

    async fn seed(store: &MemoryDocumentStore, id: &str, text: &str) -> String {
        let mut unit = UnitOfWork::new();
        unit.insert(id, body(text));
        match store.commit(unit).await.expect("commit should succeed") {
            CommitOutcome::Applied { versions } => versions[id].clone(),
            CommitOutcome::Conflict { .. } => panic!("seed insert conflicted"),
        }
    }

    #[tokio::test]
    async fn insert_then_load_roundtrip() {
        let store = MemoryDocumentStore::new();
        let version = seed(&store, "docs/a", r#"{"x":1}"#).await;

        let doc = store
            .load("docs/a")
            .await
            .expect("load should succeed")
            .expect("document should exist");
        assert_eq!(doc.body, body(r#"{"x":1}"#));
        assert_eq!(doc.version, version);
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let store = MemoryDocumentStore::new();
        assert!(store.load("docs/none").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_of_existing_document_conflicts() {
        let store = MemoryDocumentStore::new();
        seed(&store, "docs/a", "{}").await;

        let mut unit = UnitOfWork::new();
        unit.insert("docs/a", body("{}"));
        let outcome = store.commit(unit).await.unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Conflict {
                kind: ConflictKind::AlreadyExists,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let store = MemoryDocumentStore::new();
        let v1 = seed(&store, "docs/a", r#"{"x":1}"#).await;

        let mut unit = UnitOfWork::new();
        unit.update("docs/a", body(r#"{"x":2}"#), v1.clone());
        assert!(matches!(
            store.commit(unit).await.unwrap(),
            CommitOutcome::Applied { .. }
        ));

        // v1 is now stale.
        let mut unit = UnitOfWork::new();
        unit.update("docs/a", body(r#"{"x":3}"#), v1);
        let outcome = store.commit(unit).await.unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Conflict {
                kind: ConflictKind::VersionMismatch,
                ..
            }
        ));

        let doc = store.load("docs/a").await.unwrap().unwrap();
        assert_eq!(doc.body, body(r#"{"x":2}"#), "losing write must not land");
    }

    #[tokio::test]
    async fn unit_is_all_or_nothing() {
        let store = MemoryDocumentStore::new();
        seed(&store, "docs/existing", "{}").await;

        // Update a valid document and insert a duplicate in one unit: the
        // duplicate aborts the whole unit, including the valid update.
        let valid = seed(&store, "docs/valid", r#"{"n":1}"#).await;
        let mut unit = UnitOfWork::new();
        unit.update("docs/valid", body(r#"{"n":2}"#), valid);
        unit.insert("docs/existing", body("{}"));

        let outcome = store.commit(unit).await.unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Conflict {
                kind: ConflictKind::AlreadyExists,
                ..
            }
        ));

        let doc = store.load("docs/valid").await.unwrap().unwrap();
        assert_eq!(doc.body, body(r#"{"n":1}"#), "first op must be rolled back");
    }

    #[tokio::test]
    async fn conflict_names_the_failing_document() {
        let store = MemoryDocumentStore::new();
        let v = seed(&store, "docs/a", "{}").await;
        seed(&store, "docs/b", "{}").await;

        let mut unit = UnitOfWork::new();
        unit.update("docs/a", body("{}"), v);
        unit.update("docs/b", body("{}"), "999".to_string());
        match store.commit(unit).await.unwrap() {
            CommitOutcome::Conflict { id, kind } => {
                assert_eq!(id, "docs/b");
                assert_eq!(kind, ConflictKind::VersionMismatch);
            }
            CommitOutcome::Applied { .. } => panic!("expected conflict"),
        }
    }

    #[tokio::test]
    async fn patch_sets_field_without_touching_version() {
        let store = MemoryDocumentStore::new();
        let v1 = seed(&store, "docs/a", r#"{"entry":{"alive":"old"}}"#).await;

        let mut unit = UnitOfWork::new();
        unit.patch("docs/a", "/entry/alive", serde_json::json!("new"));
        assert!(matches!(
            store.commit(unit).await.unwrap(),
            CommitOutcome::Applied { .. }
        ));

        let doc = store.load("docs/a").await.unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&doc.body).unwrap();
        assert_eq!(parsed["entry"]["alive"], "new");
        assert_eq!(doc.version, v1, "patch must not advance the version token");
    }

    #[tokio::test]
    async fn patch_of_missing_document_conflicts() {
        let store = MemoryDocumentStore::new();
        let mut unit = UnitOfWork::new();
        unit.patch("docs/none", "/x", serde_json::json!(1));
        assert!(matches!(
            store.commit(unit).await.unwrap(),
            CommitOutcome::Conflict {
                kind: ConflictKind::Missing,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unconditional_delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        let mut unit = UnitOfWork::new();
        unit.delete("docs/none", None);
        assert!(matches!(
            store.commit(unit).await.unwrap(),
            CommitOutcome::Applied { .. }
        ));
    }

    #[tokio::test]
    async fn conditional_delete_checks_version() {
        let store = MemoryDocumentStore::new();
        let v1 = seed(&store, "docs/a", "{}").await;

        let mut unit = UnitOfWork::new();
        unit.delete("docs/a", Some("999".to_string()));
        assert!(matches!(
            store.commit(unit).await.unwrap(),
            CommitOutcome::Conflict {
                kind: ConflictKind::VersionMismatch,
                ..
            }
        ));
        assert!(store.load("docs/a").await.unwrap().is_some());

        let mut unit = UnitOfWork::new();
        unit.delete("docs/a", Some(v1));
        assert!(matches!(
            store.commit(unit).await.unwrap(),
            CommitOutcome::Applied { .. }
        ));
        assert!(store.load("docs/a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_filters_by_prefix() {
        let store = MemoryDocumentStore::new();
        seed(&store, "alpha/1", "{}").await;
        seed(&store, "alpha/2", "{}").await;
        seed(&store, "beta/1", "{}").await;

        let alphas = store.query("alpha/").await.unwrap();
        assert_eq!(alphas.len(), 2);
        let betas = store.query("beta/").await.unwrap();
        assert_eq!(betas.len(), 1);
    }

    #[tokio::test]
    async fn empty_unit_applies_with_no_versions() {
        let store = MemoryDocumentStore::new();
        match store.commit(UnitOfWork::new()).await.unwrap() {
            CommitOutcome::Applied { versions } => assert!(versions.is_empty()),
            CommitOutcome::Conflict { .. } => panic!("empty unit cannot conflict"),
        }
    }
}
