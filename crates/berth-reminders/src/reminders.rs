//! The reminder ledger.
//!
//! Every operation is scoped to the tenant's service identifier; the
//! cluster identifier rides along in the documents for diagnostics only.
//! Reads never fail on absence, removal races come back as `Ok(false)`,
//! and an upsert that loses its version race propagates the conflict —
//! the registration the caller holds is simply gone or replaced, and the
//! caller must re-read before trying again.

use std::sync::Arc;
use tracing::{trace, warn};

use berth_core::document::{CommitOutcome, DocumentStore, UnitOfWork};
use berth_core::error::{Error, Result};
use berth_core::keys;
use berth_core::scope::ClusterScope;

use crate::docs::{json_bytes, parse_body, ReminderDoc};
use crate::ring;
use crate::types::{EntityId, ReminderEntry};

/// Reminder table provider backed by a shared document store.
///
/// Stateless and safe to call from many processes concurrently; write
/// arbitration is entirely the store's per-document version check.
#[derive(Clone)]
pub struct ReminderLedger {
    store: Arc<dyn DocumentStore>,
    scope: ClusterScope,
}

impl ReminderLedger {
    /// Creates a ledger scoped to one `(service, cluster)` tenant.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, scope: ClusterScope) -> Self {
        Self { store, scope }
    }

    /// Returns the tenant this ledger is scoped to.
    #[must_use]
    pub fn scope(&self) -> &ClusterScope {
        &self.scope
    }

    /// Loads every reminder owned by one entity.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn read_owner_rows(&self, owner: &EntityId) -> Result<Vec<ReminderEntry>> {
        trace!(service = self.scope.service_id(), %owner, "reading reminder rows for owner");

        let rows = self
            .service_docs(|doc| doc.owner_id == owner.as_str())
            .await?;

        trace!(service = self.scope.service_id(), %owner, count = rows.len(), "read reminder rows for owner");
        Ok(rows)
    }

    /// Loads every reminder whose owner hash lies in the ring interval
    /// `(begin, end]`, wrapping modulo 2^32 when `begin >= end`.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn read_range_rows(&self, begin: u32, end: u32) -> Result<Vec<ReminderEntry>> {
        trace!(service = self.scope.service_id(), begin, end, "reading reminder rows in range");

        let rows = self
            .service_docs(|doc| ring::in_range(doc.owner_hash, begin, end))
            .await?;

        trace!(service = self.scope.service_id(), begin, end, count = rows.len(), "read reminder rows in range");
        Ok(rows)
    }

    /// Loads one reminder by owner and name.
    ///
    /// Returns `Ok(None)` when no such registration exists.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn read_row(
        &self,
        owner: &EntityId,
        reminder_name: &str,
    ) -> Result<Option<ReminderEntry>> {
        let document_id =
            keys::reminder_doc_id(self.scope.service_id(), owner.as_str(), reminder_name);
        trace!(%owner, reminder = reminder_name, "reading reminder row");

        match self.store.load(&document_id).await? {
            None => Ok(None),
            Some(document) => {
                let etag = document.version.clone();
                let doc: ReminderDoc = parse_body(&document)?;
                Ok(Some(doc.into_entry(etag)))
            }
        }
    }

    /// Inserts or replaces a reminder registration, returning the new ETag.
    ///
    /// A missing document is created; an existing one is replaced gated by
    /// the entry's ETag. The owner hash is always recomputed from the owner
    /// identifier and the start instant normalized to UTC — neither is
    /// trusted from the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] when the gated replacement loses its
    /// version race (or a racing insert got there first), and the usual
    /// store/serialization errors otherwise.
    pub async fn upsert_row(&self, entry: &ReminderEntry) -> Result<String> {
        let doc = ReminderDoc::new(&self.scope, entry);
        let document_id = doc.id.clone();
        trace!(owner = %entry.owner, reminder = %entry.name, etag = %entry.etag, "upserting reminder row");

        let mut unit = UnitOfWork::new();
        match self.store.load(&document_id).await? {
            None => {
                trace!(owner = %entry.owner, reminder = %entry.name, "reminder document not found; inserting");
                unit.insert(&document_id, json_bytes(&document_id, &doc)?);
            }
            Some(_) => {
                unit.update(
                    &document_id,
                    json_bytes(&document_id, &doc)?,
                    entry.etag.clone(),
                );
            }
        }

        match self.store.commit(unit).await? {
            CommitOutcome::Applied { versions } => {
                let etag = versions.get(&document_id).cloned().ok_or_else(|| {
                    Error::Internal {
                        message: format!("no version reported for {document_id}"),
                    }
                })?;
                trace!(owner = %entry.owner, reminder = %entry.name, %etag, "upserted reminder row");
                Ok(etag)
            }
            CommitOutcome::Conflict { id, kind } => {
                warn!(owner = %entry.owner, reminder = %entry.name, conflict = ?kind, "conflict upserting reminder row");
                Err(Error::conflict(id, "another writer changed the reminder"))
            }
        }
    }

    /// Removes one reminder, gated by its expected ETag.
    ///
    /// Returns `Ok(false)` — leaving the stored registration untouched —
    /// when the row is missing, the ETag does not match, or a concurrent
    /// writer replaces the row between the read and the delete.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn remove_row(
        &self,
        owner: &EntityId,
        reminder_name: &str,
        etag: &str,
    ) -> Result<bool> {
        let document_id =
            keys::reminder_doc_id(self.scope.service_id(), owner.as_str(), reminder_name);
        trace!(%owner, reminder = reminder_name, %etag, "removing reminder row");

        let Some(document) = self.store.load(&document_id).await? else {
            trace!(%owner, reminder = reminder_name, "reminder document not found removing row");
            return Ok(false);
        };
        if document.version != etag {
            trace!(
                %owner,
                reminder = reminder_name,
                expected = %etag,
                stored = %document.version,
                "etag mismatch removing reminder row"
            );
            return Ok(false);
        }

        let mut unit = UnitOfWork::new();
        unit.delete(&document_id, Some(document.version));

        match self.store.commit(unit).await? {
            CommitOutcome::Applied { .. } => {
                trace!(%owner, reminder = reminder_name, "removed reminder row");
                Ok(true)
            }
            CommitOutcome::Conflict { .. } => {
                trace!(%owner, reminder = reminder_name, "lost removal race");
                Ok(false)
            }
        }
    }

    /// Deletes every reminder stored for this service.
    ///
    /// Maintenance/testing operation. Scoped to the service identifier so a
    /// shared store never loses another tenant's registrations.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn clear_all(&self) -> Result<()> {
        warn!(service = self.scope.service_id(), "clearing reminder table");

        let prefix = keys::reminder_service_prefix(self.scope.service_id());
        let mut unit = UnitOfWork::new();
        for document in self.store.query(&prefix).await? {
            let doc: ReminderDoc = parse_body(&document)?;
            if doc.service_id == self.scope.service_id() {
                unit.delete(document.id, None);
            }
        }
        if unit.is_empty() {
            return Ok(());
        }

        match self.store.commit(unit).await? {
            CommitOutcome::Applied { .. } => Ok(()),
            CommitOutcome::Conflict { id, kind } => Err(Error::Internal {
                message: format!("unexpected {kind:?} conflict clearing {id}"),
            }),
        }
    }

    /// Loads and maps every reminder document of this service matching the
    /// given predicate.
    async fn service_docs<F>(&self, keep: F) -> Result<Vec<ReminderEntry>>
    where
        F: Fn(&ReminderDoc) -> bool,
    {
        let prefix = keys::reminder_service_prefix(self.scope.service_id());
        let mut rows = Vec::new();
        for document in self.store.query(&prefix).await? {
            let etag = document.version.clone();
            let doc: ReminderDoc = parse_body(&document)?;
            if doc.service_id == self.scope.service_id() && keep(&doc) {
                rows.push(doc.into_entry(etag));
            }
        }
        Ok(rows)
    }
}
