//! The membership ledger.
//!
//! Membership-changing writes touch two documents — the member record and
//! the tenant's cluster-version record — and must land together. The
//! backing store offers only per-document compare-and-swap, so both writes
//! are staged in one unit of work: a stale expected version on either
//! aborts the whole unit, and the conflict names the losing document.
//!
//! Lost races come back as `Ok(false)`; only unexpected store failures
//! propagate as errors. The caller owns retries and the revision number.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{trace, warn};

use berth_core::document::{CommitOutcome, ConflictKind, DocumentStore, UnitOfWork};
use berth_core::error::{Error, Result};
use berth_core::keys;
use berth_core::scope::ClusterScope;

use crate::docs::{json_bytes, parse_body, ClusterVersionDoc, MembershipDoc, HEARTBEAT_POINTER};
use crate::types::{MembershipEntry, MembershipRow, MembershipSnapshot, SiloAddress, TableVersion};

/// Membership table provider backed by a shared document store.
///
/// Stateless: every operation is an independent round trip, safe to issue
/// from many processes concurrently. Cloning is cheap and shares the store.
#[derive(Clone)]
pub struct MembershipLedger {
    store: Arc<dyn DocumentStore>,
    scope: ClusterScope,
}

impl MembershipLedger {
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

    /// One-time setup hook from the runtime contract.
    ///
    /// Not used by this provider: documents are created on first write.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches the runtime contract.
    #[allow(clippy::unused_async)]
    pub async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Loads one member by silo address, together with the cluster version.
    ///
    /// A missing member yields an empty snapshot, not an error; a missing
    /// cluster-version document yields the synthetic revision 0.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn read_row(&self, silo: &SiloAddress) -> Result<MembershipSnapshot> {
        let member_id = keys::member_doc_id(&self.scope, silo.as_str());
        trace!(scope = %self.scope, %silo, "reading membership row");

        let mut rows = Vec::new();
        match self.store.load(&member_id).await? {
            None => {
                trace!(scope = %self.scope, %silo, "membership document not found");
            }
            Some(document) => {
                let doc: MembershipDoc = parse_body(&document)?;
                rows.push(MembershipRow {
                    entry: doc.entry,
                    etag: document.version,
                });
            }
        }

        let version = self.table_version().await?;
        Ok(MembershipSnapshot { rows, version })
    }

    /// Loads every member of the tenant, together with the cluster version.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn read_all(&self) -> Result<MembershipSnapshot> {
        trace!(scope = %self.scope, "reading all membership rows");

        let rows = self
            .tenant_member_docs()
            .await?
            .into_iter()
            .map(|(doc, etag)| MembershipRow {
                entry: doc.entry,
                etag,
            })
            .collect();

        let version = self.table_version().await?;
        Ok(MembershipSnapshot { rows, version })
    }

    /// Inserts a brand-new member row and advances the cluster version, as
    /// one atomic unit.
    ///
    /// The cluster-version document is created with the caller-supplied
    /// revision if absent, otherwise updated gated by the ETag inside
    /// `table_version`. The member row is a strict insert — a pre-existing
    /// row means another writer won and yields `Ok(false)`, as does a stale
    /// cluster-version ETag.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure; lost races are
    /// `Ok(false)`, never errors.
    pub async fn insert_row(
        &self,
        entry: &MembershipEntry,
        table_version: &TableVersion,
    ) -> Result<bool> {
        let version_id = keys::cluster_version_doc_id(&self.scope);
        let member_id = keys::member_doc_id(&self.scope, entry.silo_address.as_str());
        trace!(
            scope = %self.scope,
            silo = %entry.silo_address,
            revision = table_version.revision,
            table_etag = %table_version.etag,
            "inserting membership row"
        );

        let version_doc = ClusterVersionDoc::new(&self.scope, table_version.revision);
        let mut unit = UnitOfWork::new();
        match self.store.load(&version_id).await? {
            None => {
                trace!(scope = %self.scope, "cluster version document not found; creating");
                unit.insert(&version_id, json_bytes(&version_id, &version_doc)?);
            }
            Some(_) => {
                unit.update(
                    &version_id,
                    json_bytes(&version_id, &version_doc)?,
                    table_version.etag.clone(),
                );
            }
        }

        let member_doc = MembershipDoc::new(&self.scope, entry.clone());
        unit.insert(&member_id, json_bytes(&member_id, &member_doc)?);

        match self.store.commit(unit).await? {
            CommitOutcome::Applied { .. } => {
                trace!(scope = %self.scope, silo = %entry.silo_address, "inserted membership row");
                Ok(true)
            }
            CommitOutcome::Conflict { id, kind } => {
                if id == member_id {
                    warn!(
                        scope = %self.scope,
                        silo = %entry.silo_address,
                        "membership row already exists; another writer won the insert"
                    );
                } else {
                    warn!(
                        scope = %self.scope,
                        silo = %entry.silo_address,
                        table_etag = %table_version.etag,
                        conflict = ?kind,
                        "cluster version conflict inserting membership row"
                    );
                }
                Ok(false)
            }
        }
    }

    /// Replaces an existing member row and advances the cluster version, as
    /// one atomic unit gated by both expected ETags.
    ///
    /// Both documents must already exist; a missing document or a stale
    /// ETag on either yields `Ok(false)`. Which document lost the race is
    /// reported through distinct warn events so table-version races can be
    /// told apart from member races.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn update_row(
        &self,
        entry: &MembershipEntry,
        etag: &str,
        table_version: &TableVersion,
    ) -> Result<bool> {
        let version_id = keys::cluster_version_doc_id(&self.scope);
        let member_id = keys::member_doc_id(&self.scope, entry.silo_address.as_str());
        trace!(
            scope = %self.scope,
            silo = %entry.silo_address,
            %etag,
            revision = table_version.revision,
            table_etag = %table_version.etag,
            "updating membership row"
        );

        if self.store.load(&version_id).await?.is_none() {
            warn!(
                scope = %self.scope,
                silo = %entry.silo_address,
                "cluster version document not found updating membership row"
            );
            return Ok(false);
        }
        if self.store.load(&member_id).await?.is_none() {
            warn!(
                scope = %self.scope,
                silo = %entry.silo_address,
                "membership document not found updating membership row"
            );
            return Ok(false);
        }

        let version_doc = ClusterVersionDoc::new(&self.scope, table_version.revision);
        let member_doc = MembershipDoc::new(&self.scope, entry.clone());

        let mut unit = UnitOfWork::new();
        unit.update(
            &version_id,
            json_bytes(&version_id, &version_doc)?,
            table_version.etag.clone(),
        );
        unit.update(&member_id, json_bytes(&member_id, &member_doc)?, etag);

        match self.store.commit(unit).await? {
            CommitOutcome::Applied { .. } => {
                trace!(scope = %self.scope, silo = %entry.silo_address, "updated membership row");
                Ok(true)
            }
            CommitOutcome::Conflict { id, .. } => {
                if id == version_id {
                    warn!(
                        scope = %self.scope,
                        silo = %entry.silo_address,
                        table_etag = %table_version.etag,
                        "cluster version etag mismatch updating membership row"
                    );
                } else {
                    warn!(
                        scope = %self.scope,
                        silo = %entry.silo_address,
                        %etag,
                        "member etag mismatch updating membership row"
                    );
                }
                Ok(false)
            }
        }
    }

    /// Patches only the heartbeat field of a member row.
    ///
    /// Deliberately bypasses the version-token protocol: heartbeats are
    /// advisory and must never fail or block on a concurrent structural
    /// update. The flip side is that a structural update racing this patch
    /// can overwrite the heartbeat it just wrote — an accepted loss, since
    /// the field is diagnostics-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the member row does not exist or the store
    /// fails; there is no competing-writer case to arbitrate, so there is
    /// no `false` path.
    pub async fn update_heartbeat(&self, entry: &MembershipEntry) -> Result<()> {
        let member_id = keys::member_doc_id(&self.scope, entry.silo_address.as_str());
        trace!(
            scope = %self.scope,
            silo = %entry.silo_address,
            alive = %entry.i_am_alive_time,
            "updating heartbeat"
        );

        let mut unit = UnitOfWork::new();
        unit.patch(
            &member_id,
            HEARTBEAT_POINTER,
            serde_json::to_value(entry.i_am_alive_time)
                .map_err(|e| Error::serialization(&member_id, e))?,
        );

        match self.store.commit(unit).await? {
            CommitOutcome::Applied { .. } => {
                trace!(scope = %self.scope, silo = %entry.silo_address, "updated heartbeat");
                Ok(())
            }
            CommitOutcome::Conflict {
                kind: ConflictKind::Missing,
                ..
            } => Err(Error::NotFound {
                document: member_id,
            }),
            CommitOutcome::Conflict { id, kind } => Err(Error::Internal {
                message: format!("unexpected {kind:?} conflict patching {id}"),
            }),
        }
    }

    /// Bulk-deletes every member row of `(service, cluster_id)`.
    ///
    /// Used when decommissioning a cluster generation; the cluster id is a
    /// parameter because decommissioning may target a generation other than
    /// the one this ledger serves. The cluster-version document is left in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn delete_cluster_entries(&self, cluster_id: &str) -> Result<()> {
        trace!(service = self.scope.service_id(), cluster = cluster_id, "deleting membership rows");

        let prefix = keys::member_service_prefix(self.scope.service_id());
        let mut unit = UnitOfWork::new();
        for document in self.store.query(&prefix).await? {
            let doc: MembershipDoc = parse_body(&document)?;
            if doc.service_id == self.scope.service_id() && doc.cluster_id == cluster_id {
                unit.delete(document.id, None);
            }
        }

        let deleted = unit.len();
        self.apply_bulk(unit).await?;
        trace!(service = self.scope.service_id(), cluster = cluster_id, deleted, "deleted membership rows");
        Ok(())
    }

    /// Bulk-deletes tenant members whose heartbeat is at or before `before`.
    ///
    /// Reclaims rows for silos gone long enough that their liveness record
    /// is no longer meaningful. Members of other tenants are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error on store or serialization failure.
    pub async fn purge_dead(&self, before: DateTime<Utc>) -> Result<()> {
        trace!(scope = %self.scope, %before, "purging defunct membership rows");

        let mut unit = UnitOfWork::new();
        for (doc, _) in self.tenant_member_docs().await? {
            if doc.entry.i_am_alive_time <= before {
                unit.delete(doc.id, None);
            }
        }

        let purged = unit.len();
        self.apply_bulk(unit).await?;
        trace!(scope = %self.scope, %before, purged, "purged defunct membership rows");
        Ok(())
    }

    /// Loads and parses every member document of this tenant.
    async fn tenant_member_docs(&self) -> Result<Vec<(MembershipDoc, String)>> {
        let prefix = keys::member_service_prefix(self.scope.service_id());
        let mut docs = Vec::new();
        for document in self.store.query(&prefix).await? {
            let etag = document.version.clone();
            let doc: MembershipDoc = parse_body(&document)?;
            if doc.service_id == self.scope.service_id()
                && doc.cluster_id == self.scope.cluster_id()
            {
                docs.push((doc, etag));
            }
        }
        Ok(docs)
    }

    /// Reads the tenant's cluster version, defaulting to revision 0.
    async fn table_version(&self) -> Result<TableVersion> {
        let version_id = keys::cluster_version_doc_id(&self.scope);
        match self.store.load(&version_id).await? {
            None => {
                trace!(scope = %self.scope, "cluster version document not found reading version");
                Ok(TableVersion::absent())
            }
            Some(document) => {
                let doc: ClusterVersionDoc = parse_body(&document)?;
                Ok(TableVersion {
                    revision: doc.revision,
                    etag: document.version,
                })
            }
        }
    }

    /// Commits a bulk unit of unconditional deletes.
    async fn apply_bulk(&self, unit: UnitOfWork) -> Result<()> {
        if unit.is_empty() {
            return Ok(());
        }
        match self.store.commit(unit).await? {
            CommitOutcome::Applied { .. } => Ok(()),
            CommitOutcome::Conflict { id, kind } => Err(Error::Internal {
                message: format!("unexpected {kind:?} conflict on bulk delete of {id}"),
            }),
        }
    }
}
