//! Per-tenant store state and log.

use crate::dir;
use crate::error::{StoreError, StoreResult};
use crate::record::StoreRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;
use vetsync_protocol::{
    now_ms, EntityRecord, EntityType, OperationStatus, SyncOperation, SyncState,
};
use vetsync_storage::{FileBackend, FramedLog, InMemoryBackend, StorageBackend};

/// One tenant's durable namespace: entity records, the mutation queue, and
/// the sync watermark.
///
/// A `TenantStore` is obtained only through
/// [`LocalStore::tenant`](crate::LocalStore::tenant); it owns its own log
/// file and in-memory state, so nothing it exposes can read another
/// tenant's data.
///
/// # Concurrency
///
/// All methods take `&self`; the in-memory state and the log are guarded by
/// internal locks. Each committed record is one atomic transaction scope.
pub struct TenantStore {
    tenant_id: String,
    sync_on_commit: bool,
    /// `None` for in-memory stores; set for on-disk stores so compaction
    /// can rewrite the log in place.
    log_path: Option<PathBuf>,
    log: Mutex<FramedLog>,
    state: Mutex<TenantState>,
}

#[derive(Default)]
struct TenantState {
    /// Entity records per type, in insertion order. `put` for an existing
    /// id replaces in place, preserving the original position.
    records: HashMap<EntityType, Vec<EntityRecord>>,
    /// Full operation history in enqueue order; never truncated.
    operations: Vec<SyncOperation>,
    /// The sync watermark, if a pull has ever completed.
    watermark: Option<u64>,
}

impl TenantState {
    fn apply(&mut self, record: StoreRecord) {
        match record {
            StoreRecord::PutEntity {
                entity_type,
                id,
                data,
                sync_state,
                updated_at_ms,
            } => {
                let record = EntityRecord {
                    entity_type,
                    id,
                    data,
                    sync_state,
                    updated_at_ms,
                };
                self.upsert(record);
            }
            StoreRecord::DeleteEntity { entity_type, id } => {
                if let Some(records) = self.records.get_mut(&entity_type) {
                    records.retain(|r| r.id != id);
                }
            }
            StoreRecord::Enqueue { mut op } => {
                // InFlight is never persisted; demote defensively anyway
                if op.status == OperationStatus::InFlight {
                    op.status = OperationStatus::Pending;
                }
                self.operations.push(op);
            }
            StoreRecord::OperationStatus {
                id,
                status,
                attempts,
                last_error,
            } => {
                if let Some(op) = self.operations.iter_mut().find(|op| op.id == id) {
                    op.status = status;
                    op.attempts = attempts;
                    op.last_error = last_error;
                } else {
                    warn!(%id, "status record for unknown operation, skipping");
                }
            }
            StoreRecord::Watermark { timestamp_ms } => {
                let current = self.watermark.unwrap_or(0);
                self.watermark = Some(current.max(timestamp_ms));
            }
        }
    }

    fn upsert(&mut self, record: EntityRecord) {
        let records = self.records.entry(record.entity_type).or_default();
        if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
        } else {
            records.push(record);
        }
    }
}

impl TenantStore {
    /// Opens a tenant store over the given backend, replaying its log.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a mid-log checksum mismatch. A
    /// torn tail record is tolerated as end-of-log.
    pub(crate) fn open(
        tenant_id: impl Into<String>,
        backend: Box<dyn StorageBackend>,
        log_path: Option<PathBuf>,
        sync_on_commit: bool,
    ) -> StoreResult<Self> {
        let log = FramedLog::new(backend, false);
        let mut state = TenantState::default();

        for item in log.iter()? {
            let (_, _, payload) = item?;
            state.apply(StoreRecord::decode(&payload)?);
        }

        Ok(Self {
            tenant_id: tenant_id.into(),
            sync_on_commit,
            log_path,
            log: Mutex::new(log),
            state: Mutex::new(state),
        })
    }

    /// Returns the tenant this store is scoped to.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn commit(&self, record: &StoreRecord) -> StoreResult<()> {
        let log = self.log.lock();
        log.append(record.kind(), &record.encode()?)?;
        if self.sync_on_commit {
            log.sync()?;
        }
        Ok(())
    }

    // ---- Record API -------------------------------------------------

    /// Returns the record with the given id, if present.
    #[must_use]
    pub fn get(&self, entity_type: EntityType, id: &str) -> Option<EntityRecord> {
        self.state
            .lock()
            .records
            .get(&entity_type)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
    }

    /// Returns all records of the given type, in insertion order.
    #[must_use]
    pub fn get_all(&self, entity_type: EntityType) -> Vec<EntityRecord> {
        self.state
            .lock()
            .records
            .get(&entity_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of records of the given type.
    #[must_use]
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.state
            .lock()
            .records
            .get(&entity_type)
            .map_or(0, Vec::len)
    }

    /// Writes (inserts or updates) an entity record.
    ///
    /// An update keeps the record's original position in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails.
    pub fn put(
        &self,
        entity_type: EntityType,
        id: impl Into<String>,
        data: serde_json::Value,
        sync_state: SyncState,
    ) -> StoreResult<()> {
        let record = EntityRecord {
            entity_type,
            id: id.into(),
            data,
            sync_state,
            updated_at_ms: now_ms(),
        };

        self.commit(&StoreRecord::PutEntity {
            entity_type: record.entity_type,
            id: record.id.clone(),
            data: record.data.clone(),
            sync_state: record.sync_state,
            updated_at_ms: record.updated_at_ms,
        })?;

        self.state.lock().upsert(record);
        Ok(())
    }

    /// Deletes an entity record.
    ///
    /// Returns `true` if a record was removed. A miss is not logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails.
    pub fn delete(&self, entity_type: EntityType, id: &str) -> StoreResult<bool> {
        let exists = self
            .state
            .lock()
            .records
            .get(&entity_type)
            .is_some_and(|records| records.iter().any(|r| r.id == id));

        if !exists {
            return Ok(false);
        }

        self.commit(&StoreRecord::DeleteEntity {
            entity_type,
            id: id.to_string(),
        })?;

        if let Some(records) = self.state.lock().records.get_mut(&entity_type) {
            records.retain(|r| r.id != id);
        }
        Ok(true)
    }

    // ---- Queue API --------------------------------------------------

    /// Appends a mutation to the queue.
    ///
    /// This is a local-only durable write and always succeeds barring I/O
    /// failure; deduplicating semantically equivalent actions is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails.
    pub fn enqueue(&self, op: SyncOperation) -> StoreResult<Uuid> {
        let id = op.id;
        self.commit(&StoreRecord::Enqueue { op: op.clone() })?;
        self.state.lock().operations.push(op);
        Ok(id)
    }

    /// Returns pending operations in enqueue (FIFO) order.
    #[must_use]
    pub fn pending_operations(&self) -> Vec<SyncOperation> {
        self.state
            .lock()
            .operations
            .iter()
            .filter(|op| op.status == OperationStatus::Pending)
            .cloned()
            .collect()
    }

    /// Returns the number of pending operations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state
            .lock()
            .operations
            .iter()
            .filter(|op| op.status == OperationStatus::Pending)
            .count()
    }

    /// Returns the full operation history, including completed and failed
    /// operations.
    #[must_use]
    pub fn operations(&self) -> Vec<SyncOperation> {
        self.state.lock().operations.clone()
    }

    /// Atomically claims a pending operation for replay.
    ///
    /// Returns `true` if the claim succeeded (`Pending → InFlight`). The
    /// claim is in-memory only: a restart demotes claimed operations back
    /// to pending, which is what makes a mid-drain crash recoverable.
    #[must_use]
    pub fn claim(&self, id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.operations.iter_mut().find(|op| op.id == id) {
            Some(op) if op.status == OperationStatus::Pending => {
                op.status = OperationStatus::InFlight;
                true
            }
            _ => false,
        }
    }

    /// Releases a claimed operation back to pending.
    ///
    /// Used when a drain halts (connectivity lost, auth expired) before the
    /// claimed operation got a server verdict.
    pub fn release(&self, id: Uuid) {
        let mut state = self.state.lock();
        if let Some(op) = state.operations.iter_mut().find(|op| op.id == id) {
            if op.status == OperationStatus::InFlight {
                op.status = OperationStatus::Pending;
            }
        }
    }

    /// Marks an operation completed after a 2xx server response.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownOperation`] for an unknown id, or
    /// [`StoreError::InvalidTransition`] if the operation is already
    /// terminal.
    pub fn mark_completed(&self, id: Uuid) -> StoreResult<()> {
        self.finish(id, OperationStatus::Completed, None)
    }

    /// Marks an operation failed with the given error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownOperation`] for an unknown id, or
    /// [`StoreError::InvalidTransition`] if the operation is already
    /// terminal.
    pub fn mark_failed(&self, id: Uuid, error: impl Into<String>) -> StoreResult<()> {
        self.finish(id, OperationStatus::Failed, Some(error.into()))
    }

    fn finish(
        &self,
        id: Uuid,
        status: OperationStatus,
        last_error: Option<String>,
    ) -> StoreResult<()> {
        let attempts = {
            let mut state = self.state.lock();
            let op = state
                .operations
                .iter_mut()
                .find(|op| op.id == id)
                .ok_or(StoreError::UnknownOperation(id))?;

            if matches!(
                op.status,
                OperationStatus::Completed | OperationStatus::Failed
            ) {
                return Err(StoreError::InvalidTransition {
                    id,
                    status: op.status,
                });
            }

            op.attempts += 1;
            op.status = status;
            op.last_error = last_error.clone();
            op.attempts
        };

        self.commit(&StoreRecord::OperationStatus {
            id,
            status,
            attempts,
            last_error,
        })
    }

    // ---- Metadata API -----------------------------------------------

    /// Returns the sync watermark, if a pull has ever completed.
    #[must_use]
    pub fn last_sync_timestamp(&self) -> Option<u64> {
        self.state.lock().watermark
    }

    /// Advances the sync watermark.
    ///
    /// The watermark is monotonically non-decreasing: a timestamp that is
    /// not strictly greater than the stored value is ignored with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails.
    pub fn set_last_sync_timestamp(&self, timestamp_ms: u64) -> StoreResult<()> {
        {
            let state = self.state.lock();
            if let Some(current) = state.watermark {
                if timestamp_ms <= current {
                    warn!(
                        tenant = %self.tenant_id,
                        current, proposed = timestamp_ms,
                        "ignoring non-monotonic watermark"
                    );
                    return Ok(());
                }
            }
        }

        self.commit(&StoreRecord::Watermark { timestamp_ms })?;
        self.state.lock().watermark = Some(timestamp_ms);
        Ok(())
    }

    // ---- Maintenance ------------------------------------------------

    /// Rewrites the log, keeping current records, the full operation
    /// history, and the watermark. Returns the number of bytes reclaimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite or the atomic swap fails.
    pub fn compact(&self) -> StoreResult<u64> {
        let state = self.state.lock();
        let mut log = self.log.lock();
        let old_size = log.size()?;

        let mut snapshot = Vec::new();
        for entity_type in EntityType::ALL {
            if let Some(records) = state.records.get(&entity_type) {
                for record in records {
                    snapshot.push(StoreRecord::PutEntity {
                        entity_type: record.entity_type,
                        id: record.id.clone(),
                        data: record.data.clone(),
                        sync_state: record.sync_state,
                        updated_at_ms: record.updated_at_ms,
                    });
                }
            }
        }
        for op in &state.operations {
            let mut op = op.clone();
            if op.status == OperationStatus::InFlight {
                op.status = OperationStatus::Pending;
            }
            snapshot.push(StoreRecord::Enqueue { op });
        }
        if let Some(timestamp_ms) = state.watermark {
            snapshot.push(StoreRecord::Watermark { timestamp_ms });
        }

        let new_log = match &self.log_path {
            Some(path) => {
                let tmp = path.with_extension("log.tmp");
                // A stale tmp file from an interrupted compaction is discarded
                let _ = fs::remove_file(&tmp);

                let tmp_log = FramedLog::new(Box::new(FileBackend::open(&tmp)?), false);
                for record in &snapshot {
                    tmp_log.append(record.kind(), &record.encode()?)?;
                }
                tmp_log.sync()?;
                drop(tmp_log);

                fs::rename(&tmp, path)?;
                if let Some(parent) = path.parent() {
                    dir::sync_directory(parent)?;
                }

                FramedLog::new(Box::new(FileBackend::open(path)?), false)
            }
            None => {
                let mem_log = FramedLog::new(Box::new(InMemoryBackend::new()), false);
                for record in &snapshot {
                    mem_log.append(record.kind(), &record.encode()?)?;
                }
                mem_log
            }
        };

        let new_size = new_log.size()?;
        *log = new_log;
        Ok(old_size.saturating_sub(new_size))
    }
}

impl std::fmt::Debug for TenantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantStore")
            .field("tenant_id", &self.tenant_id)
            .field("sync_on_commit", &self.sync_on_commit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vetsync_protocol::OperationKind;

    fn memory_tenant() -> TenantStore {
        TenantStore::open("t1", Box::new(InMemoryBackend::new()), None, false).unwrap()
    }

    #[test]
    fn put_get_and_get_all() {
        let store = memory_tenant();
        store
            .put(EntityType::Pets, "p1", json!({ "name": "Biscuit" }), SyncState::Synced)
            .unwrap();
        store
            .put(EntityType::Pets, "p2", json!({ "name": "Mochi" }), SyncState::Dirty)
            .unwrap();

        let record = store.get(EntityType::Pets, "p1").unwrap();
        assert_eq!(record.data["name"], "Biscuit");
        assert_eq!(record.sync_state, SyncState::Synced);

        let all = store.get_all(EntityType::Pets);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "p1");
        assert_eq!(all[1].id, "p2");
        assert_eq!(store.count(EntityType::Pets), 2);
        assert_eq!(store.count(EntityType::Rooms), 0);
    }

    #[test]
    fn put_existing_id_keeps_position() {
        let store = memory_tenant();
        for id in ["p1", "p2", "p3"] {
            store
                .put(EntityType::Pets, id, json!({}), SyncState::Synced)
                .unwrap();
        }
        store
            .put(EntityType::Pets, "p1", json!({ "v": 2 }), SyncState::Dirty)
            .unwrap();

        let all = store.get_all(EntityType::Pets);
        assert_eq!(all[0].id, "p1");
        assert_eq!(all[0].data["v"], 2);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn delete_removes_record() {
        let store = memory_tenant();
        store
            .put(EntityType::Rooms, "r1", json!({}), SyncState::Synced)
            .unwrap();

        assert!(store.delete(EntityType::Rooms, "r1").unwrap());
        assert!(store.get(EntityType::Rooms, "r1").is_none());
        assert!(!store.delete(EntityType::Rooms, "r1").unwrap());
    }

    #[test]
    fn enqueue_and_pending_order() {
        let store = memory_tenant();
        let a = store
            .enqueue(SyncOperation::new(
                EntityType::Pets,
                "p1",
                OperationKind::Create,
                Some(json!({})),
            ))
            .unwrap();
        let b = store
            .enqueue(SyncOperation::new(
                EntityType::Pets,
                "p2",
                OperationKind::Create,
                Some(json!({})),
            ))
            .unwrap();

        let pending = store.pending_operations();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, a);
        assert_eq!(pending[1].id, b);
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn claim_is_exclusive() {
        let store = memory_tenant();
        let id = store
            .enqueue(SyncOperation::new(
                EntityType::Pets,
                "p1",
                OperationKind::Delete,
                None,
            ))
            .unwrap();

        assert!(store.claim(id));
        assert!(!store.claim(id));

        store.release(id);
        assert!(store.claim(id));
    }

    #[test]
    fn completed_operations_are_retained() {
        let store = memory_tenant();
        let id = store
            .enqueue(SyncOperation::new(
                EntityType::Pets,
                "p1",
                OperationKind::Create,
                Some(json!({})),
            ))
            .unwrap();

        assert!(store.claim(id));
        store.mark_completed(id).unwrap();

        assert_eq!(store.pending_count(), 0);
        let history = store.operations();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, OperationStatus::Completed);
        assert_eq!(history[0].attempts, 1);
    }

    #[test]
    fn terminal_status_is_one_directional() {
        let store = memory_tenant();
        let id = store
            .enqueue(SyncOperation::new(
                EntityType::Pets,
                "p1",
                OperationKind::Delete,
                None,
            ))
            .unwrap();

        store.mark_failed(id, "server said no").unwrap();
        let result = store.mark_completed(id);
        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));

        let op = &store.operations()[0];
        assert_eq!(op.status, OperationStatus::Failed);
        assert_eq!(op.last_error.as_deref(), Some("server said no"));
    }

    #[test]
    fn unknown_operation_is_an_error() {
        let store = memory_tenant();
        let result = store.mark_completed(Uuid::new_v4());
        assert!(matches!(result, Err(StoreError::UnknownOperation(_))));
    }

    #[test]
    fn watermark_is_monotonic() {
        let store = memory_tenant();
        assert!(store.last_sync_timestamp().is_none());

        store.set_last_sync_timestamp(1_000).unwrap();
        assert_eq!(store.last_sync_timestamp(), Some(1_000));

        // Non-monotonic set is ignored
        store.set_last_sync_timestamp(900).unwrap();
        assert_eq!(store.last_sync_timestamp(), Some(1_000));

        store.set_last_sync_timestamp(1_000).unwrap();
        assert_eq!(store.last_sync_timestamp(), Some(1_000));

        store.set_last_sync_timestamp(2_000).unwrap();
        assert_eq!(store.last_sync_timestamp(), Some(2_000));
    }

    #[test]
    fn compact_preserves_state_and_reclaims_space() {
        let store = memory_tenant();
        // Write the same record many times so the log carries dead weight
        for i in 0..50 {
            store
                .put(EntityType::Pets, "p1", json!({ "v": i }), SyncState::Synced)
                .unwrap();
        }
        let id = store
            .enqueue(SyncOperation::new(
                EntityType::Pets,
                "p1",
                OperationKind::Update,
                Some(json!({ "v": 49 })),
            ))
            .unwrap();
        store.mark_completed(id).unwrap();
        store.set_last_sync_timestamp(1_234).unwrap();

        let reclaimed = store.compact().unwrap();
        assert!(reclaimed > 0);

        assert_eq!(store.get(EntityType::Pets, "p1").unwrap().data["v"], 49);
        assert_eq!(store.operations().len(), 1);
        assert_eq!(store.operations()[0].status, OperationStatus::Completed);
        assert_eq!(store.last_sync_timestamp(), Some(1_234));
    }
}
