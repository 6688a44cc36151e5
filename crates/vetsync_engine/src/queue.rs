//! The sync queue manager.
//!
//! Mutations made while disconnected are recorded as durable
//! [`SyncOperation`]s and an optimistic local write, then replayed against
//! the server in creation order when [`SyncQueueManager::drain`] runs.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::http::HttpClient;
use crate::invalidate::{NoopInvalidator, ReadCacheInvalidator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vetsync_protocol::{
    EntityType, HttpRequest, OperationKind, SyncOperation, SyncState,
};
use vetsync_store::TenantStore;

/// The result of a [`drain`] call.
///
/// [`drain`]: SyncQueueManager::drain
#[derive(Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// A pass ran to completion (or to a halt condition).
    Completed(DrainReport),
    /// Another drain pass was already running; nothing was dispatched.
    AlreadyDraining,
}

/// What a drain pass accomplished.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations dispatched to the server.
    pub attempted: usize,
    /// Operations confirmed by the server.
    pub completed: usize,
    /// Operations rejected by the server.
    pub failed: usize,
    /// Why the pass stopped early, if it did.
    pub halted: Option<DrainHalt>,
}

/// Conditions that stop a drain pass mid-queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainHalt {
    /// The transport failed; the interrupted operation and everything
    /// behind it stay pending.
    Offline,
    /// The server returned 401; re-authentication is required before
    /// anything else can succeed.
    AuthExpired,
}

/// Records offline mutations and replays them in order.
///
/// One instance per tenant. `drain` is safe to trigger from multiple
/// places (connectivity listener, timer, manual retry): a reentrancy
/// guard collapses concurrent triggers into one pass, and each operation
/// is claimed before dispatch so it can never be sent twice.
pub struct SyncQueueManager<C: HttpClient> {
    config: EngineConfig,
    tenant: Arc<TenantStore>,
    client: Arc<C>,
    invalidator: Arc<dyn ReadCacheInvalidator>,
    draining: AtomicBool,
}

impl<C: HttpClient> SyncQueueManager<C> {
    /// Creates a queue manager over one tenant's store.
    #[must_use]
    pub fn new(config: EngineConfig, tenant: Arc<TenantStore>, client: Arc<C>) -> Self {
        Self {
            config,
            tenant,
            client,
            invalidator: Arc::new(NoopInvalidator),
            draining: AtomicBool::new(false),
        }
    }

    /// Wires in a read-cache invalidator.
    #[must_use]
    pub fn with_invalidator(mut self, invalidator: Arc<dyn ReadCacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    /// Records a mutation for later replay and applies it locally.
    ///
    /// Creates and updates write the payload to the store as `dirty`;
    /// deletes flip the record to `pending-delete` so it stays visible
    /// until the server confirms. The operation itself is durable before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn enqueue(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        kind: OperationKind,
        payload: Option<serde_json::Value>,
    ) -> EngineResult<Uuid> {
        let op = SyncOperation::new(entity_type, entity_id, kind, payload.clone());
        let id = self.tenant.enqueue(op)?;

        match kind {
            OperationKind::Create | OperationKind::Update => {
                if let Some(data) = payload {
                    self.tenant
                        .put(entity_type, entity_id, data, SyncState::Dirty)?;
                }
            }
            OperationKind::Delete => {
                if let Some(record) = self.tenant.get(entity_type, entity_id) {
                    self.tenant.put(
                        entity_type,
                        entity_id,
                        record.data,
                        SyncState::PendingDelete,
                    )?;
                }
            }
        }

        debug!(%id, entity_type = %entity_type, ?kind, "queued offline mutation");
        Ok(id)
    }

    /// Replays all pending operations against the server, oldest first.
    ///
    /// A transport that reports itself unhealthy halts the pass before
    /// anything is dispatched. Server rejections fail the one operation
    /// and the pass continues; a 401 or a transport failure halts the
    /// pass (see [`DrainHalt`]). Operations interrupted by a transport
    /// failure are released back to pending untouched.
    ///
    /// # Errors
    ///
    /// Returns an error only if recording an outcome in the store fails;
    /// network and server failures are reported in the [`DrainReport`].
    pub fn drain(&self) -> EngineResult<DrainOutcome> {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(tenant = %self.tenant.tenant_id(), "drain already in progress");
            return Ok(DrainOutcome::AlreadyDraining);
        }
        let _guard = DrainGuard(&self.draining);

        let pending = self.tenant.pending_operations();
        if pending.is_empty() {
            return Ok(DrainOutcome::Completed(DrainReport::default()));
        }

        if !self.client.is_healthy() {
            debug!(
                tenant = %self.tenant.tenant_id(),
                "transport reports unhealthy, deferring drain"
            );
            return Ok(DrainOutcome::Completed(DrainReport {
                halted: Some(DrainHalt::Offline),
                ..DrainReport::default()
            }));
        }

        info!(
            tenant = %self.tenant.tenant_id(),
            pending = pending.len(),
            "draining sync queue"
        );

        let mut report = DrainReport::default();
        for op in pending {
            // Lost the claim to a concurrent resolver; skip, don't halt.
            if !self.tenant.claim(op.id) {
                continue;
            }

            let request = match self.build_request(&op) {
                Some(request) => request,
                None => {
                    self.tenant
                        .mark_failed(op.id, "operation has no payload")?;
                    report.failed += 1;
                    continue;
                }
            };

            report.attempted += 1;
            match self.client.send(&request) {
                Ok(response) if response.is_success() => {
                    self.tenant.mark_completed(op.id)?;
                    self.apply_confirmed(&op)?;
                    self.invalidator
                        .invalidate(&op.entity_type.related_read_paths(
                            &op.entity_id,
                            op.payload.as_ref(),
                        ));
                    report.completed += 1;
                }
                Ok(response) if response.status == 401 => {
                    self.tenant
                        .mark_failed(op.id, format!("server returned {}", response.status))?;
                    report.failed += 1;
                    report.halted = Some(DrainHalt::AuthExpired);
                    warn!(op = %op.id, "session expired, halting drain");
                    break;
                }
                Ok(response) => {
                    self.tenant
                        .mark_failed(op.id, format!("server returned {}", response.status))?;
                    report.failed += 1;
                    warn!(
                        op = %op.id,
                        status = response.status,
                        "server rejected operation, continuing"
                    );
                }
                Err(err) => {
                    self.tenant.release(op.id);
                    report.attempted -= 1;
                    report.halted = Some(DrainHalt::Offline);
                    warn!(op = %op.id, error = %err, "transport failed, halting drain");
                    break;
                }
            }
        }

        info!(
            tenant = %self.tenant.tenant_id(),
            completed = report.completed,
            failed = report.failed,
            halted = ?report.halted,
            "drain pass finished"
        );
        Ok(DrainOutcome::Completed(report))
    }

    fn build_request(&self, op: &SyncOperation) -> Option<HttpRequest> {
        let request = match op.kind {
            OperationKind::Create => {
                HttpRequest::post(op.entity_type.endpoint(), op.payload.clone()?)
            }
            OperationKind::Update => {
                HttpRequest::patch(op.entity_type.detail_path(&op.entity_id), op.payload.clone()?)
            }
            OperationKind::Delete => {
                HttpRequest::delete(op.entity_type.detail_path(&op.entity_id))
            }
        };
        Some(request.with_timeout_ms(self.config.request_timeout_ms))
    }

    /// Settles the local record once the server has confirmed the push.
    fn apply_confirmed(&self, op: &SyncOperation) -> EngineResult<()> {
        match op.kind {
            OperationKind::Create | OperationKind::Update => {
                if let Some(record) = self.tenant.get(op.entity_type, &op.entity_id) {
                    if record.sync_state == SyncState::Dirty {
                        self.tenant.put(
                            op.entity_type,
                            &op.entity_id,
                            record.data,
                            SyncState::Synced,
                        )?;
                    }
                }
            }
            OperationKind::Delete => {
                self.tenant.delete(op.entity_type, &op.entity_id)?;
            }
        }
        Ok(())
    }
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
