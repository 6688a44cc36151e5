//! The reconciliation puller.
//!
//! Pulls server-side deltas into the local store when the app comes back
//! online or the data is stale enough to matter. The server is
//! authoritative: pulled creates and updates overwrite local records.
//! Deletes are the one exception; the puller refuses to apply them, so a
//! record disappears locally only through an explicit local delete.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::http::HttpClient;
use crate::invalidate::{NoopInvalidator, ReadCacheInvalidator};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vetsync_protocol::{
    now_ms, HttpRequest, OperationKind, PullQuery, PullResponse, SyncState, TenantContext,
};
use vetsync_store::TenantStore;

const MS_PER_HOUR: u64 = 3_600_000;

/// The result of a [`pull_if_needed`] call.
///
/// [`pull_if_needed`]: ReconciliationPuller::pull_if_needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The gate decided a pull was unnecessary or unsafe.
    Skipped(SkipReason),
    /// A pull ran.
    Pulled {
        /// Changes applied to the local store.
        applied: usize,
        /// Server-reported deletes left unapplied.
        deletes_skipped: usize,
    },
}

/// Why a pull was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Unconfirmed local mutations are queued; pulling now could clobber
    /// optimistic writes before they are pushed.
    PendingLocalOps,
    /// Local data exists and the watermark is recent.
    FreshEnough,
}

/// Pulls and applies server-side changes for one tenant.
pub struct ReconciliationPuller<C: HttpClient> {
    config: EngineConfig,
    ctx: TenantContext,
    tenant: Arc<TenantStore>,
    client: Arc<C>,
    invalidator: Arc<dyn ReadCacheInvalidator>,
}

impl<C: HttpClient> ReconciliationPuller<C> {
    /// Creates a puller over one tenant's store.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        ctx: TenantContext,
        tenant: Arc<TenantStore>,
        client: Arc<C>,
    ) -> Self {
        Self {
            config,
            ctx,
            tenant,
            client,
            invalidator: Arc::new(NoopInvalidator),
        }
    }

    /// Wires in a read-cache invalidator.
    #[must_use]
    pub fn with_invalidator(mut self, invalidator: Arc<dyn ReadCacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    /// Pulls if the decision gate allows it.
    ///
    /// The gate, in order: pending local operations always skip; an empty
    /// store always pulls; a watermark older than the stale threshold
    /// always pulls; between the recent and stale thresholds a pull runs
    /// because the data is worth refreshing; under the recent threshold
    /// the pull is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull request or the store writes fail.
    pub fn pull_if_needed(&self) -> EngineResult<PullOutcome> {
        if self.tenant.pending_count() > 0 {
            debug!(
                tenant = %self.tenant.tenant_id(),
                "skipping pull, local operations pending"
            );
            return Ok(PullOutcome::Skipped(SkipReason::PendingLocalOps));
        }

        let has_local_data = self
            .config
            .tracked_types
            .iter()
            .any(|t| self.tenant.count(*t) > 0);
        if !has_local_data {
            debug!(tenant = %self.tenant.tenant_id(), "store empty, pulling");
            return self.pull_now();
        }

        let Some(watermark) = self.tenant.last_sync_timestamp() else {
            return self.pull_now();
        };

        let elapsed_ms = now_ms().saturating_sub(watermark);
        if elapsed_ms > self.config.stale_threshold_hours * MS_PER_HOUR {
            info!(
                tenant = %self.tenant.tenant_id(),
                elapsed_ms,
                "watermark past the stale threshold, pulling"
            );
            return self.pull_now();
        }
        if elapsed_ms <= self.config.recent_threshold_hours * MS_PER_HOUR {
            debug!(
                tenant = %self.tenant.tenant_id(),
                elapsed_ms,
                "skipping pull, data is fresh"
            );
            return Ok(PullOutcome::Skipped(SkipReason::FreshEnough));
        }

        self.pull_now()
    }

    /// Pulls unconditionally.
    ///
    /// Applies creates and updates as `synced` records, skips deletes, and
    /// advances the watermark to the pull's start time on success. The
    /// watermark is untouched if the request fails, so the next pull
    /// re-covers the same window.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, the server rejects the
    /// pull, the response is malformed, or a store write fails.
    pub fn pull_now(&self) -> EngineResult<PullOutcome> {
        let started_ms = now_ms();
        let query = PullQuery {
            last_sync_timestamp_ms: self.tenant.last_sync_timestamp().unwrap_or(0),
            practice_id: self.ctx.practice_id().to_string(),
            entity_types: self.config.tracked_types.clone(),
        };

        let request =
            HttpRequest::get(query.to_path()).with_timeout_ms(self.config.request_timeout_ms);
        let response = self.client.send(&request)?;
        if !response.is_success() {
            return Err(EngineError::PullRejected {
                status: response.status,
            });
        }
        let body: PullResponse = response.decode()?;

        let mut applied = 0;
        let mut deletes_skipped = 0;
        let mut touched = BTreeSet::new();

        for change in body.changes {
            match change.operation {
                OperationKind::Create | OperationKind::Update => {
                    let Some(data) = change.data else {
                        warn!(
                            entity_type = %change.entity_type,
                            id = %change.id,
                            "pulled change has no data, skipping"
                        );
                        continue;
                    };
                    self.tenant
                        .put(change.entity_type, &change.id, data, SyncState::Synced)?;
                    touched.insert(change.entity_type);
                    applied += 1;
                }
                OperationKind::Delete => {
                    // Server deletes are not applied locally; records only
                    // disappear through an explicit local delete.
                    deletes_skipped += 1;
                    warn!(
                        entity_type = %change.entity_type,
                        id = %change.id,
                        "ignoring server-side delete"
                    );
                }
            }
        }

        self.tenant.set_last_sync_timestamp(started_ms)?;

        let stale_paths: Vec<String> =
            touched.iter().map(|t| t.endpoint().to_string()).collect();
        if !stale_paths.is_empty() {
            self.invalidator.invalidate(&stale_paths);
        }

        info!(
            tenant = %self.tenant.tenant_id(),
            applied,
            deletes_skipped,
            "reconciliation pull finished"
        );
        Ok(PullOutcome::Pulled {
            applied,
            deletes_skipped,
        })
    }
}
