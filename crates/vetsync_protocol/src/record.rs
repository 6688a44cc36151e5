//! Cached entity records.

use crate::entity::EntityType;
use serde::{Deserialize, Serialize};

/// The synchronization state of a locally stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    /// The record matches the last server-confirmed value.
    Synced,
    /// The record carries a local edit not yet confirmed by the server.
    Dirty,
    /// The record is deleted locally, pending server confirmation.
    PendingDelete,
}

/// A cached snapshot of one domain object.
///
/// Records are keyed by `(tenant, entity_type, id)`; the tenant component
/// is the store namespace itself, never a field to filter on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The entity type this record belongs to.
    pub entity_type: EntityType,
    /// The server-assigned identifier.
    pub id: String,
    /// The full entity payload as received or edited.
    pub data: serde_json::Value,
    /// The record's synchronization state.
    pub sync_state: SyncState,
    /// Milliseconds since epoch of the last local write.
    pub updated_at_ms: u64,
}

impl EntityRecord {
    /// Creates a new record stamped with the current wall-clock time.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        id: impl Into<String>,
        data: serde_json::Value,
        sync_state: SyncState,
    ) -> Self {
        Self {
            entity_type,
            id: id.into(),
            data,
            sync_state,
            updated_at_ms: crate::time::now_ms(),
        }
    }
}
