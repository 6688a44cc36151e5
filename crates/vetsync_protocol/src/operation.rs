//! Queued mutations.

use crate::entity::EntityType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of mutation a queued operation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Create a new entity (POST to the collection endpoint).
    Create,
    /// Update an existing entity (PATCH to the detail endpoint).
    Update,
    /// Delete an entity (DELETE to the detail endpoint).
    Delete,
}

/// The lifecycle status of a queued operation.
///
/// Persisted transitions are one-directional: `Pending` moves to
/// `Completed` or `Failed` and never back. `InFlight` is the in-memory
/// claim state taken by a drain pass; it is never written to the log, so a
/// restart demotes claimed operations back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    /// Recorded, not yet replayed against the server.
    Pending,
    /// Claimed by an active drain pass (in-memory only).
    InFlight,
    /// Confirmed by the server with a 2xx response.
    Completed,
    /// Rejected or errored; retained with the error message.
    Failed,
}

/// A queued mutation not yet confirmed by the server.
///
/// Operations are created by the write path while offline (or on a failed
/// write), mutated only by the queue manager, and retained after completion
/// as a historical record - never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    /// Unique operation identifier.
    pub id: Uuid,
    /// The entity type the mutation targets.
    pub entity_type: EntityType,
    /// The targeted entity's identifier.
    pub entity_id: String,
    /// The kind of mutation.
    pub kind: OperationKind,
    /// The mutation body; `None` for deletes.
    pub payload: Option<serde_json::Value>,
    /// Milliseconds since epoch when the operation was recorded.
    pub enqueued_at_ms: u64,
    /// Current lifecycle status.
    pub status: OperationStatus,
    /// Number of replay attempts made.
    pub attempts: u32,
    /// The last error message, if any attempt failed.
    pub last_error: Option<String>,
}

impl SyncOperation {
    /// Creates a new pending operation with a fresh id.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        kind: OperationKind,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type,
            entity_id: entity_id.into(),
            kind,
            payload,
            enqueued_at_ms: crate::time::now_ms(),
            status: OperationStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    /// Returns true if the operation is awaiting replay.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_operation_is_pending() {
        let op = SyncOperation::new(
            EntityType::Appointments,
            "a1",
            OperationKind::Create,
            Some(json!({ "petId": "p1" })),
        );
        assert!(op.is_pending());
        assert_eq!(op.attempts, 0);
        assert!(op.last_error.is_none());
    }

    #[test]
    fn distinct_operations_get_distinct_ids() {
        let a = SyncOperation::new(EntityType::Pets, "p1", OperationKind::Delete, None);
        let b = SyncOperation::new(EntityType::Pets, "p1", OperationKind::Delete, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OperationStatus::InFlight).unwrap(),
            "\"in-flight\""
        );
        assert_eq!(
            serde_json::to_string(&OperationKind::Update).unwrap(),
            "\"update\""
        );
    }
}
