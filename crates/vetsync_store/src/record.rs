//! Store log record types and serialization.
//!
//! Each record is one committed change to a tenant's state. Payloads are
//! CBOR inside the framed envelope provided by `vetsync_storage`.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vetsync_protocol::{EntityType, OperationStatus, SyncOperation, SyncState};

/// A record in a tenant's store log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreRecord {
    /// An entity record was written (insert or update).
    PutEntity {
        /// The entity type.
        entity_type: EntityType,
        /// The entity identifier.
        id: String,
        /// The entity payload.
        data: serde_json::Value,
        /// The record's sync state at write time.
        sync_state: SyncState,
        /// Milliseconds since epoch of the write.
        updated_at_ms: u64,
    },

    /// An entity record was deleted.
    DeleteEntity {
        /// The entity type.
        entity_type: EntityType,
        /// The entity identifier.
        id: String,
    },

    /// A mutation was enqueued.
    ///
    /// During compaction the operation is re-written with its current
    /// terminal status, so the full history survives a log rewrite.
    Enqueue {
        /// The queued operation.
        op: SyncOperation,
    },

    /// A queued operation reached a terminal status.
    OperationStatus {
        /// The operation id.
        id: Uuid,
        /// The terminal status (`Completed` or `Failed`).
        status: OperationStatus,
        /// Total attempts made so far.
        attempts: u32,
        /// The error message for failures.
        last_error: Option<String>,
    },

    /// The sync watermark advanced.
    Watermark {
        /// The new watermark in milliseconds since epoch.
        timestamp_ms: u64,
    },
}

impl StoreRecord {
    /// Returns the log envelope kind byte for this record.
    #[must_use]
    pub fn kind(&self) -> u8 {
        match self {
            StoreRecord::PutEntity { .. } => 1,
            StoreRecord::DeleteEntity { .. } => 2,
            StoreRecord::Enqueue { .. } => 3,
            StoreRecord::OperationStatus { .. } => 4,
            StoreRecord::Watermark { .. } => 5,
        }
    }

    /// Serializes the record payload as CBOR.
    ///
    /// # Errors
    ///
    /// Returns a codec error if serialization fails.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(StoreError::codec)?;
        Ok(buf)
    }

    /// Deserializes a record payload from CBOR.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the payload is not a valid record.
    pub fn decode(payload: &[u8]) -> StoreResult<Self> {
        ciborium::from_reader(payload).map_err(StoreError::codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vetsync_protocol::OperationKind;

    #[test]
    fn put_entity_roundtrips() {
        let record = StoreRecord::PutEntity {
            entity_type: EntityType::Appointments,
            id: "a1".into(),
            data: json!({ "petId": "p1", "start": "2026-08-21T09:00:00Z" }),
            sync_state: SyncState::Dirty,
            updated_at_ms: 1_700_000_000_000,
        };
        let encoded = record.encode().unwrap();
        assert_eq!(StoreRecord::decode(&encoded).unwrap(), record);
    }

    #[test]
    fn enqueue_roundtrips() {
        let op = SyncOperation::new(
            EntityType::SoapNotes,
            "n1",
            OperationKind::Update,
            Some(json!({ "appointmentId": "a1" })),
        );
        let record = StoreRecord::Enqueue { op: op.clone() };
        let encoded = record.encode().unwrap();
        match StoreRecord::decode(&encoded).unwrap() {
            StoreRecord::Enqueue { op: decoded } => assert_eq!(decoded, op),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn kind_bytes_are_distinct() {
        let records = [
            StoreRecord::PutEntity {
                entity_type: EntityType::Pets,
                id: "p".into(),
                data: json!({}),
                sync_state: SyncState::Synced,
                updated_at_ms: 0,
            },
            StoreRecord::DeleteEntity {
                entity_type: EntityType::Pets,
                id: "p".into(),
            },
            StoreRecord::Enqueue {
                op: SyncOperation::new(EntityType::Pets, "p", OperationKind::Delete, None),
            },
            StoreRecord::OperationStatus {
                id: Uuid::new_v4(),
                status: OperationStatus::Completed,
                attempts: 1,
                last_error: None,
            },
            StoreRecord::Watermark { timestamp_ms: 1 },
        ];

        let mut kinds: Vec<u8> = records.iter().map(StoreRecord::kind).collect();
        kinds.dedup();
        assert_eq!(kinds.len(), records.len());
    }
}
