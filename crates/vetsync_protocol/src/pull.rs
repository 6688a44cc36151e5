//! Reconciliation pull wire format.
//!
//! The puller issues a single GET for all tracked entity types:
//!
//! ```text
//! GET /sync/pull?lastSyncTimestamp=<ms>&practiceId=<id>&entityTypes=<csv>
//! ```
//!
//! and receives `{ "changes": [ { entityType, id, operation, data } ] }`.

use crate::entity::EntityType;
use crate::operation::OperationKind;
use serde::{Deserialize, Serialize};

/// The query parameters of a reconciliation pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullQuery {
    /// The current watermark in milliseconds since epoch.
    pub last_sync_timestamp_ms: u64,
    /// The practice the pull is scoped to.
    pub practice_id: String,
    /// The entity types to pull changes for.
    pub entity_types: Vec<EntityType>,
}

impl PullQuery {
    /// Renders the request path with query string.
    #[must_use]
    pub fn to_path(&self) -> String {
        let types = self
            .entity_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "/sync/pull?lastSyncTimestamp={}&practiceId={}&entityTypes={}",
            self.last_sync_timestamp_ms, self.practice_id, types
        )
    }
}

/// One server-side change reported by the pull endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// The entity type the change applies to.
    #[serde(rename = "entityType")]
    pub entity_type: EntityType,
    /// The changed entity's identifier.
    pub id: String,
    /// The kind of change.
    pub operation: OperationKind,
    /// The entity payload; absent for deletes.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// The body of a pull response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    /// Changes newer than the requested watermark.
    pub changes: Vec<ChangeEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_renders_csv_entity_types() {
        let query = PullQuery {
            last_sync_timestamp_ms: 1_700_000_000_000,
            practice_id: "practice-1".into(),
            entity_types: vec![EntityType::Appointments, EntityType::SoapNotes],
        };
        assert_eq!(
            query.to_path(),
            "/sync/pull?lastSyncTimestamp=1700000000000&practiceId=practice-1&entityTypes=appointments,soapNotes"
        );
    }

    #[test]
    fn response_parses_wire_shape() {
        let body = json!({
            "changes": [
                { "entityType": "pets", "id": "p1", "operation": "update",
                  "data": { "name": "Biscuit" } },
                { "entityType": "rooms", "id": "r2", "operation": "delete" }
            ]
        });
        let response: PullResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.changes.len(), 2);
        assert_eq!(response.changes[0].entity_type, EntityType::Pets);
        assert_eq!(response.changes[1].operation, OperationKind::Delete);
        assert!(response.changes[1].data.is_none());
    }
}
