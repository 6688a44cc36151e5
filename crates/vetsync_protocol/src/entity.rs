//! Tracked entity types and their REST endpoint table.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};

/// A domain entity type tracked by the offline engine.
///
/// The catalogue is closed: every tracked type is an enum variant, so the
/// endpoint table, the pull protocol, and the reconciliation loop are all
/// checked at compile time when a type is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Scheduled appointments.
    #[serde(rename = "appointments")]
    Appointments,
    /// Patient animals.
    #[serde(rename = "pets")]
    Pets,
    /// Pet owners.
    #[serde(rename = "clients")]
    Clients,
    /// Veterinarians and technicians.
    #[serde(rename = "practitioners")]
    Practitioners,
    /// Clinical SOAP notes.
    #[serde(rename = "soapNotes")]
    SoapNotes,
    /// Reusable SOAP note templates.
    #[serde(rename = "soapTemplates")]
    SoapTemplates,
    /// Exam and treatment rooms.
    #[serde(rename = "rooms")]
    Rooms,
    /// Hospital admissions.
    #[serde(rename = "admissions")]
    Admissions,
    /// Administered vaccinations.
    #[serde(rename = "vaccinations")]
    Vaccinations,
    /// Vaccine catalogue entries.
    #[serde(rename = "vaccine_types")]
    VaccineTypes,
    /// Boarding kennels.
    #[serde(rename = "kennels")]
    Kennels,
    /// Boarding stays.
    #[serde(rename = "boarding_stays")]
    BoardingStays,
}

impl EntityType {
    /// All tracked entity types, in pull-protocol order.
    pub const ALL: [EntityType; 12] = [
        EntityType::Appointments,
        EntityType::Pets,
        EntityType::Clients,
        EntityType::Practitioners,
        EntityType::SoapNotes,
        EntityType::SoapTemplates,
        EntityType::Rooms,
        EntityType::Admissions,
        EntityType::Vaccinations,
        EntityType::VaccineTypes,
        EntityType::Kennels,
        EntityType::BoardingStays,
    ];

    /// Returns the wire name used in the pull protocol and store records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityType::Appointments => "appointments",
            EntityType::Pets => "pets",
            EntityType::Clients => "clients",
            EntityType::Practitioners => "practitioners",
            EntityType::SoapNotes => "soapNotes",
            EntityType::SoapTemplates => "soapTemplates",
            EntityType::Rooms => "rooms",
            EntityType::Admissions => "admissions",
            EntityType::Vaccinations => "vaccinations",
            EntityType::VaccineTypes => "vaccine_types",
            EntityType::Kennels => "kennels",
            EntityType::BoardingStays => "boarding_stays",
        }
    }

    /// Parses a wire name back into an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownEntityType`] for names outside the
    /// tracked catalogue.
    pub fn parse(name: &str) -> ProtocolResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| ProtocolError::UnknownEntityType(name.to_string()))
    }

    /// Returns the REST collection endpoint for this entity type.
    ///
    /// The queue manager issues POST here for creates, and PATCH/DELETE
    /// against `{endpoint}/{id}` for updates and deletes.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            EntityType::Appointments => "/api/appointments",
            EntityType::Pets => "/api/pets",
            EntityType::Clients => "/api/clients",
            EntityType::Practitioners => "/api/practitioners",
            EntityType::SoapNotes => "/api/soap-notes",
            EntityType::SoapTemplates => "/api/soap-templates",
            EntityType::Rooms => "/api/rooms",
            EntityType::Admissions => "/api/admissions",
            EntityType::Vaccinations => "/api/vaccinations",
            EntityType::VaccineTypes => "/api/vaccine-types",
            EntityType::Kennels => "/api/kennels",
            EntityType::BoardingStays => "/api/boarding-stays",
        }
    }

    /// Returns the detail endpoint for one entity of this type.
    #[must_use]
    pub fn detail_path(self, entity_id: &str) -> String {
        format!("{}/{}", self.endpoint(), entity_id)
    }

    /// Returns the cached read paths a mutation against this entity
    /// invalidates.
    ///
    /// Always the collection list and the entity's detail view. A SOAP note
    /// carrying an `appointmentId` additionally invalidates its parent
    /// appointment's detail view, since the note is embedded there.
    #[must_use]
    pub fn related_read_paths(
        self,
        entity_id: &str,
        payload: Option<&serde_json::Value>,
    ) -> Vec<String> {
        let mut paths = vec![self.endpoint().to_string(), self.detail_path(entity_id)];

        if self == EntityType::SoapNotes {
            if let Some(appointment_id) = payload
                .and_then(|p| p.get("appointmentId"))
                .and_then(|v| v.as_str())
            {
                paths.push(EntityType::Appointments.detail_path(appointment_id));
            }
        }

        paths
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_roundtrip() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::parse(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            EntityType::parse("invoices"),
            Err(ProtocolError::UnknownEntityType(_))
        ));
    }

    #[test]
    fn endpoints_are_kebab_case() {
        assert_eq!(EntityType::SoapNotes.endpoint(), "/api/soap-notes");
        assert_eq!(EntityType::VaccineTypes.endpoint(), "/api/vaccine-types");
        assert_eq!(
            EntityType::BoardingStays.detail_path("bs-9"),
            "/api/boarding-stays/bs-9"
        );
    }

    #[test]
    fn related_paths_cover_list_and_detail() {
        let paths = EntityType::Pets.related_read_paths("p1", None);
        assert_eq!(paths, vec!["/api/pets", "/api/pets/p1"]);
    }

    #[test]
    fn soap_note_invalidates_parent_appointment() {
        let payload = json!({ "appointmentId": "a7", "subjective": "..." });
        let paths = EntityType::SoapNotes.related_read_paths("n1", Some(&payload));
        assert_eq!(
            paths,
            vec![
                "/api/soap-notes",
                "/api/soap-notes/n1",
                "/api/appointments/a7"
            ]
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&EntityType::SoapNotes).unwrap();
        assert_eq!(json, "\"soapNotes\"");
        let back: EntityType = serde_json::from_str("\"vaccine_types\"").unwrap();
        assert_eq!(back, EntityType::VaccineTypes);
    }
}
