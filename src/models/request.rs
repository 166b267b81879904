//! Maintenance request and status history models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    admin::AdminIdentity,
    enums::{RequestStatus, Urgency},
    equipment::{Equipment, EquipmentSummary},
};

/// Note attached to the seed history entry
pub const CREATION_NOTE: &str = "Request created";

/// Maintenance request record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceRequest {
    pub id: Uuid,
    /// Human-readable number, e.g. REQ-LZ3K9F2AQ7XM
    pub number: String,
    pub equipment_id: Uuid,
    pub requester_name: String,
    pub requester_department: String,
    pub description: String,
    pub urgency: Urgency,
    pub status: RequestStatus,
    /// Admin currently responsible for the request
    pub owner_id: Option<Uuid>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set while the request is DONE
    pub completed_at: Option<DateTime<Utc>>,
}

/// Immutable audit record of one status transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub request_id: Uuid,
    /// None only for the entry written at creation
    pub previous_status: Option<RequestStatus>,
    pub new_status: RequestStatus,
    pub changed_by: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// History entry resolved with the acting admin's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntryView {
    #[serde(flatten)]
    pub entry: StatusHistoryEntry,
    pub changed_by_name: Option<String>,
}

/// Create request payload (public form)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRequest {
    pub equipment_id: Uuid,
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub requester_name: String,
    #[validate(length(min = 2, max = 50, message = "Department must be 2 to 50 characters"))]
    pub requester_department: String,
    #[validate(length(min = 10, max = 1000, message = "Description must be 10 to 1000 characters"))]
    pub description: String,
    pub urgency: Urgency,
    #[validate(
        url(message = "Invalid photo URL"),
        length(max = 500, message = "Photo URL must be at most 500 characters")
    )]
    pub photo_url: Option<String>,
}

impl CreateRequest {
    /// Trim text fields and treat an empty photo URL as absent.
    /// Run before `validate` so padding cannot satisfy the length rules.
    pub fn normalized(mut self) -> Self {
        self.requester_name = self.requester_name.trim().to_string();
        self.requester_department = self.requester_department.trim().to_string();
        self.description = self.description.trim().to_string();
        self.photo_url = self
            .photo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self
    }
}

/// Row written by the store: request plus its seed history entry
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub number: String,
    pub equipment_id: Uuid,
    pub requester_name: String,
    pub requester_department: String,
    pub description: String,
    pub urgency: Urgency,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Status change payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStatus {
    pub status: RequestStatus,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Status change handed to the store. The store stamps it once the
/// request row is locked.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub to: RequestStatus,
    pub actor: Option<Uuid>,
    pub note: Option<String>,
}

/// Result of a status change
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Status was already the requested one; nothing written
    Unchanged(MaintenanceRequest),
    Applied {
        request: MaintenanceRequest,
        entry: StatusHistoryEntry,
    },
}

impl TransitionOutcome {
    pub fn into_request(self) -> MaintenanceRequest {
        match self {
            TransitionOutcome::Unchanged(request) => request,
            TransitionOutcome::Applied { request, .. } => request,
        }
    }
}

/// Owner assignment payload; `null` clears the owner
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignOwner {
    pub owner_id: Option<Uuid>,
}

/// Request listing filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
    pub urgency: Option<Urgency>,
    /// Case-insensitive match on requester name or request number
    pub search: Option<String>,
}

impl RequestQuery {
    /// Trimmed, non-empty search term
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Request listing row with equipment and owner resolved
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RequestSummary {
    #[serde(flatten)]
    pub request: MaintenanceRequest,
    pub equipment: EquipmentSummary,
    pub owner: Option<AdminIdentity>,
}

/// Full request view for the admin detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: MaintenanceRequest,
    pub equipment: Equipment,
    pub owner: Option<AdminIdentity>,
    /// Newest first
    pub history: Vec<HistoryEntryView>,
}

/// Public confirmation view shown after submitting a request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestConfirmation {
    pub id: Uuid,
    pub number: String,
    pub status: RequestStatus,
    pub urgency: Urgency,
    pub created_at: DateTime<Utc>,
    pub equipment: EquipmentSummary,
}

/// Identifiers returned to the requester after creation
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedRequest {
    pub id: Uuid,
    pub number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CreateRequest {
        CreateRequest {
            equipment_id: Uuid::new_v4(),
            requester_name: "Alice".into(),
            requester_department: "Sales".into(),
            description: "Not heating water properly".into(),
            urgency: Urgency::High,
            photo_url: None,
        }
    }

    #[test]
    fn test_description_bounds() {
        let mut data = valid();
        data.description = "too short".into();
        assert!(data.validate().unwrap_err().field_errors().contains_key("description"));

        data.description = "x".repeat(1001);
        assert!(data.validate().is_err());

        data.description = "x".repeat(1000);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_photo_url_must_be_well_formed() {
        let mut data = valid();
        data.photo_url = Some("not a url".into());
        assert!(data.validate().unwrap_err().field_errors().contains_key("photo_url"));

        data.photo_url = Some("https://cdn.dsfix.com/maintenance/1-photo.jpg".into());
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_empty_photo_url_is_dropped() {
        let mut data = valid();
        data.photo_url = Some("  ".into());
        let data = data.normalized();
        assert_eq!(data.photo_url, None);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_unknown_urgency_is_rejected_at_parse() {
        let body = serde_json::json!({
            "equipment_id": Uuid::new_v4(),
            "requester_name": "Alice",
            "requester_department": "Sales",
            "description": "Not heating water properly",
            "urgency": "URGENT",
        });
        assert!(serde_json::from_value::<CreateRequest>(body).is_err());
    }

    #[test]
    fn test_normalized_trims_before_length_rules() {
        let mut data = valid();
        data.requester_name = "  A ".into();
        data.requester_department = " Sales ".into();
        let data = data.normalized();
        assert_eq!(data.requester_department, "Sales");
        assert!(data.validate().unwrap_err().field_errors().contains_key("requester_name"));
    }

    #[test]
    fn test_search_term_trims() {
        let query = RequestQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(query.search_term(), None);
    }
}
