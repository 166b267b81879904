//! Equipment model

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Upper-case letters, digits and hyphens
pub static EQUIPMENT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9-]+$").expect("valid equipment code pattern"));

/// Maximum number of rows returned by the public search
pub const SEARCH_LIMIT: usize = 10;

/// Minimum trimmed query length before a search hits the store
pub const SEARCH_MIN_CHARS: usize = 2;

/// Equipment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: Uuid,
    /// Human-readable business key printed on the QR label
    pub code: String,
    pub name: String,
    pub category: String,
    pub location: String,
    pub notes: Option<String>,
    /// Inactive equipment is hidden from requesters but kept for history
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Equipment fields embedded in request listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EquipmentSummary {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub location: String,
}

impl From<&Equipment> for EquipmentSummary {
    fn from(e: &Equipment) -> Self {
        Self {
            id: e.id,
            code: e.code.clone(),
            name: e.name.clone(),
            location: e.location.clone(),
        }
    }
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(
        length(min = 1, max = 20, message = "Code must be 1 to 20 characters"),
        regex(path = *EQUIPMENT_CODE_RE, message = "Code may only contain upper-case letters, digits and hyphens")
    )]
    pub code: String,
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 50, message = "Category must be 2 to 50 characters"))]
    pub category: String,
    #[validate(length(min = 2, max = 100, message = "Location must be 2 to 100 characters"))]
    pub location: String,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Partial update; each field is applied only when present
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EquipmentPatch {
    #[validate(
        length(min = 1, max = 20, message = "Code must be 1 to 20 characters"),
        regex(path = *EQUIPMENT_CODE_RE, message = "Code may only contain upper-case letters, digits and hyphens")
    )]
    pub code: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "Category must be 2 to 50 characters"))]
    pub category: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Location must be 2 to 100 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
    pub active: Option<bool>,
}

impl EquipmentPatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.notes.is_none()
            && self.active.is_none()
    }

    /// Apply present fields onto an in-memory record
    pub fn apply_to(&self, equipment: &mut Equipment, now: DateTime<Utc>) {
        if let Some(ref code) = self.code {
            equipment.code = code.clone();
        }
        if let Some(ref name) = self.name {
            equipment.name = name.clone();
        }
        if let Some(ref category) = self.category {
            equipment.category = category.clone();
        }
        if let Some(ref location) = self.location {
            equipment.location = location.clone();
        }
        if let Some(ref notes) = self.notes {
            equipment.notes = Some(notes.clone());
        }
        if let Some(active) = self.active {
            equipment.active = active;
        }
        equipment.updated_at = now;
    }
}

/// Registry listing parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EquipmentQuery {
    /// Include deactivated equipment
    pub include_inactive: Option<bool>,
}

/// Public search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EquipmentSearchQuery {
    pub q: Option<String>,
}

/// Target encoded into an equipment QR label
#[derive(Debug, Serialize, ToSchema)]
pub struct QrTarget {
    pub code: String,
    pub url: String,
}
