//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admins, auth, equipment, health, requests, stats, uploads};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DSFix API",
        version = "1.0.0",
        description = "Office equipment maintenance request REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Public requester flow
        equipment::search_equipment,
        equipment::get_equipment_by_code,
        requests::create_request,
        requests::get_confirmation,
        uploads::upload_photo,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::deactivate_equipment,
        equipment::get_qr_target,
        // Requests
        requests::list_requests,
        requests::get_request,
        requests::update_status,
        requests::assign_owner,
        // Admins
        admins::list_admins,
        admins::create_admin,
        admins::update_admin,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::admin::AdminSession,
            // Admins
            crate::models::admin::AdminIdentity,
            crate::models::admin::CreateAdmin,
            crate::models::admin::AdminPatch,
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentSummary,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::EquipmentPatch,
            crate::models::equipment::QrTarget,
            // Requests
            crate::models::enums::RequestStatus,
            crate::models::enums::Urgency,
            crate::models::request::MaintenanceRequest,
            crate::models::request::StatusHistoryEntry,
            crate::models::request::HistoryEntryView,
            crate::models::request::CreateRequest,
            crate::models::request::CreatedRequest,
            crate::models::request::RequestConfirmation,
            crate::models::request::RequestSummary,
            crate::models::request::RequestDetail,
            crate::models::request::UpdateStatus,
            crate::models::request::AssignOwner,
            // Uploads
            crate::services::uploads::StoredPhoto,
            // Stats
            crate::services::requests::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Admin authentication"),
        (name = "public", description = "Requester-facing endpoints, no login required"),
        (name = "equipment", description = "Equipment registry"),
        (name = "requests", description = "Maintenance request triage"),
        (name = "admins", description = "Admin directory"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
