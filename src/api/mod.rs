//! API handlers for DSFix REST endpoints

pub mod admins;
pub mod auth;
pub mod equipment;
pub mod health;
pub mod openapi;
pub mod requests;
pub mod stats;
pub mod uploads;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{error::AppError, models::admin::AdminSession, AppState};

/// Multipart framing allowance on top of the photo size cap
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Extractor for the admin behind a Bearer token
pub struct AuthenticatedAdmin(pub AdminSession);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Authentication("Missing or invalid authorization header".to_string()))?;

        let session = state.services.admins.resolve_session(bearer.token()).await?;
        Ok(AuthenticatedAdmin(session))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.services.uploads.max_bytes() + MULTIPART_OVERHEAD;
    let uploads_dir = ServeDir::new(state.services.uploads.root());

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Public requester flow
        .route("/public/equipment/search", get(equipment::search_equipment))
        .route("/public/equipment/:code", get(equipment::get_equipment_by_code))
        .route("/public/requests", post(requests::create_request))
        .route("/public/requests/:id", get(requests::get_confirmation))
        .route(
            "/public/uploads/photo",
            post(uploads::upload_photo).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Equipment registry
        .route("/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route("/equipment/:id", get(equipment::get_equipment).put(equipment::update_equipment))
        .route("/equipment/:id/deactivate", post(equipment::deactivate_equipment))
        .route("/equipment/:id/qrcode", get(equipment::get_qr_target))
        // Requests
        .route("/requests", get(requests::list_requests))
        .route("/requests/:id", get(requests::get_request))
        .route("/requests/:id/status", put(requests::update_status))
        .route("/requests/:id/owner", put(requests::assign_owner))
        // Admin directory
        .route("/admins", get(admins::list_admins).post(admins::create_admin))
        .route("/admins/:id", put(admins::update_admin))
        // Dashboard
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .nest_service("/uploads", uploads_dir)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
