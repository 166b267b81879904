//! Admin directory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::admin::{AdminIdentity, AdminPatch, CreateAdmin},
    AppState,
};

use super::AuthenticatedAdmin;

/// Active admins, selectable as request owners
#[utoipa::path(
    get,
    path = "/admins",
    tag = "admins",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active admins", body = Vec<AdminIdentity>)
    )
)]
pub async fn list_admins(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
) -> AppResult<Json<Vec<AdminIdentity>>> {
    let admins = state.services.admins.list().await?;
    Ok(Json(admins))
}

/// Register a new admin
#[utoipa::path(
    post,
    path = "/admins",
    tag = "admins",
    security(("bearer_auth" = [])),
    request_body = CreateAdmin,
    responses(
        (status = 201, description = "Admin created", body = AdminIdentity),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Json(data): Json<CreateAdmin>,
) -> AppResult<(StatusCode, Json<AdminIdentity>)> {
    let admin = state.services.admins.create(&data).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Update an admin's name, password or active flag
#[utoipa::path(
    put,
    path = "/admins/{id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Admin ID")),
    request_body = AdminPatch,
    responses(
        (status = 200, description = "Admin updated", body = AdminIdentity),
        (status = 404, description = "Admin not found")
    )
)]
pub async fn update_admin(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<AdminPatch>,
) -> AppResult<Json<AdminIdentity>> {
    let admin = state.services.admins.update(id, &patch).await?;
    Ok(Json(admin))
}
