//! Equipment API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::equipment::{
        CreateEquipment, Equipment, EquipmentPatch, EquipmentQuery, EquipmentSearchQuery, QrTarget,
    },
    AppState,
};

use super::AuthenticatedAdmin;

/// List registered equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(EquipmentQuery),
    responses(
        (status = 200, description = "Equipment list", body = Vec<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<Vec<Equipment>>> {
    let equipment = state
        .services
        .equipment
        .list(query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(equipment))
}

/// Get equipment by ID
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get_by_id(id).await?;
    Ok(Json(equipment))
}

/// Register equipment
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Code already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    let equipment = state.services.equipment.create(&data).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Update equipment; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Equipment ID")),
    request_body = EquipmentPatch,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 404, description = "Equipment not found"),
        (status = 409, description = "Code already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(patch): Json<EquipmentPatch>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.update(id, &patch).await?;
    Ok(Json(equipment))
}

/// Deactivate equipment
#[utoipa::path(
    post,
    path = "/equipment/{id}/deactivate",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment deactivated", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn deactivate_equipment(
    State(state): State<AppState>,
    AuthenticatedAdmin(session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.deactivate(id).await?;
    tracing::debug!(admin_id = %session.admin_id, equipment_id = %id, "Deactivation requested");
    Ok(Json(equipment))
}

/// URL to encode in the equipment's QR label
#[utoipa::path(
    get,
    path = "/equipment/{id}/qrcode",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "QR target", body = QrTarget),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_qr_target(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QrTarget>> {
    let target = state.services.equipment.qr_target(id).await?;
    Ok(Json(target))
}

/// Search active equipment by code, name, category or location
#[utoipa::path(
    get,
    path = "/public/equipment/search",
    tag = "public",
    params(EquipmentSearchQuery),
    responses(
        (status = 200, description = "Matching equipment, at most 10", body = Vec<Equipment>)
    )
)]
pub async fn search_equipment(
    State(state): State<AppState>,
    Query(query): Query<EquipmentSearchQuery>,
) -> AppResult<Json<Vec<Equipment>>> {
    let results = state
        .services
        .equipment
        .search(query.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(results))
}

/// Resolve a scanned equipment code
#[utoipa::path(
    get,
    path = "/public/equipment/{code}",
    tag = "public",
    params(("code" = String, Path, description = "Equipment code, e.g. EQ001")),
    responses(
        (status = 200, description = "Active equipment", body = Equipment),
        (status = 404, description = "Unknown or inactive code", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get_by_code(&code).await?;
    Ok(Json(equipment))
}
