//! Maintenance request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::request::{
        AssignOwner, CreateRequest, CreatedRequest, MaintenanceRequest, RequestConfirmation,
        RequestDetail, RequestQuery, RequestSummary, UpdateStatus,
    },
    AppState,
};

use super::AuthenticatedAdmin;

/// File a maintenance request
#[utoipa::path(
    post,
    path = "/public/requests",
    tag = "public",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = CreatedRequest),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Equipment not found or inactive", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    Json(data): Json<CreateRequest>,
) -> AppResult<(StatusCode, Json<CreatedRequest>)> {
    let created = state.services.requests.create(data).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Confirmation shown to the requester
#[utoipa::path(
    get,
    path = "/public/requests/{id}",
    tag = "public",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request confirmation", body = RequestConfirmation),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_confirmation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RequestConfirmation>> {
    let confirmation = state.services.requests.get_confirmation(id).await?;
    Ok(Json(confirmation))
}

/// List requests, newest first
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests", body = Vec<RequestSummary>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<RequestSummary>>> {
    let requests = state.services.requests.list(&query).await?;
    Ok(Json(requests))
}

/// Request details with its status history
#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = RequestDetail),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RequestDetail>> {
    let detail = state.services.requests.get_detail(id).await?;
    Ok(Json(detail))
}

/// Change a request's status
#[utoipa::path(
    put,
    path = "/requests/{id}/status",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = UpdateStatus,
    responses(
        (status = 200, description = "Status updated", body = MaintenanceRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    AuthenticatedAdmin(session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateStatus>,
) -> AppResult<Json<MaintenanceRequest>> {
    let request = state
        .services
        .requests
        .transition_status(id, &data, Some(session.admin_id))
        .await?;
    Ok(Json(request))
}

/// Set or clear the admin responsible for a request
#[utoipa::path(
    put,
    path = "/requests/{id}/owner",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = AssignOwner,
    responses(
        (status = 200, description = "Owner updated", body = MaintenanceRequest),
        (status = 404, description = "Request or admin not found")
    )
)]
pub async fn assign_owner(
    State(state): State<AppState>,
    AuthenticatedAdmin(session): AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(data): Json<AssignOwner>,
) -> AppResult<Json<MaintenanceRequest>> {
    let request = state
        .services
        .requests
        .assign_owner(id, data.owner_id, Some(session.admin_id))
        .await?;
    Ok(Json(request))
}
