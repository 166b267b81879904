//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, services::requests::DashboardStats, AppState};

use super::AuthenticatedAdmin;

/// Request counts per status and active equipment count
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedAdmin(_session): AuthenticatedAdmin,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.requests.dashboard().await?;
    Ok(Json(stats))
}
