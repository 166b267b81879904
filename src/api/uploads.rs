//! Photo upload endpoint

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::{multipart::MultipartError, Multipart};

use crate::{
    error::{AppError, AppResult},
    services::uploads::{PhotoStorage, StoredPhoto},
    AppState,
};

/// Body-limit failures report the photo size cap
fn upload_error(err: MultipartError, storage: &PhotoStorage) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        storage.too_large()
    } else {
        AppError::Validation(format!("Invalid upload: {}", err))
    }
}

/// Upload a photo to attach to a request (multipart field `file`)
#[utoipa::path(
    post,
    path = "/public/uploads/photo",
    tag = "public",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 201, description = "Photo stored", body = StoredPhoto),
        (status = 400, description = "Missing file, unsupported type or too large", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<StoredPhoto>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, &state.services.uploads))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("photo").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, &state.services.uploads))?;

        let stored = state
            .services
            .uploads
            .store(&file_name, content_type.as_deref(), &data)
            .await?;
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(AppError::Validation("No file provided".to_string()))
}
