//! Photo storage for request attachments
//!
//! Files land under `{uploads.dir}/maintenance/` and are served back by the
//! router's static `/uploads` mount.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::UploadsConfig,
    error::{AppError, AppResult},
};

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

const PHOTO_FOLDER: &str = "maintenance";

/// Stored photo location returned to the requester form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredPhoto {
    pub url: String,
    pub file_name: String,
    pub size: usize,
}

/// Replace everything outside `[a-zA-Z0-9.-]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "photo".to_string()
    } else {
        cleaned
    }
}

#[derive(Clone)]
pub struct PhotoStorage {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl PhotoStorage {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject unsupported types, empty files and files over the size cap
    pub fn validate(&self, content_type: Option<&str>, size: usize) -> AppResult<()> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported file type '{}'; use JPEG, PNG or WebP",
                content_type
            )));
        }
        if size == 0 {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(self.too_large());
        }
        Ok(())
    }

    /// Error for a photo over the size cap
    pub fn too_large(&self) -> AppError {
        let max_mb = (self.max_bytes as f64 / (1024.0 * 1024.0)).ceil() as usize;
        AppError::Validation(format!("File is too large; the maximum is {} MB", max_mb))
    }

    /// Validate and write a photo, returning its public URL
    pub async fn store(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> AppResult<StoredPhoto> {
        self.validate(content_type, data.len())?;

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(original_name)
        );
        let dir = self.root.join(PHOTO_FOLDER);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;
        tokio::fs::write(dir.join(&file_name), data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store photo: {}", e)))?;

        tracing::info!(file = %file_name, size = data.len(), "Photo stored");

        Ok(StoredPhoto {
            url: format!("{}/{}/{}", self.public_base_url, PHOTO_FOLDER, file_name),
            file_name,
            size: data.len(),
        })
    }
}
