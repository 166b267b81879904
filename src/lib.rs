//! DSFix Maintenance Request Server
//!
//! REST JSON API for office equipment maintenance: requesters resolve an
//! equipment code and file a request, admins triage it through its status
//! lifecycle while every change lands in an append-only history.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
