//! Repository layer for database operations
//!
//! Each entity has a store trait returning plain domain records. The server
//! runs on the PostgreSQL implementations; `memory` backs tests.

pub mod admins;
pub mod equipment;
pub mod memory;
pub mod requests;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        admin::{Admin, AdminIdentity, AdminUpdate, NewAdmin},
        enums::RequestStatus,
        equipment::{CreateEquipment, Equipment, EquipmentPatch},
        request::{
            HistoryEntryView, MaintenanceRequest, NewRequest, RequestQuery, RequestSummary,
            StatusChange, TransitionOutcome,
        },
    },
};

#[async_trait]
pub trait EquipmentStore: Send + Sync {
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Equipment>>;

    /// Exact, case-sensitive match regardless of the active flag
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Equipment>>;

    async fn code_exists(&self, code: &str, exclude_id: Option<Uuid>) -> AppResult<bool>;

    async fn update(&self, id: Uuid, patch: &EquipmentPatch) -> AppResult<Option<Equipment>>;

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Equipment>>;

    /// Active records matching `term` in code, name, category or location
    async fn search(&self, term: &str, limit: usize) -> AppResult<Vec<Equipment>>;

    async fn count_active(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert the request and its seed history entry in one transaction
    async fn create(&self, data: &NewRequest) -> AppResult<MaintenanceRequest>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MaintenanceRequest>>;

    async fn number_exists(&self, number: &str) -> AppResult<bool>;

    /// Apply a status change and append its history entry atomically.
    /// Returns `None` when the request does not exist.
    async fn transition(
        &self,
        id: Uuid,
        change: &StatusChange,
    ) -> AppResult<Option<TransitionOutcome>>;

    async fn set_owner(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<Option<MaintenanceRequest>>;

    /// Newest first
    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<RequestSummary>>;

    /// Newest first
    async fn history(&self, request_id: Uuid) -> AppResult<Vec<HistoryEntryView>>;

    async fn count_by_status(&self) -> AppResult<HashMap<RequestStatus, i64>>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn create(&self, data: &NewAdmin) -> AppResult<Admin>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Admin>>;

    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Admin>>;

    async fn update(&self, id: Uuid, data: &AdminUpdate) -> AppResult<Option<Admin>>;

    async fn list_active(&self) -> AppResult<Vec<AdminIdentity>>;

    async fn count(&self) -> AppResult<i64>;
}

/// Main repository struct holding one store per entity
#[derive(Clone)]
pub struct Repository {
    pub pool: Option<Pool<Postgres>>,
    pub equipment: Arc<dyn EquipmentStore>,
    pub requests: Arc<dyn RequestStore>,
    pub admins: Arc<dyn AdminStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: Arc::new(equipment::EquipmentRepository::new(pool.clone())),
            requests: Arc::new(requests::RequestsRepository::new(pool.clone())),
            admins: Arc::new(admins::AdminsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository backed by a process-local store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            pool: None,
            equipment: store.clone(),
            requests: store.clone(),
            admins: store,
        }
    }

    /// Check the database answers; always true for the in-memory store
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Escape LIKE wildcards so user input matches literally
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
