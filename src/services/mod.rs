//! Business logic services

pub mod admins;
pub mod equipment;
pub mod requests;
pub mod uploads;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub requests: requests::RequestsService,
    pub admins: admins::AdminsService,
    pub uploads: uploads::PhotoStorage,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            equipment: equipment::EquipmentService::new(
                repository.clone(),
                config.server.public_url.clone(),
            ),
            requests: requests::RequestsService::new(repository.clone()),
            admins: admins::AdminsService::new(repository.clone(), config.auth.clone()),
            uploads: uploads::PhotoStorage::new(&config.uploads),
            repository,
        }
    }

    /// Check the backing store is reachable
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
