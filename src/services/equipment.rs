//! Equipment registry service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::equipment::{
        CreateEquipment, Equipment, EquipmentPatch, QrTarget, SEARCH_LIMIT, SEARCH_MIN_CHARS,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
    public_url: String,
}

impl EquipmentService {
    pub fn new(repository: Repository, public_url: String) -> Self {
        Self {
            repository,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list(include_inactive).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Equipment> {
        self.repository
            .equipment
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Resolve a scanned code; only active equipment can receive requests
    pub async fn get_by_code(&self, code: &str) -> AppResult<Equipment> {
        let equipment = self
            .repository
            .equipment
            .get_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", code)))?;

        if !equipment.active {
            return Err(AppError::NotFound(format!("Equipment {} is inactive", code)));
        }
        Ok(equipment)
    }

    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;

        if self.repository.equipment.code_exists(&data.code, None).await? {
            return Err(AppError::Conflict(format!(
                "Equipment code {} already exists",
                data.code
            )));
        }

        let equipment = self.repository.equipment.create(data).await?;
        tracing::info!(equipment_id = %equipment.id, code = %equipment.code, "Equipment created");
        Ok(equipment)
    }

    pub async fn update(&self, id: Uuid, patch: &EquipmentPatch) -> AppResult<Equipment> {
        patch.validate()?;

        // Check if equipment exists
        let current = self.get_by_id(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        if let Some(ref code) = patch.code {
            if self.repository.equipment.code_exists(code, Some(id)).await? {
                return Err(AppError::Conflict(format!("Equipment code {} already exists", code)));
            }
        }

        self.repository
            .equipment
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Soft-deactivate; requests referencing the equipment are untouched
    pub async fn deactivate(&self, id: Uuid) -> AppResult<Equipment> {
        let patch = EquipmentPatch {
            active: Some(false),
            ..Default::default()
        };
        let equipment = self
            .repository
            .equipment
            .update(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;
        tracing::info!(equipment_id = %id, "Equipment deactivated");
        Ok(equipment)
    }

    /// Search active equipment; short queries return nothing
    pub async fn search(&self, query: &str) -> AppResult<Vec<Equipment>> {
        let term = query.trim();
        if term.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }
        self.repository.equipment.search(term, SEARCH_LIMIT).await
    }

    /// URL a QR label for this equipment should encode
    pub async fn qr_target(&self, id: Uuid) -> AppResult<QrTarget> {
        let equipment = self.get_by_id(id).await?;
        Ok(QrTarget {
            url: format!("{}/equipment/{}", self.public_url, equipment.code),
            code: equipment.code,
        })
    }

    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.equipment.count_active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EquipmentService {
        EquipmentService::new(Repository::in_memory(), "https://fix.example.com/".into())
    }

    fn coffee_machine() -> CreateEquipment {
        CreateEquipment {
            code: "EQ001".into(),
            name: "Coffee Machine".into(),
            category: "Coffee Machine".into(),
            location: "Lobby".into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_is_conflict_and_registry_unchanged() {
        let svc = service();
        svc.create(&coffee_machine()).await.unwrap();

        let mut dup = coffee_machine();
        dup.name = "Another Machine".into();
        let err = svc.create(&dup).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let all = svc.list(true).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Coffee Machine");
    }

    #[tokio::test]
    async fn test_code_match_is_case_sensitive() {
        let svc = service();
        svc.create(&coffee_machine()).await.unwrap();
        assert!(matches!(
            svc.get_by_code("eq001").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(svc.get_by_code("EQ001").await.unwrap().name, "Coffee Machine");
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_store() {
        let svc = service();
        let mut data = coffee_machine();
        data.code = "bad code".into();
        assert!(matches!(
            svc.create(&data).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));
        assert!(svc.list(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_colliding_code() {
        let svc = service();
        svc.create(&coffee_machine()).await.unwrap();
        let mut printer = coffee_machine();
        printer.code = "PRN-01".into();
        printer.name = "Printer".into();
        let printer = svc.create(&printer).await.unwrap();

        let patch = EquipmentPatch {
            code: Some("EQ001".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(printer.id, &patch).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        // Re-submitting its own code is not a collision
        let patch = EquipmentPatch {
            code: Some("PRN-01".into()),
            location: Some("Floor 3".into()),
            ..Default::default()
        };
        let updated = svc.update(printer.id, &patch).await.unwrap();
        assert_eq!(updated.location, "Floor 3");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let svc = service();
        let patch = EquipmentPatch {
            name: Some("Ghost".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(Uuid::new_v4(), &patch).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_deactivated_equipment_is_hidden_from_requesters() {
        let svc = service();
        let eq = svc.create(&coffee_machine()).await.unwrap();
        svc.deactivate(eq.id).await.unwrap();

        assert!(matches!(
            svc.get_by_code("EQ001").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(svc.search("coffee").await.unwrap().is_empty());
        // Still resolvable by id for history views
        assert!(!svc.get_by_id(eq.id).await.unwrap().active);
        assert_eq!(svc.list(false).await.unwrap().len(), 0);
        assert_eq!(svc.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_rules() {
        let svc = service();
        svc.create(&coffee_machine()).await.unwrap();
        for i in 0..12 {
            let data = CreateEquipment {
                code: format!("AC-{:02}", i),
                name: format!("Air Conditioner {}", i),
                category: "Air Conditioning".into(),
                location: "Floor 2".into(),
                notes: None,
            };
            svc.create(&data).await.unwrap();
        }

        assert!(svc.search("xyz-nonexistent").await.unwrap().is_empty());
        assert!(svc.search(" c ").await.unwrap().is_empty());
        assert_eq!(svc.search("LOBBY").await.unwrap().len(), 1);
        assert_eq!(svc.search("eq0").await.unwrap()[0].code, "EQ001");
        assert_eq!(svc.search("air").await.unwrap().len(), SEARCH_LIMIT);
    }

    #[tokio::test]
    async fn test_qr_target_uses_public_url() {
        let svc = service();
        let eq = svc.create(&coffee_machine()).await.unwrap();
        let target = svc.qr_target(eq.id).await.unwrap();
        assert_eq!(target.url, "https://fix.example.com/equipment/EQ001");
    }
}
