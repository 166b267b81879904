//! Maintenance request lifecycle service
//!
//! Every status change goes through `RequestStore::transition`, which updates
//! the request and appends its history entry in a single transaction.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        admin::AdminIdentity,
        enums::RequestStatus,
        equipment::EquipmentSummary,
        request::{
            CreateRequest, CreatedRequest, MaintenanceRequest, NewRequest, RequestConfirmation,
            RequestDetail, RequestQuery, RequestSummary, StatusChange, TransitionOutcome,
            UpdateStatus,
        },
    },
    repository::Repository,
};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBER_PREFIX: &str = "REQ-";
const NUMBER_SUFFIX_LEN: usize = 4;
const NUMBER_ATTEMPTS: usize = 5;

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// `REQ-` + base36 epoch millis + random base36 suffix, e.g. `REQ-M1ABCDEF7QZ2`
pub fn generate_request_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..NUMBER_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}{}", NUMBER_PREFIX, to_base36(millis), suffix)
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub pending: i64,
    pub in_progress: i64,
    pub done: i64,
    pub cancelled: i64,
    pub active_equipment: i64,
}

impl DashboardStats {
    fn from_counts(counts: &HashMap<RequestStatus, i64>, active_equipment: i64) -> Self {
        let get = |s: RequestStatus| counts.get(&s).copied().unwrap_or(0);
        Self {
            pending: get(RequestStatus::Pending),
            in_progress: get(RequestStatus::InProgress),
            done: get(RequestStatus::Done),
            cancelled: get(RequestStatus::Cancelled),
            active_equipment,
        }
    }
}

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
}

impl RequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn unique_number(&self) -> AppResult<String> {
        for _ in 0..NUMBER_ATTEMPTS {
            let number = generate_request_number();
            if !self.repository.requests.number_exists(&number).await? {
                return Ok(number);
            }
        }
        Err(AppError::Internal(
            "Could not generate a unique request number".to_string(),
        ))
    }

    async fn get_request(&self, id: Uuid) -> AppResult<MaintenanceRequest> {
        self.repository
            .requests
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    /// File a new request; it starts PENDING with its seed history entry
    pub async fn create(&self, data: CreateRequest) -> AppResult<CreatedRequest> {
        let data = data.normalized();
        data.validate()?;

        let equipment = self
            .repository
            .equipment
            .get_by_id(data.equipment_id)
            .await?
            .filter(|e| e.active)
            .ok_or_else(|| {
                AppError::NotFound(format!("Equipment {} not found", data.equipment_id))
            })?;

        let new_request = NewRequest {
            number: self.unique_number().await?,
            equipment_id: equipment.id,
            requester_name: data.requester_name,
            requester_department: data.requester_department,
            description: data.description,
            urgency: data.urgency,
            photo_url: data.photo_url,
            created_at: Utc::now(),
        };

        let request = self.repository.requests.create(&new_request).await?;
        tracing::info!(
            request_id = %request.id,
            number = %request.number,
            equipment = %equipment.code,
            urgency = %request.urgency,
            "Maintenance request created"
        );

        Ok(CreatedRequest {
            id: request.id,
            number: request.number,
        })
    }

    /// Move a request to `data.status`. Same-status calls succeed without
    /// writing anything.
    pub async fn transition_status(
        &self,
        id: Uuid,
        data: &UpdateStatus,
        actor: Option<Uuid>,
    ) -> AppResult<MaintenanceRequest> {
        data.validate()?;

        let change = StatusChange {
            to: data.status,
            actor,
            note: data
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        };

        let outcome = self
            .repository
            .requests
            .transition(id, &change)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        if let TransitionOutcome::Applied { ref entry, .. } = outcome {
            tracing::info!(
                request_id = %id,
                from = ?entry.previous_status,
                to = %entry.new_status,
                actor = ?actor,
                "Request status changed"
            );
        }

        Ok(outcome.into_request())
    }

    /// Set or clear the owner. Ownership is not a status event, so no
    /// history entry is written.
    pub async fn assign_owner(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        actor: Option<Uuid>,
    ) -> AppResult<MaintenanceRequest> {
        if let Some(owner_id) = owner_id {
            match self.repository.admins.get_by_id(owner_id).await? {
                Some(admin) if admin.active => {}
                _ => return Err(AppError::NotFound(format!("Admin {} not found", owner_id))),
            }
        }

        let request = self
            .repository
            .requests
            .set_owner(id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        tracing::info!(request_id = %id, owner = ?owner_id, actor = ?actor, "Request owner assigned");
        Ok(request)
    }

    pub async fn list(&self, query: &RequestQuery) -> AppResult<Vec<RequestSummary>> {
        self.repository.requests.list(query).await
    }

    /// Request with equipment, owner and full history, newest entry first
    pub async fn get_detail(&self, id: Uuid) -> AppResult<RequestDetail> {
        let request = self.get_request(id).await?;

        let equipment = self
            .repository
            .equipment
            .get_by_id(request.equipment_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Request {} references missing equipment", id))
            })?;

        let owner = match request.owner_id {
            Some(owner_id) => self
                .repository
                .admins
                .get_by_id(owner_id)
                .await?
                .map(|a| AdminIdentity::from(&a)),
            None => None,
        };

        let history = self.repository.requests.history(id).await?;

        Ok(RequestDetail {
            request,
            equipment,
            owner,
            history,
        })
    }

    /// Public confirmation view, shown to the requester after submission
    pub async fn get_confirmation(&self, id: Uuid) -> AppResult<RequestConfirmation> {
        let request = self.get_request(id).await?;
        let equipment = self
            .repository
            .equipment
            .get_by_id(request.equipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        Ok(RequestConfirmation {
            id: request.id,
            number: request.number,
            status: request.status,
            urgency: request.urgency,
            created_at: request.created_at,
            equipment: EquipmentSummary::from(&equipment),
        })
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let counts = self.repository.requests.count_by_status().await?;
        let active_equipment = self.repository.equipment.count_active().await?;
        Ok(DashboardStats::from_counts(&counts, active_equipment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        admin::NewAdmin,
        enums::Urgency,
        equipment::{CreateEquipment, Equipment, EquipmentPatch},
    };
    use once_cell::sync::Lazy;
    use regex::Regex;

    static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^REQ-[A-Z0-9]+$").unwrap());

    struct Fixture {
        repo: Repository,
        svc: RequestsService,
        equipment: Equipment,
    }

    async fn fixture() -> Fixture {
        let repo = Repository::in_memory();
        let equipment = repo
            .equipment
            .create(&CreateEquipment {
                code: "EQ001".into(),
                name: "Coffee Machine".into(),
                category: "Coffee Machine".into(),
                location: "Lobby".into(),
                notes: None,
            })
            .await
            .unwrap();
        Fixture {
            svc: RequestsService::new(repo.clone()),
            repo,
            equipment,
        }
    }

    async fn admin(repo: &Repository, email: &str, name: &str) -> Uuid {
        repo.admins
            .create(&NewAdmin {
                email: email.into(),
                name: name.into(),
                password_hash: "$argon2id$placeholder".into(),
            })
            .await
            .unwrap()
            .id
    }

    fn alice(equipment_id: Uuid) -> CreateRequest {
        CreateRequest {
            equipment_id,
            requester_name: "Alice".into(),
            requester_department: "Sales".into(),
            description: "Not heating water properly".into(),
            urgency: Urgency::High,
            photo_url: None,
        }
    }

    fn status(to: RequestStatus, note: Option<&str>) -> UpdateStatus {
        UpdateStatus {
            status: to,
            note: note.map(str::to_string),
        }
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_generated_numbers_fit_column_and_pattern() {
        let number = generate_request_number();
        assert!(NUMBER_RE.is_match(&number), "{}", number);
        assert!(number.len() <= 20);
        assert_ne!(generate_request_number(), generate_request_number());
    }

    #[tokio::test]
    async fn test_create_seeds_pending_history() {
        let f = fixture().await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();
        assert!(NUMBER_RE.is_match(&created.number));

        let detail = f.svc.get_detail(created.id).await.unwrap();
        assert_eq!(detail.request.status, RequestStatus::Pending);
        assert_eq!(detail.request.completed_at, None);
        assert_eq!(detail.history.len(), 1);
        let seed = &detail.history[0].entry;
        assert_eq!(seed.previous_status, None);
        assert_eq!(seed.new_status, RequestStatus::Pending);
        assert_eq!(seed.changed_by, None);
    }

    #[tokio::test]
    async fn test_transition_to_done_records_actor_and_completion() {
        let f = fixture().await;
        let admin_id = admin(&f.repo, "joao@dsfix.com", "Joao Silva").await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();

        let updated = f
            .svc
            .transition_status(
                created.id,
                &status(RequestStatus::Done, Some("Fixed")),
                Some(admin_id),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Done);
        assert!(updated.completed_at.is_some());

        let detail = f.svc.get_detail(created.id).await.unwrap();
        assert_eq!(detail.history.len(), 2);
        let latest = &detail.history[0];
        assert_eq!(latest.entry.previous_status, Some(RequestStatus::Pending));
        assert_eq!(latest.entry.new_status, RequestStatus::Done);
        assert_eq!(latest.entry.changed_by, Some(admin_id));
        assert_eq!(latest.entry.note.as_deref(), Some("Fixed"));
        assert_eq!(latest.changed_by_name.as_deref(), Some("Joao Silva"));
    }

    #[tokio::test]
    async fn test_same_status_is_idempotent() {
        let f = fixture().await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();

        let before = f.svc.get_detail(created.id).await.unwrap();
        let result = f
            .svc
            .transition_status(created.id, &status(RequestStatus::Pending, None), None)
            .await
            .unwrap();
        assert_eq!(result, before.request);
        assert_eq!(f.svc.get_detail(created.id).await.unwrap().history.len(), 1);
    }

    #[tokio::test]
    async fn test_history_mirrors_transition_sequence() {
        let f = fixture().await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();
        let sequence = [
            RequestStatus::InProgress,
            RequestStatus::Done,
            RequestStatus::InProgress,
            RequestStatus::Cancelled,
        ];
        for to in sequence {
            f.svc
                .transition_status(created.id, &status(to, None), None)
                .await
                .unwrap();
        }

        let detail = f.svc.get_detail(created.id).await.unwrap();
        assert_eq!(detail.history.len(), sequence.len() + 1);

        let chronological: Vec<_> = detail.history.iter().rev().map(|h| &h.entry).collect();
        assert_eq!(chronological[0].previous_status, None);
        let new_statuses: Vec<_> = chronological.iter().map(|e| e.new_status).collect();
        let mut expected = vec![RequestStatus::Pending];
        expected.extend(sequence);
        assert_eq!(new_statuses, expected);
        for pair in chronological.windows(2) {
            assert_eq!(pair[1].previous_status, Some(pair[0].new_status));
        }

        // Leaving DONE clears the completion stamp
        assert_eq!(detail.request.status, RequestStatus::Cancelled);
        assert_eq!(detail.request.completed_at, None);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let f = fixture().await;
        let missing = Uuid::new_v4();
        assert!(matches!(
            f.svc.get_detail(missing).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            f.svc
                .transition_status(missing, &status(RequestStatus::Done, None), None)
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            f.svc.assign_owner(missing, None, None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            f.svc.get_confirmation(missing).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_and_inactive_equipment() {
        let f = fixture().await;

        let mut bad = alice(f.equipment.id);
        bad.description = "short".into();
        assert!(matches!(
            f.svc.create(bad).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));

        assert!(matches!(
            f.svc.create(alice(Uuid::new_v4())).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        let patch = EquipmentPatch {
            active: Some(false),
            ..Default::default()
        };
        f.repo.equipment.update(f.equipment.id, &patch).await.unwrap();
        assert!(matches!(
            f.svc.create(alice(f.equipment.id)).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(f.svc.list(&RequestQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_equipment_still_resolves_on_existing_requests() {
        let f = fixture().await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();

        let patch = EquipmentPatch {
            active: Some(false),
            ..Default::default()
        };
        f.repo.equipment.update(f.equipment.id, &patch).await.unwrap();

        let detail = f.svc.get_detail(created.id).await.unwrap();
        assert_eq!(detail.equipment.name, "Coffee Machine");
        assert_eq!(detail.equipment.location, "Lobby");
        assert!(!detail.equipment.active);

        let listed = f.svc.list(&RequestQuery::default()).await.unwrap();
        assert_eq!(listed[0].equipment.name, "Coffee Machine");
    }

    #[tokio::test]
    async fn test_assign_owner_requires_active_admin_and_writes_no_history() {
        let f = fixture().await;
        let owner = admin(&f.repo, "maria@dsfix.com", "Maria Santos").await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();

        let updated = f.svc.assign_owner(created.id, Some(owner), None).await.unwrap();
        assert_eq!(updated.owner_id, Some(owner));

        let detail = f.svc.get_detail(created.id).await.unwrap();
        assert_eq!(detail.owner.map(|o| o.name), Some("Maria Santos".to_string()));
        assert_eq!(detail.history.len(), 1);

        assert!(matches!(
            f.svc
                .assign_owner(created.id, Some(Uuid::new_v4()), None)
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));

        let cleared = f.svc.assign_owner(created.id, None, None).await.unwrap();
        assert_eq!(cleared.owner_id, None);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let f = fixture().await;
        let first = f.svc.create(alice(f.equipment.id)).await.unwrap();

        let mut bob = alice(f.equipment.id);
        bob.requester_name = "Bob Martins".into();
        bob.urgency = Urgency::Low;
        let second = f.svc.create(bob).await.unwrap();

        f.svc
            .transition_status(first.id, &status(RequestStatus::InProgress, None), None)
            .await
            .unwrap();

        let all = f.svc.list(&RequestQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].request.id, second.id);
        assert_eq!(all[0].equipment.code, "EQ001");

        let in_progress = f
            .svc
            .list(&RequestQuery {
                status: Some(RequestStatus::InProgress),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].request.id, first.id);

        let low = f
            .svc
            .list(&RequestQuery {
                urgency: Some(Urgency::Low),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);

        let by_name = f
            .svc
            .list(&RequestQuery {
                search: Some("bob".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].request.id, second.id);

        let by_number = f
            .svc
            .list(&RequestQuery {
                search: Some(first.number.to_lowercase()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].request.id, first.id);
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let f = fixture().await;
        let a = f.svc.create(alice(f.equipment.id)).await.unwrap();
        f.svc.create(alice(f.equipment.id)).await.unwrap();
        f.svc
            .transition_status(a.id, &status(RequestStatus::InProgress, None), None)
            .await
            .unwrap();

        let stats = f.svc.dashboard().await.unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.done, 0);
        assert_eq!(stats.active_equipment, 1);
    }

    #[tokio::test]
    async fn test_confirmation_view() {
        let f = fixture().await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();
        let view = f.svc.get_confirmation(created.id).await.unwrap();
        assert_eq!(view.number, created.number);
        assert_eq!(view.status, RequestStatus::Pending);
        assert_eq!(view.equipment.code, "EQ001");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_keep_history_chained() {
        let f = fixture().await;
        let created = f.svc.create(alice(f.equipment.id)).await.unwrap();

        let targets = [
            RequestStatus::InProgress,
            RequestStatus::Done,
            RequestStatus::Cancelled,
            RequestStatus::Pending,
        ];
        let id = created.id;
        let mut handles = Vec::new();
        for i in 0..32 {
            let svc = f.svc.clone();
            let to = targets[i % targets.len()];
            handles.push(tokio::spawn(async move {
                svc.transition_status(id, &status(to, None), None)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let detail = f.svc.get_detail(created.id).await.unwrap();
        let newest = &detail.history[0].entry;
        assert_eq!(newest.new_status, detail.request.status);
        assert_eq!(newest.created_at, detail.request.updated_at);

        let chronological: Vec<_> = detail.history.iter().rev().map(|h| &h.entry).collect();
        for pair in chronological.windows(2) {
            assert_eq!(pair[1].previous_status, Some(pair[0].new_status));
            assert_ne!(pair[1].previous_status, Some(pair[1].new_status));
            assert!(pair[1].created_at >= pair[0].created_at);
        }
    }

    #[tokio::test]
    async fn test_padded_names_are_trimmed_before_validation() {
        let f = fixture().await;

        let mut padded = alice(f.equipment.id);
        padded.requester_name = "  A ".into();
        padded.requester_department = " S ".into();
        match f.svc.create(padded).await.unwrap_err() {
            AppError::InvalidInput(errors) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("requester_name"));
                assert!(fields.contains_key("requester_department"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut padded = alice(f.equipment.id);
        padded.requester_name = "  Alice  ".into();
        let created = f.svc.create(padded).await.unwrap();
        let detail = f.svc.get_detail(created.id).await.unwrap();
        assert_eq!(detail.request.requester_name, "Alice");
    }
}
