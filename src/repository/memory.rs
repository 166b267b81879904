//! In-memory store implementing every repository trait.
//!
//! One mutex guards all tables, so a request write and its history entry are
//! applied together just like the PostgreSQL transactions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{AdminStore, EquipmentStore, RequestStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        admin::{Admin, AdminIdentity, AdminUpdate, NewAdmin},
        enums::RequestStatus,
        equipment::{CreateEquipment, Equipment, EquipmentPatch, EquipmentSummary},
        request::{
            HistoryEntryView, MaintenanceRequest, NewRequest, RequestQuery, RequestSummary,
            StatusChange, StatusHistoryEntry, TransitionOutcome, CREATION_NOTE,
        },
    },
};

#[derive(Default)]
struct Tables {
    equipment: Vec<Equipment>,
    requests: Vec<MaintenanceRequest>,
    /// Append-only, in write order
    history: Vec<StatusHistoryEntry>,
    admins: Vec<Admin>,
}

impl Tables {
    fn admin_identity(&self, id: Uuid) -> Option<AdminIdentity> {
        self.admins.iter().find(|a| a.id == id).map(AdminIdentity::from)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EquipmentStore for MemoryStore {
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let mut tables = self.lock()?;
        if tables.equipment.iter().any(|e| e.code == data.code) {
            return Err(AppError::Conflict("Equipment code already exists".to_string()));
        }
        let now = Utc::now();
        let equipment = Equipment {
            id: Uuid::new_v4(),
            code: data.code.clone(),
            name: data.name.clone(),
            category: data.category.clone(),
            location: data.location.clone(),
            notes: data.notes.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables.equipment.push(equipment.clone());
        Ok(equipment)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Equipment>> {
        Ok(self.lock()?.equipment.iter().find(|e| e.id == id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Equipment>> {
        Ok(self.lock()?.equipment.iter().find(|e| e.code == code).cloned())
    }

    async fn code_exists(&self, code: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .lock()?
            .equipment
            .iter()
            .any(|e| e.code == code && Some(e.id) != exclude_id))
    }

    async fn update(&self, id: Uuid, patch: &EquipmentPatch) -> AppResult<Option<Equipment>> {
        let mut tables = self.lock()?;
        if let Some(ref code) = patch.code {
            if tables.equipment.iter().any(|e| &e.code == code && e.id != id) {
                return Err(AppError::Conflict("Equipment code already exists".to_string()));
            }
        }
        let Some(equipment) = tables.equipment.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        patch.apply_to(equipment, Utc::now());
        Ok(Some(equipment.clone()))
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Equipment>> {
        let mut rows: Vec<Equipment> = self
            .lock()?
            .equipment
            .iter()
            .filter(|e| include_inactive || e.active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn search(&self, term: &str, limit: usize) -> AppResult<Vec<Equipment>> {
        let needle = term.to_lowercase();
        let mut rows: Vec<Equipment> = self
            .lock()?
            .equipment
            .iter()
            .filter(|e| e.active)
            .filter(|e| {
                [&e.code, &e.name, &e.category, &e.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn count_active(&self) -> AppResult<i64> {
        Ok(self.lock()?.equipment.iter().filter(|e| e.active).count() as i64)
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(&self, data: &NewRequest) -> AppResult<MaintenanceRequest> {
        let mut tables = self.lock()?;
        if tables.requests.iter().any(|r| r.number == data.number) {
            return Err(AppError::Conflict("Request number already exists".to_string()));
        }
        if !tables.equipment.iter().any(|e| e.id == data.equipment_id) {
            return Err(AppError::NotFound(format!(
                "Equipment {} not found",
                data.equipment_id
            )));
        }

        let request = MaintenanceRequest {
            id: Uuid::new_v4(),
            number: data.number.clone(),
            equipment_id: data.equipment_id,
            requester_name: data.requester_name.clone(),
            requester_department: data.requester_department.clone(),
            description: data.description.clone(),
            urgency: data.urgency,
            status: RequestStatus::Pending,
            owner_id: None,
            photo_url: data.photo_url.clone(),
            created_at: data.created_at,
            updated_at: data.created_at,
            completed_at: None,
        };
        let seed = StatusHistoryEntry {
            id: Uuid::new_v4(),
            request_id: request.id,
            previous_status: None,
            new_status: RequestStatus::Pending,
            changed_by: None,
            note: Some(CREATION_NOTE.to_string()),
            created_at: data.created_at,
        };
        tables.requests.push(request.clone());
        tables.history.push(seed);
        Ok(request)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MaintenanceRequest>> {
        Ok(self.lock()?.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn number_exists(&self, number: &str) -> AppResult<bool> {
        Ok(self.lock()?.requests.iter().any(|r| r.number == number))
    }

    async fn transition(
        &self,
        id: Uuid,
        change: &StatusChange,
    ) -> AppResult<Option<TransitionOutcome>> {
        let mut tables = self.lock()?;
        let Some(request) = tables.requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if request.status == change.to {
            return Ok(Some(TransitionOutcome::Unchanged(request.clone())));
        }

        let at = Utc::now();
        let previous = request.status;
        request.status = change.to;
        request.updated_at = at;
        request.completed_at = (change.to == RequestStatus::Done).then_some(at);
        let request = request.clone();

        let entry = StatusHistoryEntry {
            id: Uuid::new_v4(),
            request_id: id,
            previous_status: Some(previous),
            new_status: change.to,
            changed_by: change.actor,
            note: change.note.clone(),
            created_at: at,
        };
        tables.history.push(entry.clone());

        Ok(Some(TransitionOutcome::Applied { request, entry }))
    }

    async fn set_owner(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<Option<MaintenanceRequest>> {
        let mut tables = self.lock()?;
        let Some(request) = tables.requests.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        request.owner_id = owner_id;
        request.updated_at = Utc::now();
        Ok(Some(request.clone()))
    }

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<RequestSummary>> {
        let tables = self.lock()?;
        let term = query.search_term().map(str::to_lowercase);

        let mut rows = Vec::new();
        for request in tables.requests.iter().rev() {
            if query.status.is_some_and(|s| s != request.status) {
                continue;
            }
            if query.urgency.is_some_and(|u| u != request.urgency) {
                continue;
            }
            if let Some(ref term) = term {
                let hit = request.requester_name.to_lowercase().contains(term)
                    || request.number.to_lowercase().contains(term);
                if !hit {
                    continue;
                }
            }
            let Some(equipment) = tables.equipment.iter().find(|e| e.id == request.equipment_id)
            else {
                continue;
            };
            rows.push(RequestSummary {
                request: request.clone(),
                equipment: EquipmentSummary::from(equipment),
                owner: request.owner_id.and_then(|id| tables.admin_identity(id)),
            });
        }
        // Stable sort keeps reverse insertion order for equal timestamps
        rows.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
        Ok(rows)
    }

    async fn history(&self, request_id: Uuid) -> AppResult<Vec<HistoryEntryView>> {
        let tables = self.lock()?;
        let entries = tables
            .history
            .iter()
            .rev()
            .filter(|h| h.request_id == request_id)
            .map(|h| HistoryEntryView {
                entry: h.clone(),
                changed_by_name: h
                    .changed_by
                    .and_then(|id| tables.admin_identity(id))
                    .map(|a| a.name),
            })
            .collect();
        Ok(entries)
    }

    async fn count_by_status(&self) -> AppResult<HashMap<RequestStatus, i64>> {
        let tables = self.lock()?;
        let mut counts: HashMap<RequestStatus, i64> =
            RequestStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for request in &tables.requests {
            *counts.entry(request.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn create(&self, data: &NewAdmin) -> AppResult<Admin> {
        let mut tables = self.lock()?;
        if tables
            .admins
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            email: data.email.clone(),
            name: data.name.clone(),
            password_hash: data.password_hash.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables.admins.push(admin.clone());
        Ok(admin)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        Ok(self.lock()?.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        Ok(self
            .lock()?
            .admins
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, id: Uuid, data: &AdminUpdate) -> AppResult<Option<Admin>> {
        let mut tables = self.lock()?;
        let Some(admin) = tables.admins.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(ref name) = data.name {
            admin.name = name.clone();
        }
        if let Some(ref hash) = data.password_hash {
            admin.password_hash = hash.clone();
        }
        if let Some(active) = data.active {
            admin.active = active;
        }
        admin.updated_at = Utc::now();
        Ok(Some(admin.clone()))
    }

    async fn list_active(&self) -> AppResult<Vec<AdminIdentity>> {
        let mut admins: Vec<AdminIdentity> = self
            .lock()?
            .admins
            .iter()
            .filter(|a| a.active)
            .map(AdminIdentity::from)
            .collect();
        admins.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(admins)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.lock()?.admins.len() as i64)
    }
}
