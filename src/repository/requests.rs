//! Requests repository: request rows and their status history

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::{like_pattern, RequestStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        admin::AdminIdentity,
        enums::RequestStatus,
        equipment::EquipmentSummary,
        request::{
            HistoryEntryView, MaintenanceRequest, NewRequest, RequestQuery, RequestSummary,
            StatusChange, StatusHistoryEntry, TransitionOutcome, CREATION_NOTE,
        },
    },
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn summary_from_row(row: &PgRow) -> Result<RequestSummary, sqlx::Error> {
    let owner_id: Option<Uuid> = row.try_get("owner_id")?;
    let owner = match owner_id {
        Some(id) => Some(AdminIdentity {
            id,
            email: row.try_get("owner_email")?,
            name: row.try_get("owner_name")?,
        }),
        None => None,
    };

    Ok(RequestSummary {
        request: MaintenanceRequest {
            id: row.try_get("id")?,
            number: row.try_get("number")?,
            equipment_id: row.try_get("equipment_id")?,
            requester_name: row.try_get("requester_name")?,
            requester_department: row.try_get("requester_department")?,
            description: row.try_get("description")?,
            urgency: row.try_get("urgency")?,
            status: row.try_get("status")?,
            owner_id,
            photo_url: row.try_get("photo_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            completed_at: row.try_get("completed_at")?,
        },
        equipment: EquipmentSummary {
            id: row.try_get("equipment_id")?,
            code: row.try_get("equipment_code")?,
            name: row.try_get("equipment_name")?,
            location: row.try_get("equipment_location")?,
        },
        owner,
    })
}

#[async_trait]
impl RequestStore for RequestsRepository {
    async fn create(&self, data: &NewRequest) -> AppResult<MaintenanceRequest> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            r#"
            INSERT INTO requests (
                id, number, equipment_id, requester_name, requester_department,
                description, urgency, status, photo_url, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.number)
        .bind(data.equipment_id)
        .bind(&data.requester_name)
        .bind(&data.requester_department)
        .bind(&data.description)
        .bind(data.urgency)
        .bind(RequestStatus::Pending)
        .bind(&data.photo_url)
        .bind(data.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Request number already exists"))?;

        sqlx::query(
            r#"
            INSERT INTO status_history (id, request_id, previous_status, new_status, changed_by, note, created_at)
            VALUES ($1, $2, NULL, $3, NULL, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.id)
        .bind(RequestStatus::Pending)
        .bind(CREATION_NOTE)
        .bind(data.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<MaintenanceRequest>> {
        let row = sqlx::query_as::<_, MaintenanceRequest>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn number_exists(&self, number: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM requests WHERE number = $1)")
                .bind(number)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn transition(
        &self,
        id: Uuid,
        change: &StatusChange,
    ) -> AppResult<Option<TransitionOutcome>> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent transitions on the same request
        let current = sqlx::query_as::<_, MaintenanceRequest>(
            "SELECT * FROM requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };

        if current.status == change.to {
            tx.commit().await?;
            return Ok(Some(TransitionOutcome::Unchanged(current)));
        }

        // Stamped after the lock so history order follows lock order
        let at: DateTime<Utc> = sqlx::query_scalar("SELECT clock_timestamp()")
            .fetch_one(&mut *tx)
            .await?;
        let completed_at = (change.to == RequestStatus::Done).then_some(at);

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            r#"
            UPDATE requests
            SET status = $2, updated_at = $3, completed_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.to)
        .bind(at)
        .bind(completed_at)
        .fetch_one(&mut *tx)
        .await?;

        let entry = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            INSERT INTO status_history (id, request_id, previous_status, new_status, changed_by, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(current.status)
        .bind(change.to)
        .bind(change.actor)
        .bind(&change.note)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(TransitionOutcome::Applied { request, entry }))
    }

    async fn set_owner(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
    ) -> AppResult<Option<MaintenanceRequest>> {
        let row = sqlx::query_as::<_, MaintenanceRequest>(
            "UPDATE requests SET owner_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, query: &RequestQuery) -> AppResult<Vec<RequestSummary>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.status.is_some() {
            conditions.push(format!("r.status = ${}", idx));
            idx += 1;
        }
        if query.urgency.is_some() {
            conditions.push(format!("r.urgency = ${}", idx));
            idx += 1;
        }
        if query.search_term().is_some() {
            conditions.push(format!(
                "(r.requester_name ILIKE ${} OR r.number ILIKE ${})",
                idx, idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!(
            r#"
            SELECT r.*,
                   e.code AS equipment_code, e.name AS equipment_name, e.location AS equipment_location,
                   a.email AS owner_email, a.name AS owner_name
            FROM requests r
            JOIN equipment e ON e.id = r.equipment_id
            LEFT JOIN admin_users a ON a.id = r.owner_id
            {}
            ORDER BY r.created_at DESC
            "#,
            where_clause
        );

        let mut builder = sqlx::query(&select_query);
        if let Some(status) = query.status {
            builder = builder.bind(status);
        }
        if let Some(urgency) = query.urgency {
            builder = builder.bind(urgency);
        }
        if let Some(term) = query.search_term() {
            builder = builder.bind(like_pattern(term));
        }

        let rows = builder.fetch_all(&self.pool).await?;
        let summaries = rows
            .iter()
            .map(summary_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }

    async fn history(&self, request_id: Uuid) -> AppResult<Vec<HistoryEntryView>> {
        let rows = sqlx::query(
            r#"
            SELECT h.*, a.name AS changed_by_name
            FROM status_history h
            LEFT JOIN admin_users a ON a.id = h.changed_by
            WHERE h.request_id = $1
            ORDER BY h.created_at DESC, h.previous_status IS NULL
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(HistoryEntryView {
                entry: StatusHistoryEntry {
                    id: row.try_get("id")?,
                    request_id: row.try_get("request_id")?,
                    previous_status: row.try_get("previous_status")?,
                    new_status: row.try_get("new_status")?,
                    changed_by: row.try_get("changed_by")?,
                    note: row.try_get("note")?,
                    created_at: row.try_get("created_at")?,
                },
                changed_by_name: row.try_get("changed_by_name")?,
            });
        }
        Ok(entries)
    }

    async fn count_by_status(&self) -> AppResult<HashMap<RequestStatus, i64>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM requests GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts: HashMap<RequestStatus, i64> =
            RequestStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for row in rows {
            let status: RequestStatus = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            counts.insert(status, count);
        }
        Ok(counts)
    }
}
