//! Equipment repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{like_pattern, EquipmentStore};
use crate::{
    error::{AppError, AppResult},
    models::equipment::{CreateEquipment, Equipment, EquipmentPatch},
};

const DUPLICATE_CODE: &str = "Equipment code already exists";

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// SET clauses for a partial update, numbered after `$1` (id) and `$2` (updated_at)
fn patch_assignments(data: &EquipmentPatch) -> Vec<String> {
    let columns = [
        ("code", data.code.is_some()),
        ("name", data.name.is_some()),
        ("category", data.category.is_some()),
        ("location", data.location.is_some()),
        ("notes", data.notes.is_some()),
        ("active", data.active.is_some()),
    ];

    let mut sets = vec!["updated_at = $2".to_string()];
    for (column, present) in columns {
        if present {
            let placeholder = sets.len() + 2;
            sets.push(format!("{} = ${}", column, placeholder));
        }
    }
    sets
}

#[async_trait]
impl EquipmentStore for EquipmentRepository {
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let now = Utc::now();
        sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (id, code, name, category, location, notes, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.category)
        .bind(&data.location)
        .bind(&data.notes)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_CODE))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn code_exists(&self, code: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM equipment WHERE code = $1 AND id != $2)")
                .bind(code)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM equipment WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    async fn update(&self, id: Uuid, data: &EquipmentPatch) -> AppResult<Option<Equipment>> {
        let now = Utc::now();
        let sets = patch_assignments(data);

        let query = format!(
            "UPDATE equipment SET {} WHERE id = $1 RETURNING *",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query).bind(id).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.code);
        bind_field!(data.name);
        bind_field!(data.category);
        bind_field!(data.location);
        bind_field!(data.notes);
        bind_field!(data.active);

        builder
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_CODE))
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE active OR $1 ORDER BY code",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn search(&self, term: &str, limit: usize) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT * FROM equipment
            WHERE active
              AND (code ILIKE $1 OR name ILIKE $1 OR category ILIKE $1 OR location ILIKE $1)
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE active")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
