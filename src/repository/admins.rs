//! Admin users repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::AdminStore;
use crate::{
    error::{AppError, AppResult},
    models::admin::{Admin, AdminIdentity, AdminUpdate, NewAdmin},
};

#[derive(Clone)]
pub struct AdminsRepository {
    pool: Pool<Postgres>,
}

impl AdminsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for AdminsRepository {
    async fn create(&self, data: &NewAdmin) -> AppResult<Admin> {
        let now = Utc::now();
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admin_users (id, email, name, password_hash, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.email)
        .bind(&data.name)
        .bind(&data.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Email already registered"))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admin_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT * FROM admin_users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn update(&self, id: Uuid, data: &AdminUpdate) -> AppResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admin_users
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                active = COALESCE($4, active),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.password_hash)
        .bind(data.active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn list_active(&self) -> AppResult<Vec<AdminIdentity>> {
        let admins = sqlx::query_as::<_, AdminIdentity>(
            "SELECT id, email, name FROM admin_users WHERE active ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(admins)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
