//! Admin directory and session service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{AuthConfig, BootstrapConfig},
    error::{AppError, AppResult},
    models::admin::{
        Admin, AdminClaims, AdminIdentity, AdminPatch, AdminSession, AdminUpdate, CreateAdmin,
        NewAdmin,
    },
    repository::Repository,
};

/// Uniform failure message for every rejected login
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Hash verified against when the email is unknown, so lookups and
/// mismatches cost the same
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("dsfix-timing-guard").ok());

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_hash(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AdminsService {
    repository: Repository,
    config: AuthConfig,
}

impl AdminsService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register an admin; the password is stored as a salted hash only
    pub async fn create(&self, data: &CreateAdmin) -> AppResult<AdminIdentity> {
        let data = data.clone().normalized();
        data.validate()?;

        if self.repository.admins.get_by_email(&data.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let admin = self
            .repository
            .admins
            .create(&NewAdmin {
                email: data.email,
                name: data.name,
                password_hash: hash_password(&data.password)?,
            })
            .await?;

        tracing::info!(admin_id = %admin.id, "Admin created");
        Ok(AdminIdentity::from(&admin))
    }

    /// Check credentials. Every failure yields `None`, whatever the reason.
    pub async fn verify(&self, email: &str, password: &str) -> AppResult<Option<AdminIdentity>> {
        let admin = self
            .repository
            .admins
            .get_by_email(&normalize_email(email))
            .await?;

        let Some(admin) = admin else {
            if let Some(ref hash) = *DUMMY_HASH {
                verify_hash(hash, password);
            }
            return Ok(None);
        };

        let password_ok = verify_hash(&admin.password_hash, password);
        if !admin.active || !password_ok {
            return Ok(None);
        }
        Ok(Some(AdminIdentity::from(&admin)))
    }

    /// Verify credentials and issue a session token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, AdminIdentity)> {
        let identity = self
            .verify(email, password)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        let now = Utc::now().timestamp();
        let claims = AdminClaims {
            sub: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
            iat: now,
        };
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(admin_id = %identity.id, "Admin logged in");
        Ok((token, identity))
    }

    /// Turn a bearer token into a session; the admin must still be active
    pub async fn resolve_session(&self, token: &str) -> AppResult<AdminSession> {
        let claims = AdminClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let admin = self.repository.admins.get_by_id(claims.sub).await?;
        match admin {
            Some(admin) if admin.active => Ok(AdminSession::from(AdminIdentity::from(&admin))),
            _ => Err(AppError::Authentication("Session is no longer valid".to_string())),
        }
    }

    /// Active admins, identity fields only
    pub async fn list(&self) -> AppResult<Vec<AdminIdentity>> {
        self.repository.admins.list_active().await
    }

    /// Active admin eligible to own requests
    pub async fn get_active(&self, id: Uuid) -> AppResult<AdminIdentity> {
        match self.repository.admins.get_by_id(id).await? {
            Some(admin) if admin.active => Ok(AdminIdentity::from(&admin)),
            _ => Err(AppError::NotFound(format!("Admin {} not found", id))),
        }
    }

    pub async fn update(&self, id: Uuid, patch: &AdminPatch) -> AppResult<AdminIdentity> {
        let patch = patch.clone().normalized();
        patch.validate()?;

        let password_hash = match patch.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };
        let update = AdminUpdate {
            name: patch.name,
            password_hash,
            active: patch.active,
        };

        let admin: Admin = self
            .repository
            .admins
            .update(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin {} not found", id)))?;
        Ok(AdminIdentity::from(&admin))
    }

    /// Create the configured first admin when the directory is empty
    pub async fn bootstrap(&self, config: &BootstrapConfig) -> AppResult<Option<AdminIdentity>> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(None);
        };
        if self.repository.admins.count().await? > 0 {
            return Ok(None);
        }

        let data = CreateAdmin {
            email: email.clone(),
            password: password.clone(),
            name: config
                .admin_name
                .clone()
                .unwrap_or_else(|| "Administrator".to_string()),
        };
        let admin = self.create(&data).await?;
        tracing::warn!(email = %admin.email, "Bootstrap admin created; change its password");
        Ok(Some(admin))
    }
}
