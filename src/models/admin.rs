//! Admin directory model, session claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Full admin row, including the password hash
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public identity of an admin (never carries the hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdminIdentity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&Admin> for AdminIdentity {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
        }
    }
}

/// Create admin request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAdmin {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be 6 to 128 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,
}

/// Partial admin update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AdminPatch {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 6, max = 128, message = "Password must be 6 to 128 characters"))]
    pub password: Option<String>,
    pub active: Option<bool>,
}

impl CreateAdmin {
    /// Trim the name and canonicalize the email before validation
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        self.name = self.name.trim().to_string();
        self
    }
}

impl AdminPatch {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self
    }
}

/// Row written by the store once the password is hashed
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Store-level update, password already hashed
#[derive(Debug, Clone, Default)]
pub struct AdminUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub active: Option<bool>,
}

/// JWT claims for an admin session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin id
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl AdminClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// Authenticated admin attached to a request.
///
/// Admin-facing operations receive this (or its `admin_id`) explicitly
/// instead of looking up a global session.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AdminSession {
    pub admin_id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<AdminIdentity> for AdminSession {
    fn from(identity: AdminIdentity) -> Self {
        Self {
            admin_id: identity.id,
            email: identity.email,
            name: identity.name,
        }
    }
}
