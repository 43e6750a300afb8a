//! User domain model.
//!
//! # Invariants
//! - `username` and `email` are unique across the store.
//! - `credential_hash` is opaque to core; it is produced and checked by the
//!   identity collaborator.
//! - Banned users keep their rows (`is_active = false`).

use crate::model::validation::{ModelValidationError, USERNAME_MAX_CHARS, USERNAME_MIN_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Never serialized out of core.
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    /// Epoch ms; assigned by the store.
    pub created_at: i64,
}

impl User {
    /// Builds a new active user with a generated id.
    ///
    /// `created_at` is a placeholder until the row is read back.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        credential_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            credential_hash: credential_hash.into(),
            role,
            is_active: true,
            created_at: 0,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Validates username, email and credential fields.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.credential_hash.trim().is_empty() {
            return Err(ModelValidationError::Blank("credential_hash"));
        }
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ModelValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) || !USERNAME_RE.is_match(username)
    {
        return Err(ModelValidationError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelValidationError> {
    if !EMAIL_RE.is_match(email) {
        return Err(ModelValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}
