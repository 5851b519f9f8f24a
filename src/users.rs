//! Users
//!
//! Identity, display preferences and the lazily allocated public handle.

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Password length bounds
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// How the public profile lays out posts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewPreference {
    /// Chronological list
    List,
    /// Featured grid
    Grid,
}

/// A single user
#[derive(Clone, Debug)]
pub struct User {
    /// User ID
    pub id: Uuid,

    /// Email address, immutable after registration
    pub email: String,

    /// Public handle, unique and permanent once allocated
    pub username: Option<String>,

    /// Hashed password
    pub hashed_password: String,

    /// Public profile layout
    pub view_preference: ViewPreference,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Soft-deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

/// Normalize and validate an email address
///
/// Lowercased; the shape check is deliberately modest, deliverability is
/// not this layer's problem.
pub fn validate_email(email: &str) -> Result<String, &'static str> {
    let email = email.trim().to_lowercase();

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email address");
    };

    let valid = !local.is_empty()
        && !domain.is_empty()
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');

    if valid {
        Ok(email)
    } else {
        Err("Invalid email address")
    }
}

/// Validate a new password against the length bounds
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters");
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err("Password can not exceed 128 characters");
    }

    Ok(())
}

/// Derive the base for a public handle
///
/// Uses the alphanumerics of the email local part; falls back to a
/// `user` + ID prefix when that leaves too little to work with. Uniqueness
/// is resolved by the caller against the datastore.
pub fn derive_handle_base(email: &str, user_id: &Uuid) -> String {
    let local_part = email.split('@').next().unwrap_or_default();

    let base = local_part
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>();

    if base.len() < 3 {
        format!("user{}", &user_id.to_string()[..5])
    } else {
        base
    }
}
