//! User identity as seen by the rest of the system.
//!
//! Only the id, email, and creation time are ever exposed. The password hash
//! travels separately in [`UserCredentials`] and is never serialised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// A user together with the argon2 PHC string used to verify their password.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
