//! Public, aggregated view of a user. Computed on read, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::debt::Debt;

/// A user as shown to the community. Totals cover non-private debts only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUserProfile {
  pub id:         Uuid,
  pub email:      String,
  pub created_at: DateTime<Utc>,
  pub total_debt: f64,
  pub debt_count: u64,
}

impl PublicUserProfile {
  /// Case-insensitive substring match on the email, as used by the explore
  /// search box. An empty needle matches everyone.
  pub fn matches(&self, needle: &str) -> bool {
    self.email.to_lowercase().contains(&needle.trim().to_lowercase())
  }
}

/// A profile together with the owner's public debts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
  pub profile: PublicUserProfile,
  pub debts:   Vec<Debt>,
}
