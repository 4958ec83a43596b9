//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order equals chronological order. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use tilldebt_core::{
  comment::DebtComment,
  debt::{Debt, DebtCategory, DebtHistory},
  profile::PublicUserProfile,
  user::{User, UserCredentials},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`read_debt`].
pub const DEBT_COLUMNS: &str = "debt_id, user_id, name, amount, private, created_at, \
                                updated_at, description, category, color";

/// Raw values read directly from a `debts` row.
pub struct RawDebt {
  pub debt_id:     String,
  pub user_id:     String,
  pub name:        String,
  pub amount:      f64,
  pub private:     bool,
  pub created_at:  String,
  pub updated_at:  String,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub color:       Option<String>,
}

pub fn read_debt(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDebt> {
  Ok(RawDebt {
    debt_id:     row.get(0)?,
    user_id:     row.get(1)?,
    name:        row.get(2)?,
    amount:      row.get(3)?,
    private:     row.get(4)?,
    created_at:  row.get(5)?,
    updated_at:  row.get(6)?,
    description: row.get(7)?,
    category:    row.get(8)?,
    color:       row.get(9)?,
  })
}

impl RawDebt {
  pub fn into_debt(self) -> Result<Debt> {
    Ok(Debt {
      id:          decode_uuid(&self.debt_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      name:        self.name,
      amount:      self.amount,
      private:     self.private,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
      description: self.description,
      category:    self
        .category
        .as_deref()
        .map(str::parse::<DebtCategory>)
        .transpose()?,
      color:       self.color,
    })
  }
}

/// Raw values read directly from a `debt_history` row.
pub struct RawHistory {
  pub history_id:  String,
  pub debt_id:     String,
  pub amount:      f64,
  pub recorded_at: String,
}

pub fn read_history(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawHistory> {
  Ok(RawHistory {
    history_id:  row.get(0)?,
    debt_id:     row.get(1)?,
    amount:      row.get(2)?,
    recorded_at: row.get(3)?,
  })
}

impl RawHistory {
  pub fn into_history(self) -> Result<DebtHistory> {
    Ok(DebtHistory {
      id:          decode_uuid(&self.history_id)?,
      debt_id:     decode_uuid(&self.debt_id)?,
      amount:      self.amount,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `debt_comments` row.
pub struct RawComment {
  pub comment_id: String,
  pub debt_id:    String,
  pub history_id: Option<String>,
  pub user_id:    String,
  pub comment:    String,
  pub created_at: String,
}

pub fn read_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawComment> {
  Ok(RawComment {
    comment_id: row.get(0)?,
    debt_id:    row.get(1)?,
    history_id: row.get(2)?,
    user_id:    row.get(3)?,
    comment:    row.get(4)?,
    created_at: row.get(5)?,
  })
}

impl RawComment {
  pub fn into_comment(self) -> Result<DebtComment> {
    Ok(DebtComment {
      id:              decode_uuid(&self.comment_id)?,
      debt_id:         decode_uuid(&self.debt_id)?,
      debt_history_id: self.history_id.as_deref().map(decode_uuid).transpose()?,
      user_id:         decode_uuid(&self.user_id)?,
      comment:         self.comment,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

pub fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    email:         row.get(1)?,
    password_hash: row.get(2)?,
    created_at:    row.get(3)?,
  })
}

impl RawUser {
  pub fn into_credentials(self) -> Result<UserCredentials> {
    Ok(UserCredentials {
      user:          User {
        id:         decode_uuid(&self.user_id)?,
        email:      self.email,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}

/// Raw values from the public-profile aggregate query.
pub struct RawProfile {
  pub user_id:    String,
  pub email:      String,
  pub created_at: String,
  pub total_debt: f64,
  pub debt_count: i64,
}

pub fn read_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProfile> {
  Ok(RawProfile {
    user_id:    row.get(0)?,
    email:      row.get(1)?,
    created_at: row.get(2)?,
    total_debt: row.get(3)?,
    debt_count: row.get(4)?,
  })
}

impl RawProfile {
  pub fn into_profile(self) -> Result<PublicUserProfile> {
    Ok(PublicUserProfile {
      id:         decode_uuid(&self.user_id)?,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
      total_debt: self.total_debt,
      debt_count: self.debt_count.max(0) as u64,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let whole = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = whole + chrono::Duration::microseconds(1);
    assert!(encode_dt(whole) < encode_dt(later));
    assert_eq!(encode_dt(whole), "2024-01-01T00:00:00.000000Z");
    assert_eq!(decode_dt(&encode_dt(later)).unwrap(), later);
  }
}
