//! Debts, their categories, and the append-only balance history.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// The kind of debt, with a default swatch colour for charts and lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtCategory {
  CreditCards,
  StudentLoans,
  CarLoan,
  Mortgage,
  PersonalLoan,
  MedicalDebt,
  Other,
}

impl DebtCategory {
  pub const ALL: [DebtCategory; 7] = [
    Self::CreditCards,
    Self::StudentLoans,
    Self::CarLoan,
    Self::Mortgage,
    Self::PersonalLoan,
    Self::MedicalDebt,
    Self::Other,
  ];

  /// The string stored in the `category` column and used on the wire.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::CreditCards => "credit_cards",
      Self::StudentLoans => "student_loans",
      Self::CarLoan => "car_loan",
      Self::Mortgage => "mortgage",
      Self::PersonalLoan => "personal_loan",
      Self::MedicalDebt => "medical_debt",
      Self::Other => "other",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::CreditCards => "Credit Cards",
      Self::StudentLoans => "Student Loans",
      Self::CarLoan => "Car Loan",
      Self::Mortgage => "Mortgage",
      Self::PersonalLoan => "Personal Loan",
      Self::MedicalDebt => "Medical Debt",
      Self::Other => "Other",
    }
  }

  /// Default `#RRGGBB` colour used when a debt is created without one.
  pub fn color(self) -> &'static str {
    match self {
      Self::CreditCards => "#94A3B8",
      Self::StudentLoans => "#64748B",
      Self::CarLoan => "#475569",
      Self::Mortgage => "#334155",
      Self::PersonalLoan => "#1E293B",
      Self::MedicalDebt => "#0F172A",
      Self::Other => "#020617",
    }
  }
}

impl fmt::Display for DebtCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for DebtCategory {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| Error::UnknownCategory(s.to_owned()))
  }
}

// ─── Debt ────────────────────────────────────────────────────────────────────

/// A single debt owned by exactly one user. `amount` is the current balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub name:        String,
  pub amount:      f64,
  pub private:     bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub description: Option<String>,
  pub category:    Option<DebtCategory>,
  pub color:       Option<String>,
}

impl Debt {
  /// Whether `viewer` may read this debt: owners always, everyone else only
  /// when it is public.
  pub fn visible_to(&self, viewer: Uuid) -> bool {
    self.user_id == viewer || !self.private
  }
}

/// Sum of the current balances of `debts`.
pub fn total_balance<'a>(debts: impl IntoIterator<Item = &'a Debt>) -> f64 {
  debts.into_iter().map(|d| d.amount).sum()
}

// ─── NewDebt ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::DebtStore::insert_debt`]. Ownership and timestamps
/// are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDebt {
  pub name:        String,
  pub amount:      f64,
  #[serde(default)]
  pub private:     bool,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category:    Option<DebtCategory>,
  #[serde(default)]
  pub color:       Option<String>,
}

impl NewDebt {
  /// Convenience constructor with all optional fields unset.
  pub fn new(name: impl Into<String>, amount: f64) -> Self {
    Self {
      name: name.into(),
      amount,
      private: false,
      description: None,
      category: None,
      color: None,
    }
  }

  /// Check the input and fill in derived defaults (trimmed name, category
  /// colour when none was given).
  pub fn validated(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    if self.name.is_empty() {
      return Err(Error::InvalidDebt("name must not be empty".into()));
    }
    validate_amount(self.amount)?;
    if self.color.is_none() {
      self.color = self.category.map(|c| c.color().to_owned());
    }
    Ok(self)
  }
}

// ─── DebtPatch ───────────────────────────────────────────────────────────────

/// A partial update. `None` fields are left untouched. Setting `amount`
/// always appends a history entry, even if the value is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtPatch {
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default)]
  pub amount:      Option<f64>,
  #[serde(default)]
  pub private:     Option<bool>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub category:    Option<DebtCategory>,
  #[serde(default)]
  pub color:       Option<String>,
}

impl DebtPatch {
  pub fn balance(amount: f64) -> Self {
    Self { amount: Some(amount), ..Self::default() }
  }

  pub fn privacy(private: bool) -> Self {
    Self { private: Some(private), ..Self::default() }
  }

  pub fn validated(mut self) -> Result<Self> {
    if let Some(name) = self.name.take() {
      let name = name.trim().to_owned();
      if name.is_empty() {
        return Err(Error::InvalidDebt("name must not be empty".into()));
      }
      self.name = Some(name);
    }
    if let Some(amount) = self.amount {
      validate_amount(amount)?;
    }
    Ok(self)
  }

  /// Apply this patch to `debt` in memory, stamping `updated_at` with `now`.
  pub fn apply(&self, debt: &mut Debt, now: DateTime<Utc>) {
    if let Some(name) = &self.name {
      debt.name = name.clone();
    }
    if let Some(amount) = self.amount {
      debt.amount = amount;
    }
    if let Some(private) = self.private {
      debt.private = private;
    }
    if let Some(description) = &self.description {
      debt.description = Some(description.clone());
    }
    if let Some(category) = self.category {
      debt.category = Some(category);
    }
    if let Some(color) = &self.color {
      debt.color = Some(color.clone());
    }
    debt.updated_at = now;
  }
}

fn validate_amount(amount: f64) -> Result<()> {
  if !amount.is_finite() || amount < 0.0 {
    return Err(Error::InvalidDebt(format!(
      "amount must be a non-negative number, got {amount}"
    )));
  }
  Ok(())
}

// ─── History ─────────────────────────────────────────────────────────────────

/// One recorded balance of a debt. Written at creation and on every balance
/// write; never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtHistory {
  pub id:          Uuid,
  pub debt_id:     Uuid,
  pub amount:      f64,
  pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_round_trips_through_str() {
    for c in DebtCategory::ALL {
      assert_eq!(c.as_str().parse::<DebtCategory>().unwrap(), c);
    }
    assert!("payday".parse::<DebtCategory>().is_err());
  }

  #[test]
  fn new_debt_takes_category_color() {
    let mut input = NewDebt::new("  Visa  ", 1200.0);
    input.category = Some(DebtCategory::CreditCards);
    let input = input.validated().unwrap();
    assert_eq!(input.name, "Visa");
    assert_eq!(input.color.as_deref(), Some("#94A3B8"));
  }

  #[test]
  fn explicit_color_is_kept() {
    let mut input = NewDebt::new("Car", 9000.0);
    input.category = Some(DebtCategory::CarLoan);
    input.color = Some("#FF0000".into());
    assert_eq!(input.validated().unwrap().color.as_deref(), Some("#FF0000"));
  }

  #[test]
  fn rejects_blank_name_and_bad_amounts() {
    assert!(NewDebt::new("   ", 10.0).validated().is_err());
    assert!(NewDebt::new("Loan", -1.0).validated().is_err());
    assert!(NewDebt::new("Loan", f64::NAN).validated().is_err());
    assert!(NewDebt::new("Loan", 0.0).validated().is_ok());
    assert!(DebtPatch::balance(f64::INFINITY).validated().is_err());
  }

  #[test]
  fn patch_applies_only_set_fields() {
    let now = Utc::now();
    let mut debt = Debt {
      id:          Uuid::new_v4(),
      user_id:     Uuid::new_v4(),
      name:        "Visa".into(),
      amount:      500.0,
      private:     false,
      created_at:  now,
      updated_at:  now,
      description: Some("old".into()),
      category:    None,
      color:       None,
    };
    let later = now + chrono::Duration::minutes(5);
    DebtPatch::privacy(true).apply(&mut debt, later);
    assert!(debt.private);
    assert_eq!(debt.amount, 500.0);
    assert_eq!(debt.description.as_deref(), Some("old"));
    assert_eq!(debt.updated_at, later);
  }

  #[test]
  fn category_serialises_snake_case() {
    let json = serde_json::to_string(&DebtCategory::StudentLoans).unwrap();
    assert_eq!(json, "\"student_loans\"");
  }
}
