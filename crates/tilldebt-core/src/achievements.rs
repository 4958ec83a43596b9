//! Achievement badges derived from balance histories.

use serde::{Deserialize, Serialize};

use crate::{debt::DebtHistory, timeline::TrackedDebt};

/// Number of strictly decreasing steps in a row that earns
/// [`Badge::ConsistentPayments`].
pub const STREAK_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
  FirstDebtCreated,
  FirstDebtAdjusted,
  DebtPaidOff,
  ConsistentPayments,
}

impl Badge {
  pub fn title(self) -> &'static str {
    match self {
      Self::FirstDebtCreated => "First Debt Created",
      Self::FirstDebtAdjusted => "First Debt Adjusted",
      Self::DebtPaidOff => "Debt Paid Off",
      Self::ConsistentPayments => "Consistent Payments",
    }
  }

  pub fn caption(self) -> &'static str {
    match self {
      Self::FirstDebtCreated => "You've started your journey!",
      Self::FirstDebtAdjusted => "You're making progress!",
      Self::DebtPaidOff => "Congratulations!",
      Self::ConsistentPayments => "You're on a streak!",
    }
  }
}

/// Which badges a user has earned. Nothing here is persisted; it is
/// re-evaluated from history whenever it is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievements {
  pub first_debt_created:  bool,
  pub first_debt_adjusted: bool,
  pub debt_paid_off:       bool,
  pub consistent_payments: bool,
}

impl Achievements {
  pub fn evaluate(tracked: &[TrackedDebt]) -> Self {
    Self {
      first_debt_created:  !tracked.is_empty(),
      first_debt_adjusted: tracked.iter().any(|t| t.history.len() > 1),
      debt_paid_off:       tracked.iter().any(|t| paid_off(&t.history)),
      consistent_payments: tracked.iter().any(|t| has_streak(&t.history)),
    }
  }

  /// Earned badges in display order.
  pub fn earned(&self) -> Vec<Badge> {
    [
      (self.first_debt_created, Badge::FirstDebtCreated),
      (self.first_debt_adjusted, Badge::FirstDebtAdjusted),
      (self.debt_paid_off, Badge::DebtPaidOff),
      (self.consistent_payments, Badge::ConsistentPayments),
    ]
    .into_iter()
    .filter_map(|(earned, badge)| earned.then_some(badge))
    .collect()
  }

  pub fn any(&self) -> bool { !self.earned().is_empty() }
}

/// The latest entry is zero and some earlier entry was positive. `history`
/// must be in chronological order.
pub fn paid_off(history: &[DebtHistory]) -> bool {
  match history.split_last() {
    Some((last, earlier)) => last.amount == 0.0 && earlier.iter().any(|h| h.amount > 0.0),
    None => false,
  }
}

/// [`STREAK_LENGTH`] consecutive strictly decreasing steps somewhere in
/// `history` (chronological order).
pub fn has_streak(history: &[DebtHistory]) -> bool {
  let mut run = 0;
  for pair in history.windows(2) {
    if pair[1].amount < pair[0].amount {
      run += 1;
      if run >= STREAK_LENGTH {
        return true;
      }
    } else {
      run = 0;
    }
  }
  false
}
