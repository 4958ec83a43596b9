//! Derived chart series and the activity log.
//!
//! Every function here is a pure pass over already-fetched history rows; no
//! I/O happens in this module.

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::debt::{Debt, DebtHistory};

/// A debt bundled with its balance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDebt {
  pub debt:    Debt,
  pub history: Vec<DebtHistory>,
}

/// One point of the total-debt chart: the sum of every debt's latest balance
/// as of the end of `date` (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalPoint {
  pub date:   NaiveDate,
  pub amount: f64,
}

/// One point of a single debt's balance chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
  pub recorded_at: DateTime<Utc>,
  pub amount:      f64,
}

/// How a balance moved relative to the previous entry for the same debt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "delta", rename_all = "snake_case")]
pub enum Change {
  /// First recorded balance of the debt.
  Added,
  Increase(f64),
  Decrease(f64),
}

impl fmt::Display for Change {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Added => f.write_str("Added"),
      Self::Increase(d) => write!(f, "+${d:.2}"),
      Self::Decrease(d) => write!(f, "-${d:.2}"),
    }
  }
}

/// A row of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub history_id:  Uuid,
  pub debt_id:     Uuid,
  pub debt_name:   String,
  pub recorded_at: DateTime<Utc>,
  pub amount:      f64,
  pub change:      Change,
}

/// A history row tagged with the debt it belongs to.
struct Tagged<'a> {
  debt:  &'a Debt,
  entry: &'a DebtHistory,
}

/// Flatten and sort all history rows by `recorded_at`. The sort is stable, so
/// equal timestamps keep debt order and then history order.
fn merged(tracked: &[TrackedDebt]) -> Vec<Tagged<'_>> {
  let mut rows: Vec<Tagged<'_>> = tracked
    .iter()
    .flat_map(|t| t.history.iter().map(move |entry| Tagged { debt: &t.debt, entry }))
    .collect();
  rows.sort_by_key(|r| r.entry.recorded_at);
  rows
}

/// Build the total-debt series: one point per distinct calendar date on which
/// any debt recorded a balance.
pub fn total_debt_series(tracked: &[TrackedDebt]) -> Vec<TotalPoint> {
  let rows = merged(tracked);
  // Ordered so the floating-point sum is deterministic.
  let mut latest: BTreeMap<Uuid, f64> = BTreeMap::new();
  let mut series: Vec<TotalPoint> = Vec::new();

  let mut i = 0;
  while i < rows.len() {
    let date = rows[i].entry.recorded_at.date_naive();
    while i < rows.len() && rows[i].entry.recorded_at.date_naive() == date {
      latest.insert(rows[i].debt.id, rows[i].entry.amount);
      i += 1;
    }
    series.push(TotalPoint { date, amount: latest.values().sum() });
  }

  series
}

/// Build the activity log, newest first. Writes that leave a debt's balance
/// unchanged are skipped.
pub fn activity_log(tracked: &[TrackedDebt]) -> Vec<ActivityEntry> {
  let mut previous: HashMap<Uuid, f64> = HashMap::new();
  let mut log = Vec::new();

  for row in merged(tracked) {
    let amount = row.entry.amount;
    let change = match previous.insert(row.debt.id, amount) {
      None => Change::Added,
      Some(prev) if amount > prev => Change::Increase(amount - prev),
      Some(prev) if amount < prev => Change::Decrease(prev - amount),
      Some(_) => continue,
    };
    log.push(ActivityEntry {
      history_id: row.entry.id,
      debt_id: row.debt.id,
      debt_name: row.debt.name.clone(),
      recorded_at: row.entry.recorded_at,
      amount,
      change,
    });
  }

  log.reverse();
  log
}

/// A single debt's balance trajectory, oldest first.
pub fn balance_series(history: &[DebtHistory]) -> Vec<BalancePoint> {
  let mut points: Vec<BalancePoint> = history
    .iter()
    .map(|h| BalancePoint { recorded_at: h.recorded_at, amount: h.amount })
    .collect();
  points.sort_by_key(|p| p.recorded_at);
  points
}

#[cfg(test)]
pub(crate) mod tests {
  use chrono::TimeZone;

  use super::*;

  pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
  }

  pub fn tracked(name: &str, entries: &[(DateTime<Utc>, f64)]) -> TrackedDebt {
    let id = Uuid::new_v4();
    let created = entries.first().map(|e| e.0).unwrap_or_else(|| day(1));
    let debt = Debt {
      id,
      user_id: Uuid::nil(),
      name: name.into(),
      amount: entries.last().map(|e| e.1).unwrap_or_default(),
      private: false,
      created_at: created,
      updated_at: created,
      description: None,
      category: None,
      color: None,
    };
    let history = entries
      .iter()
      .map(|&(recorded_at, amount)| DebtHistory {
        id: Uuid::new_v4(),
        debt_id: id,
        amount,
        recorded_at,
      })
      .collect();
    TrackedDebt { debt, history }
  }

  fn date(d: u32) -> NaiveDate { day(d).date_naive() }

  #[test]
  fn no_debts_means_empty_outputs() {
    assert!(total_debt_series(&[]).is_empty());
    assert!(activity_log(&[]).is_empty());
  }

  #[test]
  fn single_entry_is_a_flat_line_from_creation() {
    let visa = tracked("Visa", &[(day(2), 300.0)]);
    let car = tracked("Car", &[(day(1), 1000.0), (day(4), 900.0)]);
    let series = total_debt_series(&[visa, car]);
    assert_eq!(
      series,
      vec![
        TotalPoint { date: date(1), amount: 1000.0 },
        TotalPoint { date: date(2), amount: 1300.0 },
        TotalPoint { date: date(4), amount: 1200.0 },
      ]
    );
  }

  #[test]
  fn same_day_updates_use_the_last_value() {
    let morning = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
    let evening = Utc.with_ymd_and_hms(2024, 3, 5, 20, 0, 0).unwrap();
    let loan = tracked("Loan", &[(day(1), 500.0), (evening, 350.0), (morning, 400.0)]);
    let series = total_debt_series(&[loan]);
    assert_eq!(series.len(), 2);
    assert_eq!(series[1], TotalPoint { date: date(5), amount: 350.0 });
  }

  #[test]
  fn series_matches_latest_balance_per_date() {
    let a = tracked("A", &[(day(1), 100.0), (day(3), 80.0), (day(6), 0.0)]);
    let b = tracked("B", &[(day(2), 50.0), (day(3), 70.0)]);
    let c = tracked("C", &[(day(5), 10.0)]);
    let all = [a, b, c];
    let series = total_debt_series(&all);

    for point in &series {
      let expected: f64 = all
        .iter()
        .filter_map(|t| {
          t.history
            .iter()
            .filter(|h| h.recorded_at.date_naive() <= point.date)
            .max_by_key(|h| h.recorded_at)
            .map(|h| h.amount)
        })
        .sum();
      assert_eq!(point.amount, expected, "on {}", point.date);
    }
    let dates: Vec<_> = series.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![date(1), date(2), date(3), date(5), date(6)]);
  }

  #[test]
  fn unchanged_balance_is_not_logged() {
    let debt = tracked("Visa", &[(day(1), 1000.0), (day(3), 600.0), (day(5), 600.0)]);
    let log = activity_log(&[debt]);
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].change, Change::Decrease(400.0));
    assert_eq!(log[0].recorded_at, day(3));
    assert_eq!(log[1].change, Change::Added);
    assert_eq!(log[1].amount, 1000.0);
  }

  #[test]
  fn every_debt_gets_its_own_added_entry() {
    let a = tracked("A", &[(day(1), 0.0)]);
    let b = tracked("B", &[(day(2), 250.0), (day(4), 300.0)]);
    let log = activity_log(&[a, b]);
    let changes: Vec<_> = log.iter().map(|e| (e.debt_name.as_str(), e.change)).collect();
    assert_eq!(
      changes,
      vec![("B", Change::Increase(50.0)), ("B", Change::Added), ("A", Change::Added)]
    );
  }

  #[test]
  fn change_display() {
    assert_eq!(Change::Added.to_string(), "Added");
    assert_eq!(Change::Increase(50.0).to_string(), "+$50.00");
    assert_eq!(Change::Decrease(12.5).to_string(), "-$12.50");
  }

  #[test]
  fn balance_series_is_sorted() {
    let t = tracked("X", &[(day(4), 3.0), (day(1), 1.0), (day(2), 2.0)]);
    let amounts: Vec<_> = balance_series(&t.history).iter().map(|p| p.amount).collect();
    assert_eq!(amounts, vec![1.0, 2.0, 3.0]);
  }
}
