//! Client-side debt state.
//!
//! [`DebtContext`] holds the signed-in user, their debt list, and the last
//! recoverable error. It keeps no optimistic cache: every successful mutation
//! is followed by a full re-read of the debt list, and a failed one leaves the
//! list untouched. A failed re-read after a saved write is recorded as the
//! error but does not fail the write.
//!
//! The context talks to a [`DebtBackend`], a session-scoped view of the
//! backend. The HTTP client in `tilldebt-cli` is one; [`ScopedStore`] turns
//! any [`DebtStore`] plus a user id into another.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  achievements::Achievements,
  comment::{DebtComment, NewComment},
  debt::{Debt, DebtHistory, DebtPatch, NewDebt, total_balance},
  store::DebtStore,
  timeline::{ActivityEntry, TotalPoint, TrackedDebt, activity_log, total_debt_series},
  user::User,
};

// ─── Backend trait ───────────────────────────────────────────────────────────

/// The backend as seen by one authenticated session. Ownership is implied by
/// the session, so no method takes a user id.
pub trait DebtBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The user this session is authenticated as, or `None` if the backend
  /// rejects the session.
  fn current_user(&self) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_debts(&self) -> impl Future<Output = Result<Vec<Debt>, Self::Error>> + Send + '_;

  fn insert_debt(
    &self,
    input: NewDebt,
  ) -> impl Future<Output = Result<Debt, Self::Error>> + Send + '_;

  fn update_debt(
    &self,
    id: Uuid,
    patch: DebtPatch,
  ) -> impl Future<Output = Result<Option<Debt>, Self::Error>> + Send + '_;

  fn delete_debt(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_debt(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Debt>, Self::Error>> + Send + '_;

  fn debt_history(
    &self,
    debt_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DebtHistory>, Self::Error>> + Send + '_;

  fn debt_comments(
    &self,
    debt_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DebtComment>, Self::Error>> + Send + '_;

  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<DebtComment, Self::Error>> + Send + '_;

  fn delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── ScopedStore ─────────────────────────────────────────────────────────────

/// A [`DebtStore`] bound to one user, usable as a [`DebtBackend`] when the
/// client and the store live in the same process.
#[derive(Debug, Clone)]
pub struct ScopedStore<S> {
  store:   S,
  user_id: Uuid,
}

impl<S: DebtStore> ScopedStore<S> {
  pub fn new(store: S, user_id: Uuid) -> Self { Self { store, user_id } }

  pub fn user_id(&self) -> Uuid { self.user_id }
}

impl<S: DebtStore> DebtBackend for ScopedStore<S> {
  type Error = S::Error;

  async fn current_user(&self) -> Result<Option<User>, S::Error> {
    self.store.get_user(self.user_id).await
  }

  async fn list_debts(&self) -> Result<Vec<Debt>, S::Error> {
    self.store.list_debts(self.user_id).await
  }

  async fn insert_debt(&self, input: NewDebt) -> Result<Debt, S::Error> {
    self.store.insert_debt(self.user_id, input).await
  }

  async fn update_debt(&self, id: Uuid, patch: DebtPatch) -> Result<Option<Debt>, S::Error> {
    self.store.update_debt(self.user_id, id, patch).await
  }

  async fn delete_debt(&self, id: Uuid) -> Result<bool, S::Error> {
    self.store.delete_debt(self.user_id, id).await
  }

  async fn get_debt(&self, id: Uuid) -> Result<Option<Debt>, S::Error> {
    self.store.get_debt(self.user_id, id).await
  }

  async fn debt_history(&self, debt_id: Uuid) -> Result<Vec<DebtHistory>, S::Error> {
    self.store.debt_history(self.user_id, debt_id).await
  }

  async fn debt_comments(&self, debt_id: Uuid) -> Result<Vec<DebtComment>, S::Error> {
    self.store.debt_comments(self.user_id, debt_id).await
  }

  async fn insert_comment(&self, input: NewComment) -> Result<DebtComment, S::Error> {
    self.store.insert_comment(self.user_id, input).await
  }

  async fn delete_comment(&self, id: Uuid) -> Result<bool, S::Error> {
    self.store.delete_comment(self.user_id, id).await
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ContextError<E> {
  /// Raised before any request is made.
  #[error("You must be logged in to {0}")]
  Unauthenticated(&'static str),

  #[error("invalid credentials")]
  InvalidCredentials,

  /// Nothing matched the id for the signed-in user.
  #[error("not found: {0}")]
  NotFound(Uuid),

  #[error(transparent)]
  Invalid(#[from] crate::Error),

  #[error("{0}")]
  Backend(#[source] E),
}

pub type ContextResult<T, E> = Result<T, ContextError<E>>;

// ─── Overview ────────────────────────────────────────────────────────────────

/// Everything the dashboard derives from the full set of histories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
  pub tracked:      Vec<TrackedDebt>,
  pub series:       Vec<TotalPoint>,
  pub activity:     Vec<ActivityEntry>,
  pub achievements: Achievements,
  pub total:        f64,
}

impl Overview {
  pub fn build(tracked: Vec<TrackedDebt>) -> Self {
    Self {
      series: total_debt_series(&tracked),
      activity: activity_log(&tracked),
      achievements: Achievements::evaluate(&tracked),
      total: total_balance(tracked.iter().map(|t| &t.debt)),
      tracked,
    }
  }
}

// ─── Context ─────────────────────────────────────────────────────────────────

pub struct DebtContext<B: DebtBackend> {
  backend: B,
  user:    Option<User>,
  debts:   Vec<Debt>,
  error:   Option<String>,
}

impl<B: DebtBackend> DebtContext<B> {
  /// A signed-out context. Call [`Self::sign_in`] before mutating.
  pub fn new(backend: B) -> Self {
    Self { backend, user: None, debts: Vec::new(), error: None }
  }

  pub fn backend(&self) -> &B { &self.backend }

  pub fn user(&self) -> Option<&User> { self.user.as_ref() }

  /// The signed-in user's debts, newest first, as of the last refetch.
  pub fn debts(&self) -> &[Debt] { &self.debts }

  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn clear_error(&mut self) { self.error = None; }

  pub fn total(&self) -> f64 { total_balance(&self.debts) }

  // ── Session ───────────────────────────────────────────────────────────────

  pub async fn sign_in(&mut self) -> ContextResult<User, B::Error> {
    let result = self.try_sign_in().await;
    self.settle(result)
  }

  async fn try_sign_in(&mut self) -> ContextResult<User, B::Error> {
    let user = self
      .backend
      .current_user()
      .await
      .map_err(ContextError::Backend)?
      .ok_or(ContextError::InvalidCredentials)?;
    self.user = Some(user.clone());
    self.reload().await?;
    Ok(user)
  }

  pub fn sign_out(&mut self) {
    self.user = None;
    self.debts.clear();
  }

  // ── Debt list ─────────────────────────────────────────────────────────────

  /// Re-read the debt list. With nobody signed in the list is cleared.
  pub async fn refresh(&mut self) -> ContextResult<(), B::Error> {
    let result = self.reload().await;
    self.settle(result)
  }

  async fn reload(&mut self) -> ContextResult<(), B::Error> {
    if self.user.is_none() {
      self.debts.clear();
      return Ok(());
    }
    self.debts = self.backend.list_debts().await.map_err(ContextError::Backend)?;
    Ok(())
  }

  pub async fn add_debt(&mut self, input: NewDebt) -> ContextResult<Debt, B::Error> {
    let result = self.try_add_debt(input).await;
    self.settle(result)
  }

  async fn try_add_debt(&mut self, input: NewDebt) -> ContextResult<Debt, B::Error> {
    self.require_user("add a debt")?;
    let input = input.validated()?;
    let debt = self.backend.insert_debt(input).await.map_err(ContextError::Backend)?;
    self.refetch_after_write().await;
    Ok(debt)
  }

  pub async fn update_debt(&mut self, id: Uuid, patch: DebtPatch) -> ContextResult<Debt, B::Error> {
    let result = self.try_update_debt(id, patch, "update a debt").await;
    self.settle(result)
  }

  pub async fn update_balance(&mut self, id: Uuid, amount: f64) -> ContextResult<Debt, B::Error> {
    let result = self
      .try_update_debt(id, DebtPatch::balance(amount), "update a debt balance")
      .await;
    self.settle(result)
  }

  async fn try_update_debt(
    &mut self,
    id: Uuid,
    patch: DebtPatch,
    action: &'static str,
  ) -> ContextResult<Debt, B::Error> {
    self.require_user(action)?;
    let patch = patch.validated()?;
    let debt = self
      .backend
      .update_debt(id, patch)
      .await
      .map_err(ContextError::Backend)?
      .ok_or(ContextError::NotFound(id))?;
    self.refetch_after_write().await;
    Ok(debt)
  }

  pub async fn delete_debt(&mut self, id: Uuid) -> ContextResult<(), B::Error> {
    let result = self.try_delete_debt(id).await;
    self.settle(result)
  }

  async fn try_delete_debt(&mut self, id: Uuid) -> ContextResult<(), B::Error> {
    self.require_user("delete a debt")?;
    if !self.backend.delete_debt(id).await.map_err(ContextError::Backend)? {
      return Err(ContextError::NotFound(id));
    }
    self.refetch_after_write().await;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn get_debt(&mut self, id: Uuid) -> ContextResult<Option<Debt>, B::Error> {
    let result = match self.require_user("view debt details") {
      Ok(_) => self.backend.get_debt(id).await.map_err(ContextError::Backend),
      Err(e) => Err(e),
    };
    self.settle(result)
  }

  /// Balance history, oldest first.
  pub async fn get_debt_history(&mut self, debt_id: Uuid) -> ContextResult<Vec<DebtHistory>, B::Error> {
    let result = match self.require_user("view debt history") {
      Ok(_) => self.backend.debt_history(debt_id).await.map_err(ContextError::Backend),
      Err(e) => Err(e),
    };
    self.settle(result)
  }

  /// Comments, newest first.
  pub async fn get_debt_comments(&mut self, debt_id: Uuid) -> ContextResult<Vec<DebtComment>, B::Error> {
    let result = match self.require_user("view debt comments") {
      Ok(_) => self.backend.debt_comments(debt_id).await.map_err(ContextError::Backend),
      Err(e) => Err(e),
    };
    self.settle(result)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  pub async fn add_debt_comment(
    &mut self,
    debt_id: Uuid,
    text: &str,
    history_id: Option<Uuid>,
  ) -> ContextResult<DebtComment, B::Error> {
    let result = self.try_add_debt_comment(debt_id, text, history_id).await;
    self.settle(result)
  }

  async fn try_add_debt_comment(
    &self,
    debt_id: Uuid,
    text: &str,
    history_id: Option<Uuid>,
  ) -> ContextResult<DebtComment, B::Error> {
    self.require_user("add a comment")?;
    let input = NewComment { debt_id, debt_history_id: history_id, comment: text.to_owned() }
      .validated()?;
    self.backend.insert_comment(input).await.map_err(ContextError::Backend)
  }

  pub async fn delete_debt_comment(&mut self, id: Uuid) -> ContextResult<(), B::Error> {
    let result = match self.require_user("delete a comment") {
      Ok(_) => match self.backend.delete_comment(id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ContextError::NotFound(id)),
        Err(e) => Err(ContextError::Backend(e)),
      },
      Err(e) => Err(e),
    };
    self.settle(result)
  }

  // ── Derived ───────────────────────────────────────────────────────────────

  /// Fetch every listed debt's history and derive the dashboard data.
  pub async fn overview(&mut self) -> ContextResult<Overview, B::Error> {
    let result = self.try_overview().await;
    self.settle(result)
  }

  async fn try_overview(&self) -> ContextResult<Overview, B::Error> {
    self.require_user("view debt history")?;
    let mut tracked = Vec::with_capacity(self.debts.len());
    for debt in &self.debts {
      let history = self
        .backend
        .debt_history(debt.id)
        .await
        .map_err(ContextError::Backend)?;
      tracked.push(TrackedDebt { debt: debt.clone(), history });
    }
    Ok(Overview::build(tracked))
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  fn require_user(&self, action: &'static str) -> ContextResult<Uuid, B::Error> {
    self
      .user
      .as_ref()
      .map(|u| u.id)
      .ok_or(ContextError::Unauthenticated(action))
  }

  /// The write has already landed, so a failed re-read only lands in the
  /// error slot and the stale list is kept.
  async fn refetch_after_write(&mut self) {
    if let Err(e) = self.reload().await {
      self.error = Some(e.to_string());
    }
  }

  /// Record a failure in the error slot and pass the result through.
  fn settle<T>(&mut self, result: ContextResult<T, B::Error>) -> ContextResult<T, B::Error> {
    if let Err(e) = &result {
      self.error = Some(e.to_string());
    }
    result
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  };

  use chrono::Utc;

  use super::*;

  #[derive(Debug, Error)]
  #[error("backend unavailable")]
  struct Unavailable;

  /// A single-user in-memory backend that counts requests and can be told
  /// to fail.
  struct Memory {
    user:     User,
    debts:    Mutex<Vec<Debt>>,
    history:  Mutex<Vec<DebtHistory>>,
    requests: AtomicUsize,
    failing:  AtomicBool,
    /// Fail only `list_debts`, leaving writes intact.
    failing_lists: AtomicBool,
  }

  impl Memory {
    fn new() -> Self {
      Self {
        user:     User {
          id:         Uuid::new_v4(),
          email:      "me@example.com".into(),
          created_at: Utc::now(),
        },
        debts:    Mutex::new(Vec::new()),
        history:  Mutex::new(Vec::new()),
        requests: AtomicUsize::new(0),
        failing:  AtomicBool::new(false),
        failing_lists: AtomicBool::new(false),
      }
    }

    fn hit(&self) -> Result<(), Unavailable> {
      self.requests.fetch_add(1, Ordering::SeqCst);
      if self.failing.load(Ordering::SeqCst) { Err(Unavailable) } else { Ok(()) }
    }

    fn record(&self, debt: &Debt) {
      self.history.lock().unwrap().push(DebtHistory {
        id:          Uuid::new_v4(),
        debt_id:     debt.id,
        amount:      debt.amount,
        recorded_at: debt.updated_at,
      });
    }
  }

  impl DebtBackend for Memory {
    type Error = Unavailable;

    async fn current_user(&self) -> Result<Option<User>, Unavailable> {
      self.hit()?;
      Ok(Some(self.user.clone()))
    }

    async fn list_debts(&self) -> Result<Vec<Debt>, Unavailable> {
      self.hit()?;
      if self.failing_lists.load(Ordering::SeqCst) {
        return Err(Unavailable);
      }
      let mut debts = self.debts.lock().unwrap().clone();
      debts.reverse();
      Ok(debts)
    }

    async fn insert_debt(&self, input: NewDebt) -> Result<Debt, Unavailable> {
      self.hit()?;
      let now = Utc::now();
      let debt = Debt {
        id:          Uuid::new_v4(),
        user_id:     self.user.id,
        name:        input.name,
        amount:      input.amount,
        private:     input.private,
        created_at:  now,
        updated_at:  now,
        description: input.description,
        category:    input.category,
        color:       input.color,
      };
      self.record(&debt);
      self.debts.lock().unwrap().push(debt.clone());
      Ok(debt)
    }

    async fn update_debt(&self, id: Uuid, patch: DebtPatch) -> Result<Option<Debt>, Unavailable> {
      self.hit()?;
      let mut debts = self.debts.lock().unwrap();
      let Some(debt) = debts.iter_mut().find(|d| d.id == id) else {
        return Ok(None);
      };
      patch.apply(debt, Utc::now());
      if patch.amount.is_some() {
        self.record(debt);
      }
      Ok(Some(debt.clone()))
    }

    async fn delete_debt(&self, id: Uuid) -> Result<bool, Unavailable> {
      self.hit()?;
      let mut debts = self.debts.lock().unwrap();
      let before = debts.len();
      debts.retain(|d| d.id != id);
      Ok(debts.len() != before)
    }

    async fn get_debt(&self, id: Uuid) -> Result<Option<Debt>, Unavailable> {
      self.hit()?;
      Ok(self.debts.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn debt_history(&self, debt_id: Uuid) -> Result<Vec<DebtHistory>, Unavailable> {
      self.hit()?;
      Ok(
        self
          .history
          .lock()
          .unwrap()
          .iter()
          .filter(|h| h.debt_id == debt_id)
          .cloned()
          .collect(),
      )
    }

    async fn debt_comments(&self, _debt_id: Uuid) -> Result<Vec<DebtComment>, Unavailable> {
      self.hit()?;
      Ok(Vec::new())
    }

    async fn insert_comment(&self, input: NewComment) -> Result<DebtComment, Unavailable> {
      self.hit()?;
      Ok(DebtComment {
        id:              Uuid::new_v4(),
        debt_id:         input.debt_id,
        debt_history_id: input.debt_history_id,
        user_id:         self.user.id,
        comment:         input.comment,
        created_at:      Utc::now(),
      })
    }

    async fn delete_comment(&self, _id: Uuid) -> Result<bool, Unavailable> {
      self.hit()?;
      Ok(false)
    }
  }

  async fn signed_in() -> DebtContext<Memory> {
    let mut ctx = DebtContext::new(Memory::new());
    ctx.sign_in().await.unwrap();
    ctx
  }

  #[tokio::test]
  async fn signed_out_mutations_fail_before_any_request() {
    let mut ctx = DebtContext::new(Memory::new());
    let err = ctx.add_debt(NewDebt::new("Visa", 100.0)).await.unwrap_err();
    assert!(matches!(err, ContextError::Unauthenticated(_)));
    assert_eq!(ctx.error(), Some("You must be logged in to add a debt"));
    assert!(ctx.delete_debt(Uuid::new_v4()).await.is_err());
    assert!(ctx.get_debt_history(Uuid::new_v4()).await.is_err());
    assert_eq!(ctx.backend().requests.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn mutations_refetch_the_list() {
    let mut ctx = signed_in().await;
    assert!(ctx.debts().is_empty());

    let visa = ctx.add_debt(NewDebt::new("Visa", 1000.0)).await.unwrap();
    ctx.add_debt(NewDebt::new("Car", 5000.0)).await.unwrap();
    assert_eq!(ctx.debts().len(), 2);
    assert_eq!(ctx.debts()[0].name, "Car");
    assert_eq!(ctx.total(), 6000.0);

    ctx.update_balance(visa.id, 600.0).await.unwrap();
    let listed = ctx.debts().iter().find(|d| d.id == visa.id).unwrap();
    assert_eq!(listed.amount, 600.0);

    ctx.delete_debt(visa.id).await.unwrap();
    assert_eq!(ctx.debts().len(), 1);
    assert!(ctx.get_debt(visa.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn failure_keeps_prior_state_and_records_error() {
    let mut ctx = signed_in().await;
    ctx.add_debt(NewDebt::new("Visa", 1000.0)).await.unwrap();
    let before = ctx.debts().to_vec();

    ctx.backend().failing.store(true, Ordering::SeqCst);
    let err = ctx.add_debt(NewDebt::new("Car", 5000.0)).await.unwrap_err();
    assert!(matches!(err, ContextError::Backend(Unavailable)));
    assert_eq!(ctx.debts(), before.as_slice());
    assert_eq!(ctx.error(), Some("backend unavailable"));

    ctx.clear_error();
    assert!(ctx.error().is_none());
  }

  #[tokio::test]
  async fn failed_refetch_does_not_fail_a_saved_write() {
    let mut ctx = signed_in().await;
    let visa = ctx.add_debt(NewDebt::new("Visa", 1000.0)).await.unwrap();
    ctx.backend().failing_lists.store(true, Ordering::SeqCst);

    let car = ctx.add_debt(NewDebt::new("Car", 100.0)).await.unwrap();
    assert_eq!(car.name, "Car");
    assert_eq!(ctx.backend().debts.lock().unwrap().len(), 2);
    assert_eq!(ctx.debts().len(), 1);
    assert_eq!(ctx.error(), Some("backend unavailable"));

    ctx.clear_error();
    assert!(ctx.update_balance(visa.id, 900.0).await.is_ok());
    assert!(ctx.delete_debt(visa.id).await.is_ok());
    assert_eq!(ctx.error(), Some("backend unavailable"));

    ctx.backend().failing_lists.store(false, Ordering::SeqCst);
    ctx.refresh().await.unwrap();
    assert_eq!(ctx.debts().len(), 1);
    assert_eq!(ctx.debts()[0].id, car.id);
  }

  #[tokio::test]
  async fn unknown_id_is_not_found_and_skips_refetch() {
    let mut ctx = signed_in().await;
    let calls = ctx.backend().requests.load(Ordering::SeqCst);
    let missing = Uuid::new_v4();
    let err = ctx.update_balance(missing, 10.0).await.unwrap_err();
    assert!(matches!(err, ContextError::NotFound(id) if id == missing));
    assert_eq!(ctx.backend().requests.load(Ordering::SeqCst), calls + 1);
  }

  #[tokio::test]
  async fn invalid_input_is_rejected_locally() {
    let mut ctx = signed_in().await;
    let calls = ctx.backend().requests.load(Ordering::SeqCst);
    assert!(matches!(
      ctx.add_debt(NewDebt::new(" ", 10.0)).await,
      Err(ContextError::Invalid(_))
    ));
    assert!(matches!(
      ctx.add_debt_comment(Uuid::new_v4(), "   ", None).await,
      Err(ContextError::Invalid(_))
    ));
    assert_eq!(ctx.backend().requests.load(Ordering::SeqCst), calls);
  }

  #[tokio::test]
  async fn overview_aggregates_histories() {
    let mut ctx = signed_in().await;
    let visa = ctx.add_debt(NewDebt::new("Visa", 1000.0)).await.unwrap();
    ctx.update_balance(visa.id, 600.0).await.unwrap();
    ctx.update_balance(visa.id, 600.0).await.unwrap();

    assert_eq!(ctx.get_debt_history(visa.id).await.unwrap().len(), 3);

    let overview = ctx.overview().await.unwrap();
    assert_eq!(overview.activity.len(), 2);
    assert_eq!(overview.total, 600.0);
    assert_eq!(overview.series.last().map(|p| p.amount), Some(600.0));
    assert!(overview.achievements.first_debt_adjusted);
    assert!(!overview.achievements.debt_paid_off);
  }

  #[tokio::test]
  async fn sign_out_clears_state() {
    let mut ctx = signed_in().await;
    ctx.add_debt(NewDebt::new("Visa", 1.0)).await.unwrap();
    ctx.sign_out();
    assert!(ctx.user().is_none());
    assert!(ctx.debts().is_empty());
    ctx.refresh().await.unwrap();
    assert!(ctx.debts().is_empty());
  }
}
