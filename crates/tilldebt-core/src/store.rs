//! The `DebtStore` trait: the server-side persistence boundary.
//!
//! The trait is implemented by storage backends (e.g. `tilldebt-store-sqlite`).
//! Higher layers (`tilldebt-api`) depend on this abstraction, not on any
//! concrete backend.
//!
//! Every mutating method takes the acting user's id and only touches rows
//! that user owns (or authored). A mismatch is reported as "nothing matched"
//! (`None` / `false`), never as a partial write.

use std::future::Future;

use uuid::Uuid;

use crate::{
  comment::{DebtComment, NewComment},
  debt::{Debt, DebtHistory, DebtPatch, NewDebt},
  profile::PublicUserProfile,
  user::{User, UserCredentials},
};

/// Abstraction over a debt store backend.
///
/// History rows are append-only: they are written by `insert_debt` and by any
/// `update_debt` that sets an amount, in the same transaction as the debt row.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DebtStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user. The email is normalised; a duplicate is an error.
  fn create_user(
    &self,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by email.
  fn user_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Debts ─────────────────────────────────────────────────────────────

  /// All debts owned by `owner`, newest first.
  fn list_debts(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Debt>, Self::Error>> + Send + '_;

  /// Insert a debt owned by `owner` and its creation history entry.
  fn insert_debt(
    &self,
    owner: Uuid,
    input: NewDebt,
  ) -> impl Future<Output = Result<Debt, Self::Error>> + Send + '_;

  /// Apply `patch` to the debt matching both `id` and `owner`. Returns the
  /// updated debt, or `None` if no such row exists.
  fn update_debt(
    &self,
    owner: Uuid,
    id: Uuid,
    patch: DebtPatch,
  ) -> impl Future<Output = Result<Option<Debt>, Self::Error>> + Send + '_;

  /// Delete the debt matching both `id` and `owner`, with its history and
  /// comments. Returns whether a row was deleted.
  fn delete_debt(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// A debt visible to `viewer` (owned by them, or public).
  fn get_debt(
    &self,
    viewer: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Debt>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Balance history of a debt visible to `viewer`, oldest first. Empty if
  /// the debt is missing or invisible.
  fn debt_history(
    &self,
    viewer: Uuid,
    debt_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DebtHistory>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Comments on a debt visible to `viewer`, newest first.
  fn debt_comments(
    &self,
    viewer: Uuid,
    debt_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DebtComment>, Self::Error>> + Send + '_;

  /// Add a comment authored by `author`. Fails if the debt is not visible to
  /// the author or the history entry belongs to another debt.
  fn insert_comment(
    &self,
    author: Uuid,
    input: NewComment,
  ) -> impl Future<Output = Result<DebtComment, Self::Error>> + Send + '_;

  /// Delete the comment matching both `id` and `author`.
  fn delete_comment(
    &self,
    author: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Public aggregates ─────────────────────────────────────────────────

  /// Every user with their public totals, newest account first.
  fn public_user_profiles(
    &self,
  ) -> impl Future<Output = Result<Vec<PublicUserProfile>, Self::Error>> + Send + '_;

  fn public_user_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<PublicUserProfile>, Self::Error>> + Send + '_;

  /// Non-private debts of `user_id`, newest first.
  fn public_debts(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Debt>, Self::Error>> + Send + '_;
}
