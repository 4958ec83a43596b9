//! Integration tests for `SqliteStore` against an in-memory database.

use tilldebt_core::{
  comment::NewComment,
  context::{DebtContext, ScopedStore},
  debt::{DebtCategory, DebtPatch, NewDebt},
  store::DebtStore,
  user::User,
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, email: &str) -> User {
  s.create_user(email.into(), "$argon2id$stub".into())
    .await
    .expect("create user")
}

fn private(name: &str, amount: f64) -> NewDebt {
  NewDebt { private: true, ..NewDebt::new(name, amount) }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_user_normalises_email() {
  let s = store().await;
  let u = user(&s, "  Alice@Example.COM ").await;
  assert_eq!(u.email, "alice@example.com");

  let creds = s.user_credentials("ALICE@example.com").await.unwrap().unwrap();
  assert_eq!(creds.user.id, u.id);
  assert_eq!(creds.password_hash, "$argon2id$stub");

  let fetched = s.get_user(u.id).await.unwrap().unwrap();
  assert_eq!(fetched, u);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  user(&s, "bob@example.com").await;
  let err = s
    .create_user("BOB@example.com".into(), "x".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tilldebt_core::Error::EmailTaken(_))));
}

#[tokio::test]
async fn unknown_user_is_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.user_credentials("nobody@example.com").await.unwrap().is_none());
}

// ─── Debts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_debt_writes_creation_history() {
  let s = store().await;
  let u = user(&s, "a@example.com").await;

  let mut input = NewDebt::new("Visa", 1200.0);
  input.category = Some(DebtCategory::CreditCards);
  let debt = s.insert_debt(u.id, input).await.unwrap();
  assert_eq!(debt.color.as_deref(), Some(DebtCategory::CreditCards.color()));

  let history = s.debt_history(u.id, debt.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].amount, 1200.0);
  assert_eq!(history[0].recorded_at, debt.created_at);

  let listed = s.list_debts(u.id).await.unwrap();
  assert_eq!(listed, vec![debt]);
}

#[tokio::test]
async fn invalid_debt_is_rejected_before_writing() {
  let s = store().await;
  let u = user(&s, "a@example.com").await;
  let err = s.insert_debt(u.id, NewDebt::new("  ", 5.0)).await.unwrap_err();
  assert!(matches!(err, Error::Core(tilldebt_core::Error::InvalidDebt(_))));
  assert!(s.list_debts(u.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_debts_is_newest_first_and_per_owner() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  let b = user(&s, "b@example.com").await;
  let first = s.insert_debt(a.id, NewDebt::new("First", 1.0)).await.unwrap();
  let second = s.insert_debt(a.id, NewDebt::new("Second", 2.0)).await.unwrap();
  s.insert_debt(b.id, NewDebt::new("Other", 3.0)).await.unwrap();

  let ids: Vec<_> = s.list_debts(a.id).await.unwrap().iter().map(|d| d.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn every_balance_write_appends_history() {
  let s = store().await;
  let u = user(&s, "a@example.com").await;
  let debt = s.insert_debt(u.id, NewDebt::new("Car", 9000.0)).await.unwrap();

  for amount in [8500.0, 8500.0, 8000.0] {
    s.update_debt(u.id, debt.id, DebtPatch::balance(amount))
      .await
      .unwrap()
      .unwrap();
  }
  // A patch without an amount leaves history alone.
  let renamed = s
    .update_debt(u.id, debt.id, DebtPatch { name: Some("Auto".into()), ..DebtPatch::default() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "Auto");
  assert_eq!(renamed.amount, 8000.0);
  assert!(renamed.updated_at >= debt.updated_at);

  let history = s.debt_history(u.id, debt.id).await.unwrap();
  let amounts: Vec<_> = history.iter().map(|h| h.amount).collect();
  assert_eq!(amounts, vec![9000.0, 8500.0, 8500.0, 8000.0]);
  assert!(history.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));
}

#[tokio::test]
async fn mutations_by_non_owner_match_nothing() {
  let s = store().await;
  let owner = user(&s, "owner@example.com").await;
  let other = user(&s, "other@example.com").await;
  let debt = s.insert_debt(owner.id, NewDebt::new("Loan", 100.0)).await.unwrap();

  let updated = s
    .update_debt(other.id, debt.id, DebtPatch::balance(0.0))
    .await
    .unwrap();
  assert!(updated.is_none());
  assert!(!s.delete_debt(other.id, debt.id).await.unwrap());

  let still = s.get_debt(owner.id, debt.id).await.unwrap().unwrap();
  assert_eq!(still.amount, 100.0);
  assert_eq!(s.debt_history(owner.id, debt.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_history_and_comments() {
  let s = store().await;
  let u = user(&s, "a@example.com").await;
  let debt = s.insert_debt(u.id, NewDebt::new("Loan", 100.0)).await.unwrap();
  s.insert_comment(u.id, NewComment::new(debt.id, "hello")).await.unwrap();

  assert!(s.delete_debt(u.id, debt.id).await.unwrap());
  assert!(s.get_debt(u.id, debt.id).await.unwrap().is_none());
  assert!(s.debt_history(u.id, debt.id).await.unwrap().is_empty());
  assert!(s.debt_comments(u.id, debt.id).await.unwrap().is_empty());
  assert!(!s.delete_debt(u.id, debt.id).await.unwrap());
}

#[tokio::test]
async fn private_debts_are_hidden_from_other_users() {
  let s = store().await;
  let owner = user(&s, "owner@example.com").await;
  let other = user(&s, "other@example.com").await;
  let hidden = s.insert_debt(owner.id, private("Secret", 50.0)).await.unwrap();
  let shown = s.insert_debt(owner.id, NewDebt::new("Open", 70.0)).await.unwrap();

  assert!(s.get_debt(owner.id, hidden.id).await.unwrap().is_some());
  assert!(s.get_debt(other.id, hidden.id).await.unwrap().is_none());
  assert!(s.debt_history(other.id, hidden.id).await.unwrap().is_empty());
  assert!(s.get_debt(other.id, shown.id).await.unwrap().is_some());
  assert_eq!(s.debt_history(other.id, shown.id).await.unwrap().len(), 1);

  // Making it private takes effect immediately.
  s.update_debt(owner.id, shown.id, DebtPatch::privacy(true))
    .await
    .unwrap()
    .unwrap();
  assert!(s.get_debt(other.id, shown.id).await.unwrap().is_none());
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_are_newest_first_and_author_deletable() {
  let s = store().await;
  let owner = user(&s, "owner@example.com").await;
  let friend = user(&s, "friend@example.com").await;
  let debt = s.insert_debt(owner.id, NewDebt::new("Loan", 100.0)).await.unwrap();

  let first = s
    .insert_comment(friend.id, NewComment::new(debt.id, "  keep going  "))
    .await
    .unwrap();
  assert_eq!(first.comment, "keep going");
  assert_eq!(first.user_id, friend.id);
  let second = s
    .insert_comment(owner.id, NewComment::new(debt.id, "thanks"))
    .await
    .unwrap();

  let ids: Vec<_> = s
    .debt_comments(friend.id, debt.id)
    .await
    .unwrap()
    .iter()
    .map(|c| c.id)
    .collect();
  assert_eq!(ids, vec![second.id, first.id]);

  assert!(!s.delete_comment(owner.id, first.id).await.unwrap());
  assert!(s.delete_comment(friend.id, first.id).await.unwrap());
  assert_eq!(s.debt_comments(owner.id, debt.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn comment_on_activity_must_match_debt() {
  let s = store().await;
  let u = user(&s, "a@example.com").await;
  let a = s.insert_debt(u.id, NewDebt::new("A", 10.0)).await.unwrap();
  let b = s.insert_debt(u.id, NewDebt::new("B", 20.0)).await.unwrap();
  let a_history = s.debt_history(u.id, a.id).await.unwrap()[0].id;

  let ok = s
    .insert_comment(u.id, NewComment::on_activity(a.id, a_history, "first!"))
    .await
    .unwrap();
  assert_eq!(ok.debt_history_id, Some(a_history));

  let err = s
    .insert_comment(u.id, NewComment::on_activity(b.id, a_history, "wrong"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(tilldebt_core::Error::HistoryNotFound { .. })
  ));
}

#[tokio::test]
async fn cannot_comment_on_invisible_or_blank() {
  let s = store().await;
  let owner = user(&s, "owner@example.com").await;
  let other = user(&s, "other@example.com").await;
  let hidden = s.insert_debt(owner.id, private("Secret", 5.0)).await.unwrap();

  let err = s
    .insert_comment(other.id, NewComment::new(hidden.id, "peek"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tilldebt_core::Error::DebtNotFound(_))));

  let err = s
    .insert_comment(owner.id, NewComment::new(hidden.id, "   "))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tilldebt_core::Error::InvalidComment(_))));
}

// ─── Public aggregates ───────────────────────────────────────────────────────

#[tokio::test]
async fn profiles_only_count_public_debts() {
  let s = store().await;
  let a = user(&s, "a@example.com").await;
  let b = user(&s, "b@example.com").await;
  s.insert_debt(a.id, NewDebt::new("Visa", 100.0)).await.unwrap();
  s.insert_debt(a.id, NewDebt::new("Car", 250.5)).await.unwrap();
  s.insert_debt(a.id, private("Secret", 1000.0)).await.unwrap();

  let profiles = s.public_user_profiles().await.unwrap();
  let ids: Vec<_> = profiles.iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![b.id, a.id]);

  assert_eq!(profiles[1].total_debt, 350.5);
  assert_eq!(profiles[1].debt_count, 2);
  assert_eq!(profiles[0].total_debt, 0.0);
  assert_eq!(profiles[0].debt_count, 0);

  let single = s.public_user_profile(a.id).await.unwrap().unwrap();
  assert_eq!(single, profiles[1]);
  assert!(s.public_user_profile(Uuid::new_v4()).await.unwrap().is_none());

  let debts = s.public_debts(a.id).await.unwrap();
  let names: Vec<_> = debts.iter().map(|d| d.name.as_str()).collect();
  assert_eq!(names, vec!["Car", "Visa"]);
}

// ─── Context over the store ──────────────────────────────────────────────────

#[tokio::test]
async fn context_drives_a_scoped_store() {
  let s = store().await;
  let u = user(&s, "a@example.com").await;
  let mut ctx = DebtContext::new(ScopedStore::new(s.clone(), u.id));

  let signed_in = ctx.sign_in().await.unwrap();
  assert_eq!(signed_in.id, u.id);

  let debt = ctx.add_debt(NewDebt::new("Visa", 400.0)).await.unwrap();
  ctx.update_balance(debt.id, 300.0).await.unwrap();
  ctx.update_balance(debt.id, 200.0).await.unwrap();
  ctx.update_balance(debt.id, 100.0).await.unwrap();
  assert_eq!(ctx.total(), 100.0);

  let overview = ctx.overview().await.unwrap();
  assert_eq!(overview.activity.len(), 4);
  assert!(overview.achievements.consistent_payments);
  assert!(!overview.achievements.debt_paid_off);

  ctx.update_balance(debt.id, 0.0).await.unwrap();
  assert!(ctx.overview().await.unwrap().achievements.debt_paid_off);

  ctx.delete_debt(debt.id).await.unwrap();
  assert!(ctx.debts().is_empty());
  assert!(ctx.error().is_none());
}
