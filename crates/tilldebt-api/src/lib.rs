//! JSON REST API for Till Debt Do Us Part.
//!
//! Exposes an axum [`Router`] backed by any [`tilldebt_core::store::DebtStore`].
//! Every route except signup requires HTTP Basic credentials; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tilldebt_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod comments;
pub mod debts;
pub mod error;
pub mod profiles;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use tilldebt_core::store::DebtStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DebtStore + 'static,
{
  Router::new()
    // Session
    .route("/auth/signup", post(session::signup::<S>))
    .route("/auth/session", get(session::session))
    // Debts
    .route("/debts", get(debts::list::<S>).post(debts::create::<S>))
    .route(
      "/debts/{id}",
      get(debts::get_one::<S>)
        .patch(debts::update::<S>)
        .delete(debts::delete::<S>),
    )
    .route("/debts/{id}/balance", put(debts::set_balance::<S>))
    .route("/debts/{id}/history", get(debts::history::<S>))
    // Comments
    .route(
      "/debts/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    .route("/comments/{id}", delete(comments::delete::<S>))
    // Profiles
    .route("/profiles", get(profiles::list::<S>))
    .route("/profiles/{id}", get(profiles::get_one::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use serde_json::{Value, json};
  use tilldebt_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  fn basic(email: &str, password: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{password}")))
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// Sign up `email` with password `pw` and return its auth header.
  async fn signup(app: &Router, email: &str) -> String {
    let (status, _) = send(
      app,
      "POST",
      "/auth/signup",
      None,
      Some(json!({ "email": email, "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    basic(email, "pw")
  }

  async fn create_debt(app: &Router, auth: &str, body: Value) -> Value {
    let (status, debt) = send(app, "POST", "/debts", Some(auth), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{debt}");
    debt
  }

  // ── Session ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn signup_and_session() {
    let app = app().await;
    let auth = signup(&app, "Alice@Example.com").await;

    let (status, user) = send(&app, "GET", "/auth/session", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "alice@example.com");
    assert!(user.get("password_hash").is_none());

    let (status, _) = send(
      &app,
      "POST",
      "/auth/signup",
      None,
      Some(json!({ "email": "alice@example.com", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
      &app,
      "POST",
      "/auth/signup",
      None,
      Some(json!({ "email": "  ", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn bad_credentials_are_401() {
    let app = app().await;
    signup(&app, "a@example.com").await;

    let req = Request::builder().uri("/debts").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let wrong = basic("a@example.com", "nope");
    let (status, body) = send(&app, "GET", "/debts", Some(&wrong), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
  }

  // ── Debts ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn debt_lifecycle() {
    let app = app().await;
    let auth = signup(&app, "a@example.com").await;

    let debt = create_debt(
      &app,
      &auth,
      json!({ "name": "Visa", "amount": 1000.0, "category": "credit_cards" }),
    )
    .await;
    assert_eq!(debt["color"], "#94A3B8");
    let id = debt["id"].as_str().unwrap().to_owned();

    let (status, updated) = send(
      &app,
      "PUT",
      &format!("/debts/{id}/balance"),
      Some(&auth),
      Some(json!({ "amount": 600.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 600.0);

    let (_, history) = send(&app, "GET", &format!("/debts/{id}/history"), Some(&auth), None).await;
    let amounts: Vec<_> = history
      .as_array()
      .unwrap()
      .iter()
      .map(|h| h["amount"].as_f64().unwrap())
      .collect();
    assert_eq!(amounts, vec![1000.0, 600.0]);

    let (status, patched) = send(
      &app,
      "PATCH",
      &format!("/debts/{id}"),
      Some(&auth),
      Some(json!({ "private": true, "description": "store card" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["private"], true);
    assert_eq!(patched["amount"], 600.0);

    let (_, list) = send(&app, "GET", "/debts", Some(&auth), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/debts/{id}"), Some(&auth), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/debts/{id}"), Some(&auth), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn invalid_debts_are_400() {
    let app = app().await;
    let auth = signup(&app, "a@example.com").await;
    let (status, body) = send(
      &app,
      "POST",
      "/debts",
      Some(&auth),
      Some(json!({ "name": "Loan", "amount": -5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("amount"));
  }

  #[tokio::test]
  async fn other_users_cannot_touch_a_debt() {
    let app = app().await;
    let owner = signup(&app, "owner@example.com").await;
    let other = signup(&app, "other@example.com").await;

    let public = create_debt(&app, &owner, json!({ "name": "Open", "amount": 10.0 })).await;
    let hidden = create_debt(
      &app,
      &owner,
      json!({ "name": "Secret", "amount": 20.0, "private": true }),
    )
    .await;
    let public_id = public["id"].as_str().unwrap();
    let hidden_id = hidden["id"].as_str().unwrap();

    let (status, _) = send(&app, "GET", &format!("/debts/{public_id}"), Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/debts/{hidden_id}"), Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
      &app,
      "PUT",
      &format!("/debts/{public_id}/balance"),
      Some(&other),
      Some(json!({ "amount": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
      send(&app, "DELETE", &format!("/debts/{public_id}"), Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, "GET", "/debts", Some(&other), None).await;
    assert!(list.as_array().unwrap().is_empty());
  }

  // ── Comments ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn comments_on_debts_and_activity() {
    let app = app().await;
    let owner = signup(&app, "owner@example.com").await;
    let friend = signup(&app, "friend@example.com").await;

    let debt = create_debt(&app, &owner, json!({ "name": "Car", "amount": 500.0 })).await;
    let id = debt["id"].as_str().unwrap().to_owned();
    let (_, history) = send(&app, "GET", &format!("/debts/{id}/history"), Some(&owner), None).await;
    let history_id = history[0]["id"].as_str().unwrap().to_owned();

    let (status, general) = send(
      &app,
      "POST",
      &format!("/debts/{id}/comments"),
      Some(&friend),
      Some(json!({ "comment": "good luck" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
      &app,
      "POST",
      &format!("/debts/{id}/comments"),
      Some(&friend),
      Some(json!({ "comment": "nice start", "debt_history_id": history_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, all) = send(&app, "GET", &format!("/debts/{id}/comments"), Some(&owner), None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, on_activity) = send(
      &app,
      "GET",
      &format!("/debts/{id}/comments?history_id={history_id}"),
      Some(&owner),
      None,
    )
    .await;
    let on_activity = on_activity.as_array().unwrap();
    assert_eq!(on_activity.len(), 1);
    assert_eq!(on_activity[0]["comment"], "nice start");

    let (status, _) = send(
      &app,
      "POST",
      &format!("/debts/{id}/comments"),
      Some(&friend),
      Some(json!({ "comment": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let comment_id = general["id"].as_str().unwrap();
    let (status, _) =
      send(&app, "DELETE", &format!("/comments/{comment_id}"), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
      send(&app, "DELETE", &format!("/comments/{comment_id}"), Some(&friend), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  // ── Profiles ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn profiles_show_public_debts_only() {
    let app = app().await;
    let alice = signup(&app, "alice@example.com").await;
    let bob = signup(&app, "bob@example.com").await;
    create_debt(&app, &alice, json!({ "name": "Visa", "amount": 100.0 })).await;
    create_debt(&app, &alice, json!({ "name": "Secret", "amount": 900.0, "private": true }))
      .await;

    let (_, everyone) = send(&app, "GET", "/profiles", Some(&bob), None).await;
    assert_eq!(everyone.as_array().unwrap().len(), 2);

    let (_, found) = send(&app, "GET", "/profiles?search=ALI", Some(&bob), None).await;
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["total_debt"], 100.0);
    assert_eq!(found[0]["debt_count"], 1);

    let alice_id = found[0]["id"].as_str().unwrap();
    let (status, view) = send(&app, "GET", &format!("/profiles/{alice_id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let debts = view["debts"].as_array().unwrap();
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0]["name"], "Visa");

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/profiles/{missing}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
