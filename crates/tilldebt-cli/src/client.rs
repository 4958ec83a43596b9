//! Async HTTP client wrapping the Till Debt Do Us Part JSON API.
//!
//! [`ApiClient`] is the session-scoped [`DebtBackend`] the TUI drives through
//! a [`tilldebt_core::context::DebtContext`]; the explore endpoints sit
//! alongside as inherent methods.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;
use tilldebt_core::{
  comment::{DebtComment, NewComment},
  context::DebtBackend,
  debt::{Debt, DebtHistory, DebtPatch, NewDebt},
  profile::{ProfileView, PublicUserProfile},
  user::User,
};
use uuid::Uuid;

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// A non-success status; `message` is the server's `error` field when
  /// present.
  #[error("{message} ({status})")]
  Status { status: StatusCode, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Async HTTP client for the JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> ClientResult<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ApiConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  fn get(&self, path: &str) -> RequestBuilder { self.auth(self.client.get(self.url(path))) }

  async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
    let resp = check(req.send().await?).await?;
    Ok(resp.json().await?)
  }

  /// Like [`Self::send_json`], but a 404 is `None`.
  async fn send_optional<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<Option<T>> {
    let resp = req.send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  fn with_body<B: Serialize>(&self, req: RequestBuilder, body: &B) -> RequestBuilder {
    self.auth(req).json(body)
  }

  // ── Account ───────────────────────────────────────────────────────────────

  /// `POST /api/auth/signup` with the configured credentials.
  pub async fn signup(&self) -> ClientResult<User> {
    let body = json!({ "email": self.config.username, "password": self.config.password });
    self
      .send_json(self.client.post(self.url("/auth/signup")).json(&body))
      .await
  }

  // ── Explore ───────────────────────────────────────────────────────────────

  /// `GET /api/profiles`
  pub async fn public_profiles(&self) -> ClientResult<Vec<PublicUserProfile>> {
    self.send_json(self.get("/profiles")).await
  }

  /// `GET /api/profiles/{id}`
  pub async fn public_profile(&self, user_id: Uuid) -> ClientResult<Option<ProfileView>> {
    self.send_optional(self.get(&format!("/profiles/{user_id}"))).await
  }
}

/// Pass successful responses through; turn anything else into
/// [`ClientError::Status`].
async fn check(resp: Response) -> ClientResult<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let text = resp.text().await.unwrap_or_default();
  Err(ClientError::Status { status, message: error_message(&text, status) })
}

fn error_message(body: &str, status: StatusCode) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
    .unwrap_or_else(|| {
      status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_owned()
    })
}

// ─── DebtBackend impl ────────────────────────────────────────────────────────

impl DebtBackend for ApiClient {
  type Error = ClientError;

  async fn current_user(&self) -> ClientResult<Option<User>> {
    let resp = self.get("/auth/session").send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  async fn list_debts(&self) -> ClientResult<Vec<Debt>> { self.send_json(self.get("/debts")).await }

  async fn insert_debt(&self, input: NewDebt) -> ClientResult<Debt> {
    self
      .send_json(self.with_body(self.client.post(self.url("/debts")), &input))
      .await
  }

  async fn update_debt(&self, id: Uuid, patch: DebtPatch) -> ClientResult<Option<Debt>> {
    // Balance-only updates go through the dedicated endpoint.
    let req = match &patch {
      DebtPatch {
        amount: Some(amount),
        name: None,
        private: None,
        description: None,
        category: None,
        color: None,
      } => self.with_body(
        self.client.put(self.url(&format!("/debts/{id}/balance"))),
        &json!({ "amount": amount }),
      ),
      _ => self.with_body(self.client.patch(self.url(&format!("/debts/{id}"))), &patch),
    };
    self.send_optional(req).await
  }

  async fn delete_debt(&self, id: Uuid) -> ClientResult<bool> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/debts/{id}"))))
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check(resp).await?;
    Ok(true)
  }

  async fn get_debt(&self, id: Uuid) -> ClientResult<Option<Debt>> {
    self.send_optional(self.get(&format!("/debts/{id}"))).await
  }

  async fn debt_history(&self, debt_id: Uuid) -> ClientResult<Vec<DebtHistory>> {
    let history = self
      .send_optional(self.get(&format!("/debts/{debt_id}/history")))
      .await?;
    Ok(history.unwrap_or_default())
  }

  async fn debt_comments(&self, debt_id: Uuid) -> ClientResult<Vec<DebtComment>> {
    let comments = self
      .send_optional(self.get(&format!("/debts/{debt_id}/comments")))
      .await?;
    Ok(comments.unwrap_or_default())
  }

  async fn insert_comment(&self, input: NewComment) -> ClientResult<DebtComment> {
    let body = json!({ "comment": input.comment, "debt_history_id": input.debt_history_id });
    let url = self.url(&format!("/debts/{}/comments", input.debt_id));
    self.send_json(self.with_body(self.client.post(url), &body)).await
  }

  async fn delete_comment(&self, id: Uuid) -> ClientResult<bool> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/comments/{id}"))))
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check(resp).await?;
    Ok(true)
  }
}
