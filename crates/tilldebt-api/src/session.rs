//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Body: `{"email":"…","password":"…"}`; no auth |
//! | `GET`  | `/auth/session` | The authenticated user |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tilldebt_core::{
  store::DebtStore,
  user::{User, normalize_email},
};

use crate::{
  auth::{CurrentUser, hash_password},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/signup`
pub async fn signup<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DebtStore + 'static,
{
  let email = normalize_email(&body.email);
  if email.is_empty() || !email.contains('@') {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }

  let existing = store
    .user_credentials(&email)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(tilldebt_core::Error::EmailTaken(email).into());
  }

  let hash = hash_password(&body.password)?;
  let user = store
    .create_user(email, hash)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %user.id, "user signed up");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /auth/session`
pub async fn session(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }
