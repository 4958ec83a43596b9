//! HTTP Basic-auth extractor and password hashing.
//!
//! The username is the account email; the password is checked against the
//! argon2 PHC string stored with the user.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use tilldebt_core::{store::DebtStore, user::User};

use crate::error::ApiError;

/// The authenticated caller. Present in a handler means the request carried
/// valid credentials for an existing user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Split an `Authorization: Basic …` header into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (email, password) = creds.split_once(':')?;
  Some((email.to_owned(), password.to_owned()))
}

/// Produce an argon2 PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::internal(format!("cannot hash password: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

impl<S> FromRequestParts<Arc<S>> for CurrentUser
where
  S: DebtStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, store: &Arc<S>) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let creds = store
      .user_credentials(&email)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    verify_password(&password, &creds.password_hash)?;
    Ok(CurrentUser(creds.user))
  }
}
