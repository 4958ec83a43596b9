//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a backend error. A domain error anywhere in its source chain keeps
  /// its own status; anything else is logged and becomes a 500.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&e);
    while let Some(err) = cause {
      if let Some(core) = err.downcast_ref::<tilldebt_core::Error>() {
        return ApiError::from_core(core);
      }
      cause = err.source();
    }
    tracing::warn!(error = %e, "store request failed");
    ApiError::Store(Box::new(e))
  }

  /// A server-side fault outside the store.
  pub fn internal(message: impl Into<String>) -> Self {
    let message = message.into();
    tracing::error!(%message, "internal error");
    ApiError::Store(message.into())
  }

  fn from_core(e: &tilldebt_core::Error) -> Self {
    use tilldebt_core::Error as E;
    match e {
      E::DebtNotFound(_) => ApiError::NotFound(e.to_string()),
      E::EmailTaken(_) => ApiError::Conflict(e.to_string()),
      E::HistoryNotFound { .. }
      | E::InvalidDebt(_)
      | E::InvalidComment(_)
      | E::UnknownCategory(_) => ApiError::BadRequest(e.to_string()),
    }
  }
}

impl From<tilldebt_core::Error> for ApiError {
  fn from(e: tilldebt_core::Error) -> Self { ApiError::from_core(&e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"tilldebt\""),
      );
    }
    res
  }
}
