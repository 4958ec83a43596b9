//! Handlers for comment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/debts/{id}/comments` | Newest first; optional `?history_id=<uuid>` |
//! | `POST`   | `/debts/{id}/comments` | Body: `{"comment":"…","debt_history_id":null}` |
//! | `DELETE` | `/comments/{id}` | Author only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tilldebt_core::{
  comment::{DebtComment, NewComment, for_activity},
  store::DebtStore,
};
use uuid::Uuid;

use crate::{auth::CurrentUser, error::ApiError};

async fn require_visible<S: DebtStore>(store: &S, viewer: Uuid, id: Uuid) -> Result<(), ApiError> {
  match store.get_debt(viewer, id).await.map_err(ApiError::store)? {
    Some(_) => Ok(()),
    None => Err(ApiError::NotFound(format!("debt {id}"))),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub history_id: Option<Uuid>,
}

/// `GET /debts/{id}/comments[?history_id=<uuid>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(debt_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DebtComment>>, ApiError>
where
  S: DebtStore + 'static,
{
  require_visible(&*store, user.id, debt_id).await?;
  let comments = store
    .debt_comments(user.id, debt_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(for_activity(comments, params.history_id)))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub comment:         String,
  #[serde(default)]
  pub debt_history_id: Option<Uuid>,
}

/// `POST /debts/{id}/comments`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(debt_id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DebtStore + 'static,
{
  let input = NewComment { debt_id, debt_history_id: body.debt_history_id, comment: body.comment }
    .validated()?;

  require_visible(&*store, user.id, debt_id).await?;
  if let Some(history_id) = input.debt_history_id {
    let history = store
      .debt_history(user.id, debt_id)
      .await
      .map_err(ApiError::store)?;
    if !history.iter().any(|h| h.id == history_id) {
      return Err(tilldebt_core::Error::HistoryNotFound { debt_id, history_id }.into());
    }
  }

  let comment = store
    .insert_comment(user.id, input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /comments/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DebtStore + 'static,
{
  if store.delete_comment(user.id, id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("comment {id}")))
  }
}
