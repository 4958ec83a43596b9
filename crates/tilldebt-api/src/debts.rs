//! Handlers for `/debts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/debts` | The caller's own debts, newest first |
//! | `POST`   | `/debts` | Body: [`NewDebt`] |
//! | `GET`    | `/debts/{id}` | 404 unless owned or public |
//! | `PATCH`  | `/debts/{id}` | Body: [`DebtPatch`]; owner only |
//! | `DELETE` | `/debts/{id}` | Owner only |
//! | `PUT`    | `/debts/{id}/balance` | Body: `{"amount":123.45}` |
//! | `GET`    | `/debts/{id}/history` | Oldest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tilldebt_core::{
  debt::{Debt, DebtHistory, DebtPatch, NewDebt},
  store::DebtStore,
};
use uuid::Uuid;

use crate::{auth::CurrentUser, error::ApiError};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("debt {id}")) }

// ─── Collection ───────────────────────────────────────────────────────────────

/// `GET /debts`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Debt>>, ApiError>
where
  S: DebtStore + 'static,
{
  let debts = store.list_debts(user.id).await.map_err(ApiError::store)?;
  Ok(Json(debts))
}

/// `POST /debts`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<NewDebt>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DebtStore + 'static,
{
  let input = body.validated()?;
  let debt = store
    .insert_debt(user.id, input)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(debt_id = %debt.id, user_id = %user.id, "debt created");
  Ok((StatusCode::CREATED, Json(debt)))
}

// ─── Single debt ──────────────────────────────────────────────────────────────

/// `GET /debts/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Debt>, ApiError>
where
  S: DebtStore + 'static,
{
  store
    .get_debt(user.id, id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| not_found(id))
}

/// `PATCH /debts/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<DebtPatch>,
) -> Result<Json<Debt>, ApiError>
where
  S: DebtStore + 'static,
{
  apply(&*store, user.id, id, patch).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct BalanceBody {
  pub amount: f64,
}

/// `PUT /debts/{id}/balance`
pub async fn set_balance<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<BalanceBody>,
) -> Result<Json<Debt>, ApiError>
where
  S: DebtStore + 'static,
{
  apply(&*store, user.id, id, DebtPatch::balance(body.amount))
    .await
    .map(Json)
}

async fn apply<S: DebtStore>(
  store: &S,
  owner: Uuid,
  id: Uuid,
  patch: DebtPatch,
) -> Result<Debt, ApiError> {
  let patch = patch.validated()?;
  store
    .update_debt(owner, id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))
}

/// `DELETE /debts/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DebtStore + 'static,
{
  if store.delete_debt(user.id, id).await.map_err(ApiError::store)? {
    tracing::info!(debt_id = %id, user_id = %user.id, "debt deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(not_found(id))
  }
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /debts/{id}/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<DebtHistory>>, ApiError>
where
  S: DebtStore + 'static,
{
  if store.get_debt(user.id, id).await.map_err(ApiError::store)?.is_none() {
    return Err(not_found(id));
  }
  let history = store
    .debt_history(user.id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}
