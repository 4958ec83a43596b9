//! Handlers for `/profiles`, the community explore view.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use tilldebt_core::{
  profile::{ProfileView, PublicUserProfile},
  store::DebtStore,
};
use uuid::Uuid;

use crate::{auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Case-insensitive substring of the email.
  pub search: Option<String>,
}

/// `GET /profiles[?search=<text>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _user: CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PublicUserProfile>>, ApiError>
where
  S: DebtStore + 'static,
{
  let mut profiles = store.public_user_profiles().await.map_err(ApiError::store)?;
  if let Some(needle) = params.search.as_deref() {
    profiles.retain(|p| p.matches(needle));
  }
  Ok(Json(profiles))
}

/// `GET /profiles/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, ApiError>
where
  S: DebtStore + 'static,
{
  let profile = store
    .public_user_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
  let debts = store.public_debts(id).await.map_err(ApiError::store)?;
  Ok(Json(ProfileView { profile, debts }))
}
