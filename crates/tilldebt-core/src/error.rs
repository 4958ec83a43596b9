//! Error types for `tilldebt-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("debt not found: {0}")]
  DebtNotFound(Uuid),

  #[error("history entry {history_id} does not belong to debt {debt_id}")]
  HistoryNotFound { debt_id: Uuid, history_id: Uuid },

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("invalid debt: {0}")]
  InvalidDebt(String),

  #[error("invalid comment: {0}")]
  InvalidComment(String),

  #[error("unknown debt category: {0:?}")]
  UnknownCategory(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
