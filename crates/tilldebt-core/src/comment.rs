//! Comments on debts and on individual balance updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A comment left by any user on a debt they can see. When
/// `debt_history_id` is set the comment is about that specific balance
/// update; otherwise it is a general comment on the debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtComment {
  pub id:              Uuid,
  pub debt_id:         Uuid,
  pub debt_history_id: Option<Uuid>,
  /// Author; only the author may delete the comment.
  pub user_id:         Uuid,
  pub comment:         String,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::DebtStore::insert_comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
  pub debt_id:         Uuid,
  #[serde(default)]
  pub debt_history_id: Option<Uuid>,
  pub comment:         String,
}

impl NewComment {
  pub fn new(debt_id: Uuid, comment: impl Into<String>) -> Self {
    Self { debt_id, debt_history_id: None, comment: comment.into() }
  }

  pub fn on_activity(debt_id: Uuid, history_id: Uuid, comment: impl Into<String>) -> Self {
    Self { debt_id, debt_history_id: Some(history_id), comment: comment.into() }
  }

  /// Trim the text and reject blank comments.
  pub fn validated(mut self) -> Result<Self> {
    self.comment = self.comment.trim().to_owned();
    if self.comment.is_empty() {
      return Err(Error::InvalidComment("comment must not be empty".into()));
    }
    Ok(self)
  }
}

/// Keep only the comments attached to `history_id`, or every comment when
/// `history_id` is `None`.
pub fn for_activity(comments: Vec<DebtComment>, history_id: Option<Uuid>) -> Vec<DebtComment> {
  match history_id {
    Some(id) => comments
      .into_iter()
      .filter(|c| c.debt_history_id == Some(id))
      .collect(),
    None => comments,
  }
}
