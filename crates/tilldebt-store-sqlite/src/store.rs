//! [`SqliteStore`]: the SQLite implementation of [`DebtStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tilldebt_core::{
  Error as CoreError,
  comment::{DebtComment, NewComment},
  debt::{Debt, DebtHistory, DebtPatch, NewDebt},
  profile::PublicUserProfile,
  store::DebtStore,
  user::{User, UserCredentials, normalize_email},
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    DEBT_COLUMNS, RawComment, RawDebt, RawHistory, RawProfile, RawUser, encode_dt,
    encode_uuid, now, read_comment, read_debt, read_history, read_profile, read_user,
  },
  schema::SCHEMA,
};

const HISTORY_COLUMNS: &str = "h.history_id, h.debt_id, h.amount, h.recorded_at";

const COMMENT_COLUMNS: &str = "comment_id, debt_id, history_id, user_id, comment, created_at";

const PROFILE_QUERY: &str = "
  SELECT u.user_id, u.email, u.created_at,
         COALESCE(SUM(CASE WHEN d.private = 0 THEN d.amount END), 0.0),
         COUNT(CASE WHEN d.private = 0 THEN 1 END)
  FROM users u
  LEFT JOIN debts d ON d.user_id = u.user_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A debt store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// A single debt by id, filtered by `filter` with `?2` bound to `user_id`.
  async fn fetch_debt(&self, filter: &str, id: Uuid, user_id: Uuid) -> Result<Option<Debt>> {
    let sql = format!("SELECT {DEBT_COLUMNS} FROM debts WHERE debt_id = ?1 AND {filter}");
    let id_str = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let raw: Option<RawDebt> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, user_str], read_debt)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawDebt::into_debt).transpose()
  }

  async fn fetch_debts(&self, sql: String, user_id: Uuid) -> Result<Vec<Debt>> {
    let user_str = encode_uuid(user_id);
    let raws: Vec<RawDebt> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], read_debt)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDebt::into_debt).collect()
  }
}

/// Result of the single-transaction comment insert; mapped to domain errors
/// once the closure has returned.
enum CommentOutcome {
  Inserted(RawComment),
  DebtMissing,
  HistoryMismatch,
}

// ─── DebtStore impl ──────────────────────────────────────────────────────────

impl DebtStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, email: String, password_hash: String) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      email:      normalize_email(&email),
      created_at: now(),
    };

    let id_str = encode_uuid(user.id);
    let email_str = user.email.clone();
    let at_str = encode_dt(user.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO users (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_str, password_hash, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(CoreError::EmailTaken(user.email).into());
    }
    Ok(user)
  }

  async fn user_credentials<'a>(&'a self, email: &'a str) -> Result<Option<UserCredentials>> {
    let email = normalize_email(email);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, created_at
               FROM users WHERE email = ?1",
              rusqlite::params![email],
              read_user,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_credentials).transpose()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, created_at
               FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              read_user,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw.map(RawUser::into_credentials).transpose()?.map(|c| c.user))
  }

  // ── Debts ─────────────────────────────────────────────────────────────────

  async fn list_debts(&self, owner: Uuid) -> Result<Vec<Debt>> {
    let sql = format!(
      "SELECT {DEBT_COLUMNS} FROM debts WHERE user_id = ?1
       ORDER BY created_at DESC, rowid DESC"
    );
    self.fetch_debts(sql, owner).await
  }

  async fn insert_debt(&self, owner: Uuid, input: NewDebt) -> Result<Debt> {
    let input = input.validated()?;
    let at = now();
    let debt = Debt {
      id:          Uuid::new_v4(),
      user_id:     owner,
      name:        input.name,
      amount:      input.amount,
      private:     input.private,
      created_at:  at,
      updated_at:  at,
      description: input.description,
      category:    input.category,
      color:       input.color,
    };

    let debt_str = encode_uuid(debt.id);
    let owner_str = encode_uuid(owner);
    let history_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(at);
    let name = debt.name.clone();
    let amount = debt.amount;
    let private = debt.private;
    let description = debt.description.clone();
    let category = debt.category.map(|c| c.as_str());
    let color = debt.color.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO debts (
             debt_id, user_id, name, amount, private, created_at, updated_at,
             description, category, color
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            debt_str,
            owner_str,
            name,
            amount,
            private,
            at_str,
            description,
            category,
            color,
          ],
        )?;
        tx.execute(
          "INSERT INTO debt_history (history_id, debt_id, amount, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![history_str, debt_str, amount, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(debt)
  }

  async fn update_debt(&self, owner: Uuid, id: Uuid, patch: DebtPatch) -> Result<Option<Debt>> {
    let patch = patch.validated()?;
    let debt_str = encode_uuid(id);
    let owner_str = encode_uuid(owner);
    let at_str = encode_dt(now());
    let history_str = encode_uuid(Uuid::new_v4());
    let category = patch.category.map(|c| c.as_str());

    let changed: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE debts SET
             name        = COALESCE(?1, name),
             amount      = COALESCE(?2, amount),
             private     = COALESCE(?3, private),
             description = COALESCE(?4, description),
             category    = COALESCE(?5, category),
             color       = COALESCE(?6, color),
             updated_at  = ?7
           WHERE debt_id = ?8 AND user_id = ?9",
          rusqlite::params![
            patch.name,
            patch.amount,
            patch.private,
            patch.description,
            category,
            patch.color,
            at_str,
            debt_str,
            owner_str,
          ],
        )?;
        if n == 0 {
          return Ok(false);
        }
        if let Some(amount) = patch.amount {
          tx.execute(
            "INSERT INTO debt_history (history_id, debt_id, amount, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![history_str, debt_str, amount, at_str],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !changed {
      return Ok(None);
    }
    self
      .fetch_debt("user_id = ?2", id, owner)
      .await
  }

  async fn delete_debt(&self, owner: Uuid, id: Uuid) -> Result<bool> {
    let debt_str = encode_uuid(id);
    let owner_str = encode_uuid(owner);
    let n: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM debts WHERE debt_id = ?1 AND user_id = ?2",
          rusqlite::params![debt_str, owner_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  async fn get_debt(&self, viewer: Uuid, id: Uuid) -> Result<Option<Debt>> {
    self
      .fetch_debt("(user_id = ?2 OR private = 0)", id, viewer)
      .await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn debt_history(&self, viewer: Uuid, debt_id: Uuid) -> Result<Vec<DebtHistory>> {
    let debt_str = encode_uuid(debt_id);
    let viewer_str = encode_uuid(viewer);
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {HISTORY_COLUMNS}
           FROM debt_history h JOIN debts d ON d.debt_id = h.debt_id
           WHERE h.debt_id = ?1 AND (d.user_id = ?2 OR d.private = 0)
           ORDER BY h.recorded_at ASC, h.rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![debt_str, viewer_str], read_history)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawHistory::into_history).collect()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn debt_comments(&self, viewer: Uuid, debt_id: Uuid) -> Result<Vec<DebtComment>> {
    let debt_str = encode_uuid(debt_id);
    let viewer_str = encode_uuid(viewer);
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let visible = conn
          .query_row(
            "SELECT 1 FROM debts WHERE debt_id = ?1 AND (user_id = ?2 OR private = 0)",
            rusqlite::params![debt_str, viewer_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !visible {
          return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM debt_comments WHERE debt_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![debt_str], read_comment)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn insert_comment(&self, author: Uuid, input: NewComment) -> Result<DebtComment> {
    let input = input.validated()?;
    let debt_id = input.debt_id;
    let history_id = input.debt_history_id;

    let comment_str = encode_uuid(Uuid::new_v4());
    let debt_str = encode_uuid(debt_id);
    let history_str = history_id.map(encode_uuid);
    let author_str = encode_uuid(author);
    let at_str = encode_dt(now());
    let text = input.comment;

    let outcome: CommentOutcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let visible = tx
          .query_row(
            "SELECT 1 FROM debts WHERE debt_id = ?1 AND (user_id = ?2 OR private = 0)",
            rusqlite::params![debt_str, author_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !visible {
          return Ok(CommentOutcome::DebtMissing);
        }
        if let Some(history_str) = &history_str {
          let belongs = tx
            .query_row(
              "SELECT 1 FROM debt_history WHERE history_id = ?1 AND debt_id = ?2",
              rusqlite::params![history_str, debt_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !belongs {
            return Ok(CommentOutcome::HistoryMismatch);
          }
        }
        tx.execute(
          &format!("INSERT INTO debt_comments ({COMMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![comment_str, debt_str, history_str, author_str, text, at_str],
        )?;
        tx.commit()?;
        Ok(CommentOutcome::Inserted(RawComment {
          comment_id: comment_str,
          debt_id:    debt_str,
          history_id: history_str,
          user_id:    author_str,
          comment:    text,
          created_at: at_str,
        }))
      })
      .await?;

    match outcome {
      CommentOutcome::Inserted(raw) => raw.into_comment(),
      CommentOutcome::DebtMissing => Err(CoreError::DebtNotFound(debt_id).into()),
      CommentOutcome::HistoryMismatch => Err(
        CoreError::HistoryNotFound {
          debt_id,
          history_id: history_id.unwrap_or_default(),
        }
        .into(),
      ),
    }
  }

  async fn delete_comment(&self, author: Uuid, id: Uuid) -> Result<bool> {
    let comment_str = encode_uuid(id);
    let author_str = encode_uuid(author);
    let n: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM debt_comments WHERE comment_id = ?1 AND user_id = ?2",
          rusqlite::params![comment_str, author_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Public aggregates ─────────────────────────────────────────────────────

  async fn public_user_profiles(&self) -> Result<Vec<PublicUserProfile>> {
    let raws: Vec<RawProfile> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "{PROFILE_QUERY}
           GROUP BY u.user_id
           ORDER BY u.created_at DESC, u.rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], read_profile)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn public_user_profile(&self, user_id: Uuid) -> Result<Option<PublicUserProfile>> {
    let user_str = encode_uuid(user_id);
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{PROFILE_QUERY} WHERE u.user_id = ?1 GROUP BY u.user_id"),
              rusqlite::params![user_str],
              read_profile,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn public_debts(&self, user_id: Uuid) -> Result<Vec<Debt>> {
    let sql = format!(
      "SELECT {DEBT_COLUMNS} FROM debts WHERE user_id = ?1 AND private = 0
       ORDER BY created_at DESC, rowid DESC"
    );
    self.fetch_debts(sql, user_id).await
  }
}
