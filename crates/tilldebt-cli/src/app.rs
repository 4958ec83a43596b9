//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tilldebt_core::{
  comment::DebtComment,
  context::{ContextError, DebtContext, Overview},
  debt::{Debt, DebtCategory, DebtHistory, DebtPatch, NewDebt},
  profile::{ProfileView, PublicUserProfile},
};
use uuid::Uuid;

use crate::client::{ApiClient, ClientError};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Own debts on the left, overview (chart, activity, badges) on the right.
  Dashboard,
  /// History and comments of one debt.
  DebtDetail,
  /// Public profiles of other users.
  Explore,
}

/// Which list has the cursor on the detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFocus {
  History,
  Comments,
}

/// A one-line input prompt shown over the status bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
  NewDebtName,
  NewDebtAmount { name: String },
  /// Cycled with ←/→; `None` leaves the debt uncategorised.
  NewDebtCategory { name: String, amount: f64, category: Option<DebtCategory> },
  NewDebtPrivate { name: String, amount: f64, category: Option<DebtCategory> },
  Balance,
  Comment { history_id: Option<Uuid> },
  ConfirmDelete,
}

impl Prompt {
  pub fn label(&self) -> &'static str {
    match self {
      Prompt::NewDebtName => "New debt name",
      Prompt::NewDebtAmount { .. } => "Amount",
      Prompt::NewDebtCategory { .. } => "Category (←/→ choose, Enter accept)",
      Prompt::NewDebtPrivate { .. } => "Make this debt private? (y/n)",
      Prompt::Balance => "New balance",
      Prompt::Comment { history_id: Some(_) } => "Comment on update",
      Prompt::Comment { history_id: None } => "Comment",
      Prompt::ConfirmDelete => "Delete this debt? (y/n)",
    }
  }
}

/// Data for the debt detail screen.
#[derive(Debug, Clone)]
pub struct DebtDetail {
  pub debt:           Debt,
  /// Oldest first.
  pub history:        Vec<DebtHistory>,
  /// Newest first.
  pub comments:       Vec<DebtComment>,
  pub focus:          DetailFocus,
  pub history_cursor: usize,
  pub comment_cursor: usize,
}

impl DebtDetail {
  pub fn selected_history(&self) -> Option<&DebtHistory> { self.history.get(self.history_cursor) }

  pub fn selected_comment(&self) -> Option<&DebtComment> {
    self.comments.get(self.comment_cursor)
  }
}

/// Step through "no category" followed by every [`DebtCategory`], wrapping.
pub fn cycle_category(current: Option<DebtCategory>, forward: bool) -> Option<DebtCategory> {
  let slots = DebtCategory::ALL.len() + 1;
  let at = current
    .and_then(|c| DebtCategory::ALL.iter().position(|x| *x == c))
    .map_or(0, |i| i + 1);
  let next = if forward { (at + 1) % slots } else { (at + slots - 1) % slots };
  next.checked_sub(1).map(|i| DebtCategory::ALL[i])
}

fn category_text(category: Option<DebtCategory>) -> String {
  category.map_or("None", |c| c.label()).to_owned()
}

/// Parse a user-typed amount such as `1,234.50` or `$80`.
pub fn parse_amount(input: &str) -> Option<f64> {
  let cleaned: String = input
    .trim()
    .trim_start_matches('$')
    .chars()
    .filter(|c| *c != ',')
    .collect();
  cleaned
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite() && *v >= 0.0)
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Session state: signed-in user, own debts, last error.
  pub ctx: DebtContext<ApiClient>,

  /// Derived dashboard data, rebuilt after every change.
  pub overview: Overview,

  /// Cursor position within the own-debt list.
  pub list_cursor: usize,

  /// Loaded when a debt is opened.
  pub detail: Option<DebtDetail>,

  /// All public profiles, newest account first.
  pub profiles: Vec<PublicUserProfile>,

  /// Current fuzzy-filter string for the explore list.
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor within the *filtered* profile list.
  pub explore_cursor: usize,

  /// Profile opened from the explore list.
  pub profile_view: Option<ProfileView>,

  /// Active input prompt, if any, and its buffer.
  pub prompt: Option<Prompt>,
  pub input:  String,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl App {
  pub fn new(client: ApiClient) -> Self {
    Self {
      screen: Screen::Dashboard,
      ctx: DebtContext::new(client),
      overview: Overview::default(),
      list_cursor: 0,
      detail: None,
      profiles: Vec::new(),
      filter: String::new(),
      filter_active: false,
      explore_cursor: 0,
      profile_view: None,
      prompt: None,
      input: String::new(),
      status_msg: String::new(),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Authenticate and load the dashboard. Errors here are fatal to startup.
  pub async fn start(&mut self) -> anyhow::Result<()> {
    let user = self.ctx.sign_in().await?;
    self.status_msg = format!("Signed in as {}", user.email);
    self.reload_overview().await;
    Ok(())
  }

  /// Recompute the overview from the current debt list.
  async fn reload_overview(&mut self) {
    match self.ctx.overview().await {
      Ok(overview) => self.overview = overview,
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
    let len = self.ctx.debts().len();
    if self.list_cursor >= len {
      self.list_cursor = len.saturating_sub(1);
    }
  }

  async fn load_detail(&mut self, id: Uuid) -> Result<(), ContextError<ClientError>> {
    let debt = self
      .ctx
      .get_debt(id)
      .await?
      .ok_or(ContextError::NotFound(id))?;
    let history = self.ctx.get_debt_history(id).await?;
    let comments = self.ctx.get_debt_comments(id).await?;

    let (focus, history_cursor, comment_cursor) = match &self.detail {
      Some(d) if d.debt.id == id => (d.focus, d.history_cursor, d.comment_cursor),
      _ => (DetailFocus::History, history.len().saturating_sub(1), 0),
    };
    self.detail = Some(DebtDetail {
      debt,
      history_cursor: history_cursor.min(history.len().saturating_sub(1)),
      comment_cursor: comment_cursor.min(comments.len().saturating_sub(1)),
      history,
      comments,
      focus,
    });
    Ok(())
  }

  async fn load_profiles(&mut self) {
    self.status_msg = "Loading profiles…".into();
    match self.ctx.backend().public_profiles().await {
      Ok(profiles) => {
        self.profiles = profiles;
        self.explore_cursor = 0;
        self.status_msg.clear();
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn cursor_debt(&self) -> Option<&Debt> { self.ctx.debts().get(self.list_cursor) }

  /// Profiles whose email fuzzily matches the filter, best match first.
  pub fn filtered_profiles(&self) -> Vec<&PublicUserProfile> {
    if self.filter.is_empty() {
      return self.profiles.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &PublicUserProfile)> = self
      .profiles
      .iter()
      .filter_map(|p| matcher.fuzzy_match(&p.email, &self.filter).map(|s| (s, p)))
      .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, p)| p).collect()
  }

  pub fn cursor_profile(&self) -> Option<&PublicUserProfile> {
    self.filtered_profiles().get(self.explore_cursor).copied()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }
    // The status bar already shows the failure; a fresh key starts clean.
    self.ctx.clear_error();

    if self.prompt.is_some() {
      self.handle_prompt_key(key).await;
      return Ok(true);
    }
    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }

    match self.screen {
      Screen::Dashboard => self.handle_dashboard_key(key).await,
      Screen::DebtDetail => self.handle_detail_key(key).await,
      Screen::Explore => self.handle_explore_key(key).await,
    }
  }

  fn open_prompt(&mut self, prompt: Prompt) {
    self.prompt = Some(prompt);
    self.input.clear();
    self.status_msg.clear();
  }

  async fn handle_prompt_key(&mut self, key: KeyEvent) {
    let Some(prompt) = self.prompt.clone() else { return };

    if prompt == Prompt::ConfirmDelete {
      self.prompt = None;
      if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
        self.delete_open_debt().await;
      } else {
        self.status_msg = "Delete cancelled".into();
      }
      return;
    }

    if let Prompt::NewDebtCategory { name, amount, category } = prompt {
      match key.code {
        KeyCode::Esc => {
          self.prompt = None;
          self.input.clear();
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
          let forward = matches!(key.code, KeyCode::Right | KeyCode::Tab);
          let category = cycle_category(category, forward);
          self.input = category_text(category);
          self.prompt = Some(Prompt::NewDebtCategory { name, amount, category });
        }
        KeyCode::Enter => self.open_prompt(Prompt::NewDebtPrivate { name, amount, category }),
        _ => {}
      }
      return;
    }

    if let Prompt::NewDebtPrivate { name, amount, category } = prompt {
      let private = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => true,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter => false,
        KeyCode::Esc => {
          self.prompt = None;
          return;
        }
        _ => return,
      };
      self.prompt = None;
      let input = NewDebt { private, category, ..NewDebt::new(name, amount) };
      self.create_debt(input).await;
      return;
    }

    match key.code {
      KeyCode::Esc => {
        self.prompt = None;
        self.input.clear();
      }
      KeyCode::Backspace => {
        self.input.pop();
      }
      KeyCode::Char(c) => self.input.push(c),
      KeyCode::Enter => {
        let text = std::mem::take(&mut self.input);
        self.prompt = None;
        self.submit_prompt(prompt, text).await;
      }
      _ => {}
    }
  }

  async fn submit_prompt(&mut self, prompt: Prompt, text: String) {
    match prompt {
      Prompt::NewDebtName => {
        let name = text.trim().to_owned();
        if name.is_empty() {
          self.status_msg = "Name must not be empty".into();
        } else {
          self.open_prompt(Prompt::NewDebtAmount { name });
        }
      }
      Prompt::NewDebtAmount { name } => {
        let Some(amount) = parse_amount(&text) else {
          self.status_msg = format!("Invalid amount: {text:?}");
          return;
        };
        self.open_prompt(Prompt::NewDebtCategory { name, amount, category: None });
        self.input = category_text(None);
      }
      Prompt::NewDebtCategory { .. } | Prompt::NewDebtPrivate { .. } => {}
      Prompt::Balance => {
        let Some(id) = self.detail.as_ref().map(|d| d.debt.id) else { return };
        let Some(amount) = parse_amount(&text) else {
          self.status_msg = format!("Invalid amount: {text:?}");
          return;
        };
        match self.ctx.update_balance(id, amount).await {
          Ok(debt) => {
            self.status_msg = format!("Balance set to ${:.2}", debt.amount);
            self.after_detail_change(id).await;
          }
          Err(e) => self.status_msg = format!("Error: {e}"),
        }
      }
      Prompt::Comment { history_id } => {
        let Some(id) = self.detail.as_ref().map(|d| d.debt.id) else { return };
        match self.ctx.add_debt_comment(id, &text, history_id).await {
          Ok(_) => {
            self.status_msg = "Comment added".into();
            if let Err(e) = self.load_detail(id).await {
              self.status_msg = format!("Error: {e}");
            }
          }
          Err(e) => self.status_msg = format!("Error: {e}"),
        }
      }
      Prompt::ConfirmDelete => {}
    }
  }

  async fn create_debt(&mut self, input: NewDebt) {
    match self.ctx.add_debt(input).await {
      Ok(debt) => {
        self.status_msg = format!("Added {}", debt.name);
        self.reload_overview().await;
        if let Some(i) = self.ctx.debts().iter().position(|d| d.id == debt.id) {
          self.list_cursor = i;
        }
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
      }
      KeyCode::Enter => self.filter_active = false,
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => return,
    }
    self.explore_cursor = 0;
  }

  async fn handle_dashboard_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.ctx.debts().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_debt().map(|d| d.id) {
          self.open_detail(id).await;
        }
      }

      KeyCode::Char('n') => self.open_prompt(Prompt::NewDebtName),

      KeyCode::Char('r') => {
        match self.ctx.refresh().await {
          Ok(()) => self.status_msg = "Refreshed".into(),
          Err(e) => self.status_msg = format!("Error: {e}"),
        }
        self.reload_overview().await;
      }

      KeyCode::Char('e') | KeyCode::Tab => {
        self.screen = Screen::Explore;
        self.load_profiles().await;
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_detail_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let Some(detail) = self.detail.as_mut() else {
      self.screen = Screen::Dashboard;
      return Ok(true);
    };
    let id = detail.debt.id;

    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::Dashboard;
        self.detail = None;
      }

      KeyCode::Tab => {
        detail.focus = match detail.focus {
          DetailFocus::History => DetailFocus::Comments,
          DetailFocus::Comments => DetailFocus::History,
        };
      }

      KeyCode::Down | KeyCode::Char('j') => match detail.focus {
        DetailFocus::History if detail.history_cursor + 1 < detail.history.len() => {
          detail.history_cursor += 1;
        }
        DetailFocus::Comments if detail.comment_cursor + 1 < detail.comments.len() => {
          detail.comment_cursor += 1;
        }
        _ => {}
      },
      KeyCode::Up | KeyCode::Char('k') => match detail.focus {
        DetailFocus::History => detail.history_cursor = detail.history_cursor.saturating_sub(1),
        DetailFocus::Comments => detail.comment_cursor = detail.comment_cursor.saturating_sub(1),
      },

      KeyCode::Char('b') => self.open_prompt(Prompt::Balance),

      KeyCode::Char('p') => {
        let private = !detail.debt.private;
        match self.ctx.update_debt(id, DebtPatch::privacy(private)).await {
          Ok(_) => {
            self.status_msg = if private { "Debt is now private" } else { "Debt is now public" }.into();
            self.after_detail_change(id).await;
          }
          Err(e) => self.status_msg = format!("Error: {e}"),
        }
      }

      KeyCode::Char('d') => self.open_prompt(Prompt::ConfirmDelete),

      KeyCode::Char('c') => {
        let history_id = match detail.focus {
          DetailFocus::History => detail.selected_history().map(|h| h.id),
          DetailFocus::Comments => None,
        };
        self.open_prompt(Prompt::Comment { history_id });
      }

      KeyCode::Char('x') => {
        if let Some(comment_id) = detail.selected_comment().map(|c| c.id) {
          match self.ctx.delete_debt_comment(comment_id).await {
            Ok(()) => {
              self.status_msg = "Comment deleted".into();
              if let Err(e) = self.load_detail(id).await {
                self.status_msg = format!("Error: {e}");
              }
            }
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }

      _ => {}
    }
    Ok(true)
  }

  async fn handle_explore_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Esc | KeyCode::Tab => {
        if self.profile_view.take().is_none() {
          self.screen = Screen::Dashboard;
        }
      }

      KeyCode::Down | KeyCode::Char('j') => {
        if self.explore_cursor + 1 < self.filtered_profiles().len() {
          self.explore_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.explore_cursor = self.explore_cursor.saturating_sub(1);
      }

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.explore_cursor = 0;
      }

      KeyCode::Char('r') => self.load_profiles().await,

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(user_id) = self.cursor_profile().map(|p| p.id) {
          match self.ctx.backend().public_profile(user_id).await {
            Ok(Some(view)) => self.profile_view = Some(view),
            Ok(None) => self.status_msg = "Profile no longer exists".into(),
            Err(e) => self.status_msg = format!("Error: {e}"),
          }
        }
      }

      _ => {}
    }
    Ok(true)
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// Switch to `DebtDetail` for `id`, loading history and comments.
  async fn open_detail(&mut self, id: Uuid) {
    self.detail = None;
    match self.load_detail(id).await {
      Ok(()) => {
        self.screen = Screen::DebtDetail;
        self.status_msg.clear();
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  /// Refresh both the open detail and the dashboard after a mutation.
  async fn after_detail_change(&mut self, id: Uuid) {
    if let Err(e) = self.load_detail(id).await {
      self.status_msg = format!("Error: {e}");
    }
    self.reload_overview().await;
  }

  async fn delete_open_debt(&mut self) {
    let Some(detail) = self.detail.take() else { return };
    match self.ctx.delete_debt(detail.debt.id).await {
      Ok(()) => {
        self.status_msg = format!("Deleted {}", detail.debt.name);
        self.screen = Screen::Dashboard;
        self.reload_overview().await;
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        self.detail = Some(detail);
      }
    }
  }
}
