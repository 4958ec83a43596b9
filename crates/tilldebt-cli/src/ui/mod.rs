//! TUI rendering. Orchestrates all panes.

pub mod debt_detail;
pub mod debt_list;
pub mod explore;
pub mod overview;

use std::str::FromStr;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};
use tilldebt_core::debt::Debt;

use crate::app::{App, DetailFocus, Screen};

/// Dollars with two decimals and no thousands separators, e.g. `$1234.50`.
pub fn money(amount: f64) -> String { format!("${amount:.2}") }

/// The debt's swatch colour, falling back to grey for missing or
/// unparseable values.
pub fn swatch(debt: &Debt) -> Color {
  debt
    .color
    .as_deref()
    .and_then(|c| Color::from_str(c).ok())
    .unwrap_or(Color::Gray)
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Dashboard => {
      let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
      debt_list::draw(f, cols[0], app);
      overview::draw(f, cols[1], app);
    }
    Screen::DebtDetail => debt_detail::draw(f, rows[1], app),
    Screen::Explore => explore::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let who = app
    .ctx
    .user()
    .map(|u| u.email.clone())
    .unwrap_or_else(|| "signed out".into());
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " Till Debt Do Us Part",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{who}  {date} "), Style::default().fg(Color::Gray));

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  if let Some(prompt) = &app.prompt {
    let line = Line::from(vec![
      Span::styled(
        format!(" {} ", prompt.label()),
        Style::default()
          .fg(Color::Black)
          .bg(Color::Yellow)
          .add_modifier(Modifier::BOLD),
      ),
      Span::raw(format!(" {}_", app.input)),
    ]);
    f.render_widget(Paragraph::new(line), area);
    return;
  }

  let (mode_label, hints) = match app.screen {
    Screen::Explore if app.filter_active => ("SEARCH", "Type to filter  Esc clear  Enter done"),
    Screen::Explore => ("EXPLORE", "↑↓/jk navigate  / search  Enter profile  r reload  Esc back"),
    Screen::Dashboard => (
      "DEBTS",
      "↑↓/jk navigate  Enter open  n new  r refresh  e explore  q quit",
    ),
    Screen::DebtDetail => match app.detail.as_ref().map(|d| d.focus) {
      Some(DetailFocus::Comments) => (
        "DETAIL",
        "Tab history  c comment  x delete comment  b balance  p privacy  d delete  Esc back",
      ),
      _ => (
        "DETAIL",
        "Tab comments  c comment on update  b balance  p privacy  d delete  Esc back",
      ),
    },
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}
