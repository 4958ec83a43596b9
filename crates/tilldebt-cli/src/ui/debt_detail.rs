//! Debt detail screen: balance history on the left, comments on the right.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  symbols,
  text::{Line, Span},
  widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph, Wrap,
  },
};
use tilldebt_core::timeline::{BalancePoint, balance_series};

use super::{money, swatch};
use crate::app::{App, DebtDetail, DetailFocus};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(detail) = &app.detail else {
    return;
  };

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(5), Constraint::Length(10), Constraint::Min(0)])
    .split(area);
  draw_summary(f, rows[0], detail);
  draw_chart(f, rows[1], detail);

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(rows[2]);
  draw_history(f, cols[0], detail);
  draw_comments(f, cols[1], app, detail);
}

fn focus_block(title: String, focused: bool) -> Block<'static> {
  let border = if focused { Color::Cyan } else { Color::DarkGray };
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border))
}

fn highlight() -> Style {
  Style::default()
    .bg(Color::Blue)
    .fg(Color::White)
    .add_modifier(Modifier::BOLD)
}

fn draw_summary(f: &mut Frame, area: Rect, detail: &DebtDetail) {
  let debt = &detail.debt;
  let block = Block::default()
    .title(Line::from(vec![
      Span::styled(" ■ ", Style::default().fg(swatch(debt))),
      Span::styled(
        format!("{} ", debt.name),
        Style::default().add_modifier(Modifier::BOLD),
      ),
    ]))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let visibility = if debt.private { "private" } else { "public" };
  let category = debt.category.map(|c| c.label()).unwrap_or("Uncategorised");
  let lines = vec![
    Line::from(vec![
      Span::styled(
        money(debt.amount),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
      ),
      Span::styled(format!("   {category} · {visibility}"), Style::default().fg(Color::Gray)),
    ]),
    Line::from(Span::styled(
      debt.description.clone().unwrap_or_default(),
      Style::default().fg(Color::DarkGray),
    )),
    Line::from(Span::styled(
      format!(
        "created {}  ·  updated {}",
        debt.created_at.format("%Y-%m-%d"),
        debt.updated_at.format("%Y-%m-%d %H:%M")
      ),
      Style::default().fg(Color::DarkGray),
    )),
  ];
  f.render_widget(Paragraph::new(lines).block(block), area);
}

// ─── Balance chart ────────────────────────────────────────────────────────────

/// Chart coordinates: x is fractional days since the first entry.
fn chart_points(series: &[BalancePoint]) -> Vec<(f64, f64)> {
  let Some(first) = series.first() else {
    return Vec::new();
  };
  series
    .iter()
    .map(|p| {
      let secs = (p.recorded_at - first.recorded_at).num_seconds() as f64;
      (secs / 86_400.0, p.amount)
    })
    .collect()
}

fn draw_chart(f: &mut Frame, area: Rect, detail: &DebtDetail) {
  let series = balance_series(&detail.history);
  let block = Block::default()
    .title(" Balance over time ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let (Some(first), Some(last)) = (series.first(), series.last()) else {
    f.render_widget(
      Paragraph::new("No history yet.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  };

  let points = chart_points(&series);
  let max_x = points.last().map(|p| p.0).unwrap_or_default().max(1.0);
  let max_y = series.iter().map(|p| p.amount).fold(0.0, f64::max).max(1.0);

  let dataset = Dataset::default()
    .marker(symbols::Marker::Braille)
    .graph_type(GraphType::Line)
    .style(Style::default().fg(swatch(&detail.debt)))
    .data(&points);

  let chart = Chart::new(vec![dataset])
    .block(block)
    .x_axis(
      Axis::default()
        .style(Style::default().fg(Color::DarkGray))
        .bounds([0.0, max_x])
        .labels(vec![
          Span::raw(first.recorded_at.format("%b %d").to_string()),
          Span::raw(last.recorded_at.format("%b %d").to_string()),
        ]),
    )
    .y_axis(
      Axis::default()
        .style(Style::default().fg(Color::DarkGray))
        .bounds([0.0, max_y * 1.1])
        .labels(vec![Span::raw("$0"), Span::raw(money(max_y))]),
    );
  f.render_widget(chart, area);
}

// ─── History and comments ─────────────────────────────────────────────────────

fn draw_history(f: &mut Frame, area: Rect, detail: &DebtDetail) {
  let block = focus_block(
    format!(" History ({}) ", detail.history.len()),
    detail.focus == DetailFocus::History,
  );

  let mut previous: Option<f64> = None;
  let items: Vec<ListItem> = detail
    .history
    .iter()
    .map(|h| {
      let (delta, style) = match previous {
        None => ("created".to_string(), Style::default().fg(Color::Cyan)),
        Some(p) if h.amount < p => (format!("-{}", money(p - h.amount)), Style::default().fg(Color::Green)),
        Some(p) if h.amount > p => (format!("+{}", money(h.amount - p)), Style::default().fg(Color::Red)),
        Some(_) => ("unchanged".to_string(), Style::default().fg(Color::DarkGray)),
      };
      previous = Some(h.amount);
      let comments = detail
        .comments
        .iter()
        .filter(|c| c.debt_history_id == Some(h.id))
        .count();
      let badge = if comments > 0 { format!("  💬{comments}") } else { String::new() };
      ListItem::new(Line::from(vec![
        Span::styled(
          h.recorded_at.format("%Y-%m-%d %H:%M  ").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!("{:>12}", money(h.amount))),
        Span::styled(format!("  {delta}"), style),
        Span::raw(badge),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  if detail.focus == DetailFocus::History && !detail.history.is_empty() {
    state.select(Some(detail.history_cursor));
  }
  f.render_stateful_widget(List::new(items).block(block).highlight_style(highlight()), area, &mut state);
}

fn draw_comments(f: &mut Frame, area: Rect, app: &App, detail: &DebtDetail) {
  let block = focus_block(
    format!(" Comments ({}) ", detail.comments.len()),
    detail.focus == DetailFocus::Comments,
  );

  if detail.comments.is_empty() {
    f.render_widget(
      Paragraph::new("No comments yet. Press c to add one.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(block),
      area,
    );
    return;
  }

  let me = app.ctx.user().map(|u| u.id);
  let items: Vec<ListItem> = detail
    .comments
    .iter()
    .map(|c| {
      let author = if Some(c.user_id) == me { "you" } else { "someone" };
      let on_update = c
        .debt_history_id
        .and_then(|id| detail.history.iter().find(|h| h.id == id))
        .map(|h| format!(" on {} update", money(h.amount)))
        .unwrap_or_default();
      ListItem::new(vec![
        Line::from(Span::styled(
          format!("{} · {author}{on_update}", c.created_at.format("%Y-%m-%d %H:%M")),
          Style::default().fg(Color::DarkGray),
        )),
        Line::from(c.comment.clone()),
      ])
    })
    .collect();

  let mut state = ListState::default();
  if detail.focus == DetailFocus::Comments {
    state.select(Some(detail.comment_cursor));
  }
  f.render_stateful_widget(List::new(items).block(block).highlight_style(highlight()), area, &mut state);
}
