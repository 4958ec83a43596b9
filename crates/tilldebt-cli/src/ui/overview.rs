//! Dashboard overview: total-debt chart and activity log, plus badges.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  symbols,
  text::{Line, Span},
  widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
};
use tilldebt_core::{achievements::Badge, timeline::Change};

use super::money;
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage(45),
      Constraint::Min(4),
      Constraint::Length(4),
    ])
    .split(area);

  draw_chart(f, rows[0], app);
  draw_activity(f, rows[1], app);
  draw_badges(f, rows[2], app);
}

fn pane(title: &str) -> Block<'_> {
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

// ─── Total debt chart ─────────────────────────────────────────────────────────

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
  let series = &app.overview.series;
  let block = pane("Total debt over time");

  let (Some(first), Some(last)) = (series.first(), series.last()) else {
    f.render_widget(
      Paragraph::new("Add a debt to see your progress.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  };

  // x is days since the first recorded date.
  let points: Vec<(f64, f64)> = series
    .iter()
    .map(|p| ((p.date - first.date).num_days() as f64, p.amount))
    .collect();
  let max_x = points.last().map(|p| p.0).unwrap_or_default().max(1.0);
  let max_y = series.iter().map(|p| p.amount).fold(0.0, f64::max).max(1.0);

  let dataset = Dataset::default()
    .marker(symbols::Marker::Braille)
    .graph_type(GraphType::Line)
    .style(Style::default().fg(Color::Cyan))
    .data(&points);

  let chart = Chart::new(vec![dataset])
    .block(block)
    .x_axis(
      Axis::default()
        .style(Style::default().fg(Color::DarkGray))
        .bounds([0.0, max_x])
        .labels(vec![
          Span::raw(first.date.format("%b %d").to_string()),
          Span::raw(last.date.format("%b %d").to_string()),
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

// ─── Activity log ─────────────────────────────────────────────────────────────

fn draw_activity(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Recent activity");
  let activity = &app.overview.activity;

  if activity.is_empty() {
    f.render_widget(
      Paragraph::new("No activity yet.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  }

  let items: Vec<ListItem> = activity
    .iter()
    .map(|entry| {
      let change_style = match entry.change {
        Change::Added => Style::default().fg(Color::Cyan),
        Change::Increase(_) => Style::default().fg(Color::Red),
        Change::Decrease(_) => Style::default().fg(Color::Green),
      };
      ListItem::new(Line::from(vec![
        Span::styled(
          entry.recorded_at.format("%Y-%m-%d  ").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!("{:<18}", entry.debt_name)),
        Span::styled(format!("{:>12}", entry.change.to_string()), change_style),
        Span::styled(
          format!("  → {}", money(entry.amount)),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();

  f.render_widget(List::new(items).block(block), area);
}

// ─── Badges ───────────────────────────────────────────────────────────────────

fn draw_badges(f: &mut Frame, area: Rect, app: &App) {
  let earned = app.overview.achievements.earned();
  let block = pane("Achievements");

  let line = if earned.is_empty() {
    Line::from(Span::styled("No badges yet.", Style::default().fg(Color::DarkGray)))
  } else {
    Line::from(
      earned
        .iter()
        .flat_map(|badge| badge_spans(*badge))
        .collect::<Vec<_>>(),
    )
  };
  f.render_widget(Paragraph::new(line).block(block), area);
}

fn badge_spans(badge: Badge) -> [Span<'static>; 2] {
  [
    Span::styled(
      format!(" ★ {} ", badge.title()),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD),
    ),
    Span::raw(" "),
  ]
}
