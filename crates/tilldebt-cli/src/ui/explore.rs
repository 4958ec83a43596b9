//! Explore screen: public profiles and a selected profile's public debts.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::{money, swatch};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(area);
  draw_profiles(f, cols[0], app);
  draw_profile(f, cols[1], app);
}

fn draw_profiles(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_profiles();
  let total = app.profiles.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Community ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Community ({total}) ")
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|p| {
      ListItem::new(Line::from(vec![
        Span::raw(format!("{:<28}", p.email)),
        Span::styled(format!("{:>12}", money(p.total_debt)), Style::default().fg(Color::White)),
        Span::styled(
          format!("  {} debt{}", p.debt_count, if p.debt_count == 1 { "" } else { "s" }),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if (app.filter_active || !app.filter.is_empty()) && inner.height > 2 {
    let filter_area = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
    inner.height = inner.height.saturating_sub(1);
    let text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Yellow)), filter_area);
  }

  let mut state = ListState::default();
  state.select((!filtered.is_empty()).then_some(app.explore_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

fn draw_profile(f: &mut Frame, area: Rect, app: &App) {
  let Some(view) = &app.profile_view else {
    let block = Block::default()
      .title(" Profile ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(
      Paragraph::new("Select a profile and press Enter.")
        .style(Style::default().fg(Color::DarkGray))
        .block(block),
      area,
    );
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", view.profile.email))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));

  let mut lines = vec![
    Line::from(vec![
      Span::styled(
        money(view.profile.total_debt),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
      ),
      Span::styled(
        format!("  in public debts · joined {}", view.profile.created_at.format("%Y-%m-%d")),
        Style::default().fg(Color::DarkGray),
      ),
    ]),
    Line::from(""),
  ];
  if view.debts.is_empty() {
    lines.push(Line::from(Span::styled(
      "No public debts.",
      Style::default().fg(Color::DarkGray),
    )));
  }
  for debt in &view.debts {
    let category = debt.category.map(|c| c.label()).unwrap_or("");
    lines.push(Line::from(vec![
      Span::styled("■ ", Style::default().fg(swatch(debt))),
      Span::raw(format!("{:<20}", debt.name)),
      Span::raw(format!("{:>12}", money(debt.amount))),
      Span::styled(format!("  {category}"), Style::default().fg(Color::DarkGray)),
    ]));
  }
  f.render_widget(Paragraph::new(lines).block(block), area);
}
