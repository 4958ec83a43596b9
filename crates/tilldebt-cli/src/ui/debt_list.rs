//! Own-debt list pane, the left panel of the dashboard.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::{money, swatch};
use crate::app::App;

/// Render the debt list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let debts = app.ctx.debts();

  let block = Block::default()
    .title(format!(" Debts ({}) — total {} ", debts.len(), money(app.ctx.total())))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if debts.is_empty() {
    f.render_widget(
      Paragraph::new("No debts yet. Press n to add one.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = debts
    .iter()
    .map(|debt| {
      let lock = if debt.private { " 🔒" } else { "" };
      let category = debt.category.map(|c| c.label()).unwrap_or("");
      ListItem::new(Line::from(vec![
        Span::styled("■ ", Style::default().fg(swatch(debt))),
        Span::raw(format!("{:<20}", debt.name)),
        Span::styled(format!("{:>12}", money(debt.amount)), Style::default().fg(Color::White)),
        Span::styled(format!("  {category}{lock}"), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

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
