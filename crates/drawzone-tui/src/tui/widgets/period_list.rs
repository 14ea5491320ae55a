// Period list widget: the selectable data files, newest first.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the period list. The entry under the cursor is highlighted and the
/// period currently on display is marked with `*`.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, focused: bool) {
    let shown = state.period.as_ref().map(|p| p.period.name.as_str());

    let items: Vec<ListItem> = state
        .periods
        .iter()
        .map(|p| {
            let marker = if Some(p.name.as_str()) == shown { "*" } else { " " };
            ListItem::new(format!("{marker} {}", p.label()))
        })
        .collect();

    let title = if state.periods.is_empty() {
        " Periods (none) ".to_string()
    } else {
        format!(" Periods ({}) ", state.periods.len())
    };

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !state.periods.is_empty() {
        list_state.select(Some(state.period_cursor));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
