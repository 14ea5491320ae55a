// Status bar widget: period summary, load status, active group, user.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::{LoadStatus, ViewState};

/// Render the status bar into the given area.
///
/// Layout: [record summary] | [group] | [load status] | [user @ source]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::styled(
        format!(" {} ", state.record_summary()),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    if let Some(group) = state.active_group() {
        spans.push(separator());
        spans.push(Span::styled(
            format!("Group {group}"),
            Style::default().fg(Color::Cyan),
        ));
    }

    if let Some(span) = status_span(&state.status) {
        spans.push(separator());
        spans.push(span);
    }

    if !state.user_label.is_empty() {
        spans.push(separator());
        let who = if state.source.is_empty() {
            state.user_label.clone()
        } else {
            format!("{} @ {}", state.user_label, state.source)
        };
        spans.push(Span::styled(who, Style::default().fg(Color::Gray)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

fn separator() -> Span<'static> {
    Span::styled(" | ", Style::default().fg(Color::Gray))
}

/// Styled load status, or `None` while idle.
pub fn status_span(status: &LoadStatus) -> Option<Span<'static>> {
    match status {
        LoadStatus::Idle => None,
        LoadStatus::Loading(name) => Some(Span::styled(
            format!("loading {name}…"),
            Style::default().fg(Color::Yellow),
        )),
        LoadStatus::Failed(message) => Some(Span::styled(
            format!("error: {message}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
