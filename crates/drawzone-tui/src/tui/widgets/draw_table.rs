// Draw table widget: one row per draw, one verdict column per zone group.
//
// Columns: Date (weekday), Numbers, <group>..., Note
// The active group's header is highlighted; the note column belongs to it.

use chrono::NaiveDate;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use drawzone_core::classify::{Classification, Verdict};

use crate::tui::ViewState;

/// Width of each per-group column: "LARGE 2-2-1".
const GROUP_COLUMN_WIDTH: u16 = 12;

/// Render the draw table into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", state.record_summary()));

    let Some(view) = state.period.as_ref() else {
        let hint = if state.periods.is_empty() {
            "No data available yet."
        } else {
            "Select a period and press Enter."
        };
        frame.render_widget(Paragraph::new(hint).block(block), area);
        return;
    };

    let active_name = state.active_group().map(|g| g.name().to_string());

    let mut header_cells = vec![Cell::from("Date"), Cell::from("Numbers")];
    for group in state.groups.iter() {
        let style = if Some(group.name()) == active_name.as_deref() {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        header_cells.push(Cell::from(group.name().to_string()).style(style));
    }
    header_cells.push(Cell::from(match &active_name {
        Some(name) => format!("Note ({name})"),
        None => "Note".to_string(),
    }));
    let header = Row::new(header_cells).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = view
        .draws
        .iter()
        .map(|cd| {
            let mut cells = vec![
                Cell::from(format_date(cd.draw.date)),
                Cell::from(format_numbers(&cd.draw.numbers)),
            ];
            cells.extend(cd.classifications.iter().map(|c| Cell::from(verdict_line(c))));

            let note = state.note_for(cd.draw.date).unwrap_or_default();
            let note_cell = if note.is_empty() && state.has_any_note(cd.draw.date) {
                // Noted under another group.
                Cell::from(Span::styled("·", Style::default().fg(Color::DarkGray)))
            } else {
                Cell::from(note.to_string())
            };
            cells.push(note_cell);
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(16), Constraint::Length(16)];
    widths.extend(state.groups.iter().map(|_| Constraint::Length(GROUP_COLUMN_WIDTH)));
    widths.push(Constraint::Min(8));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    if !view.draws.is_empty() {
        table_state.select(Some(state.selected_row));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// "2024-01-02 Tue".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d %a").to_string()
}

/// Zero-padded, space-separated: "08 15 19 25 27".
pub fn format_numbers(numbers: &[i64]) -> String {
    numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Verdict label (LARGE red, SMALL green, blank for none) followed by the
/// count pattern.
pub fn verdict_line(classification: &Classification) -> Line<'static> {
    let label = classification.verdict.label();
    let style = match classification.verdict {
        Verdict::Large => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Verdict::Small => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Verdict::None => Style::default(),
    };
    Line::from(vec![
        Span::styled(format!("{label:<5}"), style),
        Span::raw(" "),
        Span::styled(
            classification.pattern.to_string(),
            Style::default().fg(Color::Gray),
        ),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::UiUpdate;
    use crate::tui::apply_ui_update;
    use crate::tui::tests::sample_view;
    use drawzone_core::classify::CountPattern;

    fn buffer_text(terminal: &ratatui::Terminal<ratatui::backend::TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn format_date_includes_weekday() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(format_date(date), "2024-01-02 Tue");
    }

    #[test]
    fn format_numbers_zero_pads() {
        assert_eq!(format_numbers(&[1, 9, 10, 39]), "01 09 10 39");
        assert_eq!(format_numbers(&[]), "");
    }

    #[test]
    fn verdict_colors() {
        let large = verdict_line(&Classification {
            pattern: CountPattern([1, 2, 2]),
            verdict: Verdict::Large,
        });
        assert_eq!(large.spans[0].content, "LARGE");
        assert_eq!(large.spans[0].style.fg, Some(Color::Red));
        assert_eq!(large.spans[2].content, "1-2-2");

        let small = verdict_line(&Classification {
            pattern: CountPattern([3, 1, 1]),
            verdict: Verdict::Small,
        });
        assert_eq!(small.spans[0].style.fg, Some(Color::Green));

        let none = verdict_line(&Classification {
            pattern: CountPattern([5, 0, 0]),
            verdict: Verdict::None,
        });
        assert_eq!(none.spans[0].content.trim(), "");
        assert_eq!(none.spans[2].content, "5-0-0");
    }

    #[test]
    fn render_empty_state() {
        let backend = ratatui::backend::TestBackend::new(100, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state, true))
            .unwrap();
        assert!(buffer_text(&terminal).contains("No data available yet."));
    }

    #[test]
    fn render_shows_draws_and_verdicts() {
        let backend = ratatui::backend::TestBackend::new(140, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::PeriodLoaded(Box::new(sample_view())));
        apply_ui_update(
            &mut state,
            UiUpdate::AnnotationChanged {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                group: "A".into(),
                note: "watch".into(),
            },
        );
        terminal
            .draw(|frame| render(frame, frame.area(), &state, true))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("2024 · 2 records"));
        assert!(text.contains("2024-01-02 Tue"));
        assert!(text.contains("08 15 19 25 27"));
        assert!(text.contains("LARGE 1-2-2"));
        assert!(text.contains("Note (A)"));
        assert!(text.contains("watch"));
    }

    #[test]
    fn render_clamps_in_small_area() {
        let backend = ratatui::backend::TestBackend::new(30, 4);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::PeriodLoaded(Box::new(sample_view())));
        state.selected_row = 1;
        terminal
            .draw(|frame| render(frame, frame.area(), &state, false))
            .unwrap();
    }
}
