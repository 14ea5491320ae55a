// Zone reference panel: one tab per group, the three zones of the active
// group listed underneath.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use drawzone_core::zones::ZoneGroup;

use crate::tui::ViewState;

/// Render the zone panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Zones ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [tabs_area, body_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let titles: Vec<Line> = state
        .groups
        .iter()
        .map(|g| Line::from(g.name().to_string()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.active_group)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, tabs_area);

    let Some(group) = state.active_group() else {
        return;
    };

    let columns = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(body_area);

    for (idx, line) in zone_lines(group).into_iter().enumerate() {
        let paragraph = Paragraph::new(line)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title(format!("Zone {}", idx + 1)),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[idx]);
    }
}

/// Each zone's members, ascending, zero-padded and space-separated.
pub fn zone_lines(group: &ZoneGroup) -> [String; 3] {
    group.zones().each_ref().map(|zone| {
        zone.numbers()
            .map(|n| format!("{n:02}"))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use drawzone_core::zones::{GROUP_A, GROUP_C};

    #[test]
    fn zone_lines_are_sorted_and_padded() {
        let lines = zone_lines(GROUP_A);
        assert_eq!(lines[0], "02 04 05 06 07 11 12 14 15 16");
        assert!(lines[2].starts_with("01 03 08"));

        let lines = zone_lines(GROUP_C);
        assert_eq!(lines[0], "20 21 22 23 24 25 26 27 28 29");
    }

    #[test]
    fn render_shows_active_group_zones() {
        let backend = ratatui::backend::TestBackend::new(140, 9);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.active_group = 2;
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("New-B"));
        assert!(text.contains("Zone 1"));
        assert!(text.contains("20 21 22 23 24"));
    }

    #[test]
    fn render_survives_tiny_area() {
        let backend = ratatui::backend::TestBackend::new(10, 2);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
