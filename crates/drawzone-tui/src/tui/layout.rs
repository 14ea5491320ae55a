// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +------------+-------------------------------------+
// | Periods    | Draw table                          |
// | (22 cols)  |                                     |
// +------------+-------------------------------------+
// | Zone panel (9 rows, only while open)              |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const PERIOD_LIST_WIDTH: u16 = 22;
pub const ZONE_PANEL_HEIGHT: u16 = 9;

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: period label, record count, user, load status.
    pub status_bar: Rect,
    /// Left column: selectable periods.
    pub periods: Rect,
    /// Main area: classified draws.
    pub draws: Rect,
    /// Zone reference panel; `None` while closed.
    pub zone_panel: Option<Rect>,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect, zone_panel_open: bool) -> AppLayout {
    let panel_height = if zone_panel_open { ZONE_PANEL_HEIGHT } else { 0 };

    // Vertical: status(1) | middle(fill) | zone panel | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(panel_height),
            Constraint::Length(1),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(PERIOD_LIST_WIDTH), Constraint::Min(20)])
        .split(vertical[1]);

    AppLayout {
        status_bar: vertical[0],
        periods: horizontal[0],
        draws: horizontal[1],
        zone_panel: zone_panel_open.then_some(vertical[2]),
        help_bar: vertical[3],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 160, 50)
    }

    #[test]
    fn layout_all_rects_nonzero() {
        let layout = build_layout(test_area(), true);
        let rects = [
            ("status_bar", layout.status_bar),
            ("periods", layout.periods),
            ("draws", layout.draws),
            ("zone_panel", layout.zone_panel.unwrap()),
            ("help_bar", layout.help_bar),
        ];
        for (name, rect) in &rects {
            assert!(
                rect.width > 0 && rect.height > 0,
                "{} has zero area: {:?}",
                name,
                rect
            );
        }
    }

    #[test]
    fn bars_are_one_row() {
        let layout = build_layout(test_area(), false);
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.help_bar.height, 1);
        assert_eq!(layout.help_bar.y, 49);
    }

    #[test]
    fn zone_panel_only_when_open() {
        assert!(build_layout(test_area(), false).zone_panel.is_none());
        let open = build_layout(test_area(), true);
        assert_eq!(open.zone_panel.unwrap().height, ZONE_PANEL_HEIGHT);
    }

    #[test]
    fn opening_zone_panel_shrinks_draw_table() {
        let closed = build_layout(test_area(), false);
        let open = build_layout(test_area(), true);
        assert_eq!(closed.draws.height - open.draws.height, ZONE_PANEL_HEIGHT);
    }

    #[test]
    fn period_list_has_fixed_width() {
        let layout = build_layout(test_area(), false);
        assert_eq!(layout.periods.width, PERIOD_LIST_WIDTH);
        assert_eq!(layout.draws.x, PERIOD_LIST_WIDTH);
        assert_eq!(layout.draws.width, 160 - PERIOD_LIST_WIDTH);
    }
}
