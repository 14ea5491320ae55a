// TUI widget modules for each dashboard panel.

pub mod draw_table;
pub mod overlay;
pub mod period_list;
pub mod status_bar;
pub mod zone_panel;
