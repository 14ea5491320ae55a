// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app orchestrator has
// loaded. The orchestrator pushes `UiUpdate` messages over an mpsc channel;
// the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use drawzone_core::period::PeriodDescriptor;
use drawzone_core::zones::{GroupSet, ZoneGroup};

use crate::protocol::{ClassifiedDraw, PeriodView, UiUpdate, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Periods,
    Draws,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading(String),
    Failed(String),
}

/// An annotation being edited for one draw under one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEditor {
    pub date: NaiveDate,
    pub group: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
pub struct ViewState {
    pub user_label: String,
    pub source: String,
    pub groups: GroupSet,
    pub periods: Vec<PeriodDescriptor>,
    /// Highlighted entry in the period list.
    pub period_cursor: usize,
    /// The period currently displayed, if any.
    pub period: Option<PeriodView>,
    pub status: LoadStatus,
    pub focus: Focus,
    /// Highlighted row in the draw table.
    pub selected_row: usize,
    /// Index into `groups` of the group the note column and the zone panel
    /// refer to.
    pub active_group: usize,
    pub zone_panel_open: bool,
    pub editor: Option<NoteEditor>,
    pub confirm_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            user_label: String::new(),
            source: String::new(),
            groups: GroupSet::default(),
            periods: Vec::new(),
            period_cursor: 0,
            period: None,
            status: LoadStatus::Idle,
            focus: Focus::Draws,
            selected_row: 0,
            active_group: 0,
            zone_panel_open: false,
            editor: None,
            confirm_quit: false,
        }
    }
}

impl ViewState {
    pub fn draws(&self) -> &[ClassifiedDraw] {
        self.period
            .as_ref()
            .map(|p| p.draws.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_draw(&self) -> Option<&ClassifiedDraw> {
        self.draws().get(self.selected_row)
    }

    pub fn active_group(&self) -> Option<&ZoneGroup> {
        self.groups.as_slice().get(self.active_group)
    }

    /// Note stored for `date` under the active group.
    pub fn note_for(&self, date: NaiveDate) -> Option<&str> {
        let group = self.active_group()?.name().to_string();
        self.period
            .as_ref()?
            .annotations
            .get(&(date, group))
            .map(String::as_str)
    }

    /// True when `date` has a note under any group.
    pub fn has_any_note(&self, date: NaiveDate) -> bool {
        self.period
            .as_ref()
            .is_some_and(|p| p.annotations.keys().any(|(d, _)| *d == date))
    }

    /// Header summary: "2024 · 5 records", or a prompt when nothing is loaded.
    pub fn record_summary(&self) -> String {
        match &self.period {
            Some(view) if !view.draws.is_empty() => {
                format!("{} · {} records", view.period.label(), view.draws.len())
            }
            Some(view) => format!("{} · no records", view.period.label()),
            None => "select a period".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Session(info) => {
            state.active_group = info.groups.position(&info.default_group).unwrap_or(0);
            state.user_label = info.user_label;
            state.source = info.source;
            state.groups = info.groups;
        }
        UiUpdate::Periods(periods) => {
            state.periods = periods;
            state.period_cursor = state.period_cursor.min(state.periods.len().saturating_sub(1));
            if state.periods.is_empty() {
                state.focus = Focus::Periods;
            }
        }
        UiUpdate::PeriodsFailed(message) => {
            state.status = LoadStatus::Failed(format!("listing failed: {message}"));
        }
        UiUpdate::Loading(name) => {
            if let Some(idx) = state.periods.iter().position(|p| p.name == name) {
                state.period_cursor = idx;
            }
            state.status = LoadStatus::Loading(name);
        }
        UiUpdate::PeriodLoaded(view) => {
            state.period = Some(*view);
            state.selected_row = 0;
            state.status = LoadStatus::Idle;
            state.editor = None;
        }
        UiUpdate::LoadFailed { name, message } => {
            state.status = LoadStatus::Failed(format!("{name}: {message}"));
        }
        UiUpdate::AnnotationChanged { date, group, note } => {
            if let Some(view) = state.period.as_mut() {
                if note.is_empty() {
                    view.annotations.remove(&(date, group));
                } else {
                    view.annotations.insert((date, group), note);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area(), state.zone_panel_open);

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::period_list::render(frame, layout.periods, state, state.focus == Focus::Periods);
    widgets::draw_table::render(frame, layout.draws, state, state.focus == Focus::Draws);
    if let Some(area) = layout.zone_panel {
        widgets::zone_panel::render(frame, area, state);
    }
    render_help_bar(frame, layout.help_bar, state);

    if let Some(editor) = &state.editor {
        widgets::overlay::render_note_editor(frame, frame.area(), editor);
    }
    if state.confirm_quit {
        widgets::overlay::render_quit_confirm(frame, frame.area());
    }
}

fn help_text(state: &ViewState) -> &'static str {
    if state.editor.is_some() {
        " Enter:Save | Esc:Cancel | empty note removes it"
    } else if state.confirm_quit {
        " y:Quit | n:Stay"
    } else {
        " ↑↓/jk:Rows | PgUp/PgDn | ←→/hl:Group | Tab:Focus | Enter:Load | z:Zones | e:Note | r:Refresh | q:Quit"
    }
}

fn render_help_bar(frame: &mut Frame, area: ratatui::layout::Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state),
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // App loop has shut down.
                    None => break Ok(()),
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(anyhow::Error::from(e).context("terminal input failed")),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(anyhow::Error::from(e).context("failed to draw frame"));
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
