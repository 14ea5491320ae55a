// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (focus, selection,
// group switching, the zone panel and the note editor).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{Focus, NoteEditor, ViewState};
use crate::protocol::UserCommand;

/// Rows moved by PageUp/PageDown.
const PAGE_SIZE: usize = 20;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator, `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports both Press and Release.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.editor.is_some() {
        return handle_editor(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Tab | KeyCode::BackTab => {
            view_state.focus = match view_state.focus {
                Focus::Periods => Focus::Draws,
                Focus::Draws => Focus::Periods,
            };
            None
        }

        KeyCode::Up | KeyCode::Char('k') => {
            move_cursor(view_state, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_cursor(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            move_cursor(view_state, -(PAGE_SIZE as isize));
            None
        }
        KeyCode::PageDown => {
            move_cursor(view_state, PAGE_SIZE as isize);
            None
        }
        KeyCode::Home | KeyCode::Char('g') => {
            move_cursor(view_state, isize::MIN);
            None
        }
        KeyCode::End | KeyCode::Char('G') => {
            move_cursor(view_state, isize::MAX);
            None
        }

        KeyCode::Left | KeyCode::Char('h') => switch_group(view_state, -1),
        KeyCode::Right | KeyCode::Char('l') => switch_group(view_state, 1),

        KeyCode::Enter => {
            if view_state.focus == Focus::Periods {
                view_state
                    .periods
                    .get(view_state.period_cursor)
                    .map(|p| UserCommand::LoadPeriod(p.name.clone()))
            } else {
                None
            }
        }

        KeyCode::Char('r') => Some(UserCommand::RefreshPeriods),
        KeyCode::Char('z') => toggle_zone_panel(view_state),
        KeyCode::Char('e') => {
            open_editor(view_state);
            None
        }

        KeyCode::Esc => {
            view_state.zone_panel_open = false;
            None
        }

        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

/// `y`/`q` confirm, `n`/Esc cancel, everything else is swallowed.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// Text entry for the note editor. Enter saves, Esc discards.
fn handle_editor(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let editor = view_state.editor.as_mut()?;
    match key_event.code {
        KeyCode::Esc => {
            view_state.editor = None;
            None
        }
        KeyCode::Enter => {
            let NoteEditor { date, group, text } = view_state.editor.take()?;
            Some(UserCommand::SaveAnnotation {
                date,
                group,
                note: text,
            })
        }
        KeyCode::Backspace => {
            editor.text.pop();
            None
        }
        KeyCode::Char(c) => {
            editor.text.push(c);
            None
        }
        _ => None,
    }
}

/// Move the cursor of the focused pane by `delta`, clamped to its length.
fn move_cursor(view_state: &mut ViewState, delta: isize) {
    let (cursor, len) = match view_state.focus {
        Focus::Periods => (&mut view_state.period_cursor, view_state.periods.len()),
        Focus::Draws => {
            let len = view_state.draws().len();
            (&mut view_state.selected_row, len)
        }
    };
    if len == 0 {
        *cursor = 0;
        return;
    }
    let next = if delta.is_negative() {
        cursor.saturating_sub(delta.unsigned_abs())
    } else {
        cursor.saturating_add(delta.unsigned_abs())
    };
    *cursor = next.min(len - 1);
}

/// Cycle the active group, wrapping at both ends. While the zone panel is
/// open it follows, and the choice is remembered.
fn switch_group(view_state: &mut ViewState, delta: isize) -> Option<UserCommand> {
    let count = view_state.groups.len();
    if count == 0 {
        return None;
    }
    let current = view_state.active_group as isize;
    view_state.active_group = (current + delta).rem_euclid(count as isize) as usize;

    if view_state.zone_panel_open {
        view_state
            .active_group()
            .map(|g| UserCommand::SelectGroup(g.name().to_string()))
    } else {
        None
    }
}

fn toggle_zone_panel(view_state: &mut ViewState) -> Option<UserCommand> {
    view_state.zone_panel_open = !view_state.zone_panel_open;
    if view_state.zone_panel_open {
        view_state
            .active_group()
            .map(|g| UserCommand::SelectGroup(g.name().to_string()))
    } else {
        None
    }
}

/// Open the note editor on the selected draw under the active group,
/// pre-filled with any existing note.
fn open_editor(view_state: &mut ViewState) {
    let Some(date) = view_state.selected_draw().map(|d| d.draw.date) else {
        return;
    };
    let Some(group) = view_state.active_group().map(|g| g.name().to_string()) else {
        return;
    };
    let text = view_state.note_for(date).unwrap_or_default().to_string();
    view_state.editor = Some(NoteEditor { date, group, text });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
