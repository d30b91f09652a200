use crossterm::event::KeyCode;

use crate::api::DnsBackend;
use crate::app::{App, Field, Focus, Mode, Task};

/// Routes a key press to the handler for the current mode. Returns `true`
/// when the application should exit.
pub fn handle_key<B: DnsBackend>(code: KeyCode, app: &mut App<B>) -> bool {
    match app.mode {
        Mode::Normal => handle_normal_key(code, app),
        Mode::TokenEntry(_) => handle_token_key(code, app),
        Mode::RecordForm(_) => handle_record_form_key(code, app),
        Mode::ConfirmDelete(_) => handle_confirm_delete_key(code, app),
        Mode::Searching(_) => handle_search_key(code, app),
    }
}

fn handle_normal_key<B: DnsBackend>(code: KeyCode, app: &mut App<B>) -> bool {
    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('k') => app.start_token_entry(),
        KeyCode::Char('z') => app.change_zone(),
        KeyCode::Char('r') => {
            if app.current_zone.is_some() {
                app.queue(Task::Reload);
            } else {
                app.queue(Task::LoadZones);
            }
        }
        KeyCode::Char('/') => app.mode = Mode::Searching(app.search.clone()),
        KeyCode::Char('t') => app.cycle_type_filter(1),
        KeyCode::Char('T') => app.cycle_type_filter(-1),
        KeyCode::Char('n') => app.start_create(),
        KeyCode::Char('e') => app.edit_selected(),
        KeyCode::Char('d') => app.ask_delete(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::Zones => Focus::Records,
                Focus::Records => Focus::Zones,
            }
        }
        KeyCode::Enter if app.focus == Focus::Zones => {
            app.queue(Task::SelectZone(app.selected_zone));
        }
        KeyCode::Up => match app.focus {
            Focus::Zones => app.previous_zone(),
            Focus::Records => app.previous_record(),
        },
        KeyCode::Down => match app.focus {
            Focus::Zones => app.next_zone(),
            Focus::Records => app.next_record(),
        },
        KeyCode::PageDown => app.next_page(),
        KeyCode::PageUp => app.previous_page(),
        _ => {}
    }

    false
}

fn handle_token_key<B: DnsBackend>(code: KeyCode, app: &mut App<B>) -> bool {
    let Mode::TokenEntry(token) = &mut app.mode else {
        return false;
    };

    match code {
        KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Enter => {
            let token = token.clone();
            app.mode = Mode::Normal;
            app.queue(Task::SaveToken(token));
        }
        KeyCode::Backspace => {
            token.pop();
        }
        KeyCode::Char(c) => token.push(c),
        _ => {}
    }

    false
}

fn handle_record_form_key<B: DnsBackend>(code: KeyCode, app: &mut App<B>) -> bool {
    let Mode::RecordForm(form) = &mut app.mode else {
        return false;
    };

    match code {
        KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Left => form.cycle_type(-1),
        KeyCode::Right => form.cycle_type(1),
        KeyCode::Enter => {
            if form.is_last_field() {
                app.submit_form();
            } else {
                form.next_field();
            }
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => {
            if form.active_field() == Field::Type && c != ' ' {
                return false;
            }
            form.insert_char(c);
        }
        _ => {}
    }

    false
}

fn handle_confirm_delete_key<B: DnsBackend>(code: KeyCode, app: &mut App<B>) -> bool {
    let Mode::ConfirmDelete(confirm) = &app.mode else {
        return false;
    };

    match code {
        KeyCode::Esc | KeyCode::Char('n') => app.mode = Mode::Normal,
        KeyCode::Enter | KeyCode::Char('y') => {
            let record_id = confirm.record_id.clone();
            app.mode = Mode::Normal;
            app.queue(Task::Delete(record_id));
        }
        _ => {}
    }

    false
}

fn handle_search_key<B: DnsBackend>(code: KeyCode, app: &mut App<B>) -> bool {
    let Mode::Searching(current) = &mut app.mode else {
        return false;
    };

    match code {
        KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Enter => {
            let text = current.clone();
            app.mode = Mode::Normal;
            app.apply_search(text);
        }
        KeyCode::Backspace => {
            current.pop();
            let text = current.clone();
            app.apply_search(text);
        }
        KeyCode::Char(c) => {
            current.push(c);
            let text = current.clone();
            app.apply_search(text);
        }
        _ => {}
    }

    false
}
