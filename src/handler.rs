use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode, DialogKind};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    match app.mode.clone() {
        AppMode::Normal => handle_normal_mode(app, key),
        AppMode::Filter => handle_filter_mode(app, key),
        AppMode::Dialog(kind) => handle_dialog_mode(app, key, &kind),
    }
    app.sync_changes();
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.grid.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.grid.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.grid.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.grid.select_last(),
        KeyCode::Char('l') | KeyCode::Right => app.grid.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.grid.collapse_selected(),
        KeyCode::Enter => app.activate_selected(),
        KeyCode::Backspace => {
            app.grid.exit();
        }
        KeyCode::Char(c @ '0'..='9') => {
            if let Some(index) = c.to_digit(10) {
                app.jump_to_crumb(index as usize);
            }
        }
        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Esc if app.grid.is_filtering() => app.clear_filter(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.flip_sort(),
        KeyCode::Char('a') => app.start_add(false),
        KeyCode::Char('A') => app.start_add(true),
        KeyCode::Char('r') => app.start_rename(),
        KeyCode::Char('d') | KeyCode::Delete => app.start_delete(),
        KeyCode::Char('x') => app.mark_selected(),
        KeyCode::Char('p') => app.move_marked(),
        _ => {}
    }
}

fn handle_filter_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Enter => app.accept_filter(),
        KeyCode::Backspace => app.filter_pop(),
        KeyCode::Down => app.grid.select_next(),
        KeyCode::Up => app.grid.select_previous(),
        KeyCode::Char(c) => app.filter_push(c),
        _ => {}
    }
}

fn handle_dialog_mode(app: &mut App, key: KeyEvent, kind: &DialogKind) {
    match kind {
        DialogKind::DeleteConfirm { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.submit_dialog(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::Error { .. } => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.close_dialog();
            }
        }
        _ => match key.code {
            KeyCode::Enter => app.submit_dialog(),
            KeyCode::Esc => app.close_dialog(),
            KeyCode::Backspace => app.dialog_delete_char(),
            KeyCode::Left => app.dialog_move_cursor_left(),
            KeyCode::Right => app.dialog_move_cursor_right(),
            KeyCode::Home => app.dialog_cursor_home(),
            KeyCode::End => app.dialog_cursor_end(),
            KeyCode::Char(c) => app.dialog_input_char(c),
            _ => {}
        },
    }
}

/// Wheel scrolls the selection, left click selects a row.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if !matches!(app.mode, AppMode::Normal | AppMode::Filter) {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => app.grid.select_next(),
        MouseEventKind::ScrollUp => app.grid.select_previous(),
        MouseEventKind::Down(crossterm::event::MouseButton::Left) => {
            app.click_row(mouse.column, mouse.row)
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AppConfig;
    use crate::remote::LocalRemote;
    use crate::tree::{seed, GridState};

    fn setup_app() -> App {
        let tree = seed::from_json(
            r#"{"data":[
                {"id":"p","type":"projects","attributes":{"name":"Survey"}},
                {"id":"d","type":"folders","attributes":{"name":"data"},"parent":"p"},
                {"id":"f","type":"files","attributes":{"name":"notes.md"},"parent":"p"},
                {"id":"q","type":"projects","attributes":{"name":"Pilot"}}
            ]}"#,
        )
        .unwrap();
        App::new(
            GridState::new(tree),
            AppConfig::default(),
            Arc::new(LocalRemote::default()),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn names(app: &App) -> Vec<String> {
        app.grid
            .visible_ids()
            .iter()
            .map(|id| app.grid.tree().get(*id).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = setup_app();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_keys() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(names(&app), ["Survey", "data", "notes.md", "Pilot"]);
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.grid.selected_index, 3);
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.grid.selected_index, 0);
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(names(&app), ["Survey", "Pilot"]);
    }

    #[test]
    fn enter_backspace_and_crumbs() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(names(&app), ["data", "notes.md"]);
        press(&mut app, KeyCode::Enter);
        assert!(names(&app).is_empty());
        press(&mut app, KeyCode::Backspace);
        assert_eq!(names(&app), ["data", "notes.md"]);
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(names(&app), ["Survey", "Pilot"]);
        press(&mut app, KeyCode::Char('7'));
        assert!(app.status_message.as_ref().unwrap().is_error);
    }

    #[test]
    fn filter_mode_keys() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Char('/'));
        for c in "dat".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(names(&app), ["data"]);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.grid.is_filtering());
        press(&mut app, KeyCode::Esc);
        assert!(!app.grid.is_filtering());
        assert_eq!(names(&app), ["Survey", "Pilot"]);
    }

    #[test]
    fn add_dialog_keys() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Char('A'));
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::AddFolder { .. })));
        for c in "raw".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.in_flight().count(), 0);

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.in_flight().count(), 1);
    }

    #[test]
    fn delete_dialog_cancel() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::DeleteConfirm { .. })));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.in_flight().count(), 0);
    }

    #[test]
    fn sort_keys() {
        let mut app = setup_app();
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(names(&app), ["Pilot", "Survey"]);
        press(&mut app, KeyCode::Char('S'));
        assert_eq!(names(&app), ["Survey", "Pilot"]);
    }

    #[test]
    fn error_dialog_dismisses() {
        let mut app = setup_app();
        app.open_dialog(DialogKind::Error {
            message: "boom".into(),
        });
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
    }
}
