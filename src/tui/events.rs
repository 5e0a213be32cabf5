//! Event polling and key dispatch.

use super::app::{App, Focus};
use super::theme::toggle_theme;
use crate::config::TuiPreferences;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Application event
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Poll timeout with nothing to read.
    Tick,
    Resize(u16, u16),
}

/// Event handler
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub const fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Poll for the next event
    pub fn next(&self) -> Result<Event, std::io::Error> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                CrosstermEvent::Key(key) => Ok(Event::Key(key)),
                CrosstermEvent::Mouse(mouse) => Ok(Event::Mouse(mouse)),
                CrosstermEvent::Resize(width, height) => Ok(Event::Resize(width, height)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(crate::config::AppConfig::default().tui.tick_rate_ms)
    }
}

const PAGE: usize = 10;

/// Handle key events and update app state
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    app.clear_status_message();

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_focus();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_history_up(PAGE);
            return;
        }
        KeyCode::PageDown => {
            app.scroll_history_down(PAGE);
            return;
        }
        KeyCode::Esc if app.show_plot => {
            app.close_plot();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Command => handle_command_key(app, key),
        Focus::Viewer => handle_viewer_key(app, key),
    }
}

fn handle_command_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => app.submit(),
        KeyCode::Up => app.recall_older(),
        KeyCode::Down => app.recall_newer(),
        KeyCode::Left => app.input.left(),
        KeyCode::Right => app.input.right(),
        KeyCode::Home => app.input.home(),
        KeyCode::End => app.input.end(),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Esc => {
            app.input.take();
        }
        KeyCode::Char('a') if ctrl => app.input.home(),
        KeyCode::Char('e') if ctrl => app.input.end(),
        KeyCode::Char('u') if ctrl => {
            app.input.take();
        }
        KeyCode::Char('w') if ctrl => app.input.delete_word(),
        KeyCode::Char(c) if !ctrl => app.input.insert(c),
        _ => {}
    }
}

fn handle_viewer_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('p') => app.radial_plot(),
        KeyCode::Char('e') => app.contour_plot(),
        KeyCode::Char('g') => app.gaussians_plot(),
        KeyCode::Char('T') => {
            let name = toggle_theme();
            let prefs = TuiPreferences {
                theme: Some(name.to_string()),
            };
            if let Err(e) = prefs.save() {
                tracing::warn!("could not save theme preference: {e}");
            }
            app.set_status_message(format!("Theme: {name}"));
        }
        code => {
            let Some(viewer) = app.session.current_viewer_mut() else {
                return;
            };
            // One terminal cell per step; shifted keys move ten.
            let step = (1.0 / viewer.scale()).max(1.0);
            match code {
                KeyCode::Left | KeyCode::Char('h') => viewer.move_cursor(-step, 0.0),
                KeyCode::Right | KeyCode::Char('l') => viewer.move_cursor(step, 0.0),
                KeyCode::Up | KeyCode::Char('k') => viewer.move_cursor(0.0, step),
                KeyCode::Down | KeyCode::Char('j') => viewer.move_cursor(0.0, -step),
                KeyCode::Char('H') => viewer.move_cursor(-10.0 * step, 0.0),
                KeyCode::Char('L') => viewer.move_cursor(10.0 * step, 0.0),
                KeyCode::Char('K') => viewer.move_cursor(0.0, 10.0 * step),
                KeyCode::Char('J') => viewer.move_cursor(0.0, -10.0 * step),
                KeyCode::Char('+' | '=') => viewer.zoom_in(),
                KeyCode::Char('-') => viewer.zoom_out(),
                KeyCode::Char('0') => viewer.zoom_fit(),
                KeyCode::Char('c') => viewer.center_on_cursor(),
                KeyCode::Char('i') => viewer.invert_cmap(),
                _ => {}
            }
        }
    }
}

/// Mouse: wheel scrolls the history, a left click in the image moves the cursor.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_history_up(3),
        MouseEventKind::ScrollDown => app.scroll_history_down(3),
        MouseEventKind::Down(MouseButton::Left) => {
            let area = app.image_area;
            let inside = mouse.column >= area.x
                && mouse.column < area.x + area.width
                && mouse.row >= area.y
                && mouse.row < area.y + area.height;
            if !inside {
                return;
            }
            let (w, h) = (area.width as usize, area.height as usize * 2);
            let sx = f64::from(mouse.column - area.x) + 0.5;
            let sy = f64::from(mouse.row - area.y).mul_add(2.0, 1.0);
            if let Some(viewer) = app.session.current_viewer_mut() {
                let (x, y) = viewer.screen_to_data(sx, sy, w, h);
                viewer.set_cursor(x, y);
                app.focus = Focus::Viewer;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::Header;
    use crate::model::{AstroImage, Grid};
    use crate::session::Session;
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_line(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key_event(app, key(KeyCode::Char(c)));
        }
        handle_key_event(app, key(KeyCode::Enter));
    }

    fn app_with_image() -> App {
        let mut app = App::new(Session::default());
        type_line(&mut app, "mkv main 40 40");
        let grid = Grid::from_fn(20, 20, |x, y| (x + y) as f64);
        app.session
            .current_viewer_mut()
            .unwrap()
            .set_image(Arc::new(AstroImage::new(grid, Header::new())));
        app
    }

    #[test]
    fn test_typing_executes_command() {
        let mut app = App::new(Session::default());
        type_line(&mut app, "lsv");
        assert_eq!(app.session.history().last(), Some("No viewers"));
        handle_key_event(&mut app, key(KeyCode::Up));
        assert_eq!(app.input.text(), "lsv");
    }

    #[test]
    fn test_ctrl_c_quits_in_any_focus() {
        let mut app = App::new(Session::default());
        app.toggle_focus();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_switches_focus() {
        let mut app = App::new(Session::default());
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Viewer);
        // Viewer keys do not reach the command line.
        handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_viewer_keys() {
        let mut app = app_with_image();
        handle_key_event(&mut app, key(KeyCode::Tab));
        let before = app.session.current_viewer().unwrap().cursor();
        handle_key_event(&mut app, key(KeyCode::Char('l')));
        let after = app.session.current_viewer().unwrap().cursor();
        assert!(after.0 > before.0);
        assert_eq!(after.1, before.1);

        handle_key_event(&mut app, key(KeyCode::Char('+')));
        assert!(!app.session.current_viewer().unwrap().is_autozoom());
        handle_key_event(&mut app, key(KeyCode::Char('0')));
        assert!(app.session.current_viewer().unwrap().is_autozoom());

        handle_key_event(&mut app, key(KeyCode::Char('i')));
        assert!(app.session.current_viewer().unwrap().is_inverted());
    }

    #[test]
    fn test_esc_closes_plot() {
        let mut app = App::new(Session::default());
        app.show_plot = true;
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_plot);
    }
}
