//! TUI application state wrapped around a [`Session`].

use super::input::{InputLine, Recall};
use crate::session::Session;
use ratatui::layout::Rect;

/// Which pane receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Command,
    /// Keys drive the current viewer (ZVIEW pick mode).
    Viewer,
}

impl Focus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Viewer => "zview",
        }
    }
}

pub struct App {
    pub session: Session,
    pub focus: Focus,
    pub input: InputLine,
    pub recall: Recall,
    /// History lines scrolled up from the bottom.
    pub history_scroll: usize,
    pub show_plot: bool,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub tick: u64,
    /// Where the image was last drawn, for mouse hits.
    pub image_area: Rect,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            focus: Focus::default(),
            input: InputLine::default(),
            recall: Recall::default(),
            history_scroll: 0,
            show_plot: false,
            should_quit: false,
            status_message: None,
            tick: 0,
            image_area: Rect::default(),
        }
    }

    /// Execute the command line.
    pub fn submit(&mut self) {
        let text = self.input.take();
        self.recall.push(&text);
        self.session.exec_cmd(&text);
        self.history_scroll = 0;
        if self.session.should_quit() {
            self.should_quit = true;
        }
    }

    pub fn recall_older(&mut self) {
        if let Some(entry) = self.recall.older() {
            let entry = entry.to_string();
            self.input.set(entry);
        }
    }

    pub fn recall_newer(&mut self) {
        match self.recall.newer() {
            Some(entry) => {
                let entry = entry.to_string();
                self.input.set(entry);
            }
            None => {
                self.input.take();
            }
        }
    }

    pub fn scroll_history_up(&mut self, lines: usize) {
        let max = self.session.history().len().saturating_sub(1);
        self.history_scroll = (self.history_scroll + lines).min(max);
    }

    pub const fn scroll_history_down(&mut self, lines: usize) {
        self.history_scroll = self.history_scroll.saturating_sub(lines);
    }

    pub const fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Command => Focus::Viewer,
            Focus::Viewer => Focus::Command,
        };
    }

    pub fn radial_plot(&mut self) {
        self.session.radial_plot();
        self.after_plot();
    }

    pub fn contour_plot(&mut self) {
        self.session.contour_plot();
        self.after_plot();
    }

    pub fn gaussians_plot(&mut self) {
        self.session.gaussians_plot();
        self.after_plot();
    }

    fn after_plot(&mut self) {
        self.show_plot = self.session.plot().is_some();
        self.history_scroll = 0;
    }

    pub fn close_plot(&mut self) {
        self.show_plot = false;
    }

    pub fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    /// Mode shown in the viewer title badge.
    pub const fn mode_label(&self) -> &'static str {
        if self.show_plot { "plot" } else { self.focus.label() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_recall() {
        let mut app = App::new(Session::default());
        app.input.set("lsv");
        app.submit();
        assert!(app.input.is_empty());
        assert_eq!(app.session.history().last(), Some("No viewers"));

        app.recall_older();
        assert_eq!(app.input.text(), "lsv");
        app.recall_newer();
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_quit_command() {
        let mut app = App::new(Session::default());
        app.input.set("quit");
        app.submit();
        assert!(app.should_quit);
    }

    #[test]
    fn test_scroll_is_bounded() {
        let mut app = App::new(Session::default());
        app.input.set("help");
        app.submit();
        let len = app.session.history().len();
        app.scroll_history_up(10_000);
        assert_eq!(app.history_scroll, len - 1);
        app.scroll_history_down(10_000);
        assert_eq!(app.history_scroll, 0);
    }

    #[test]
    fn test_plot_without_viewer_stays_closed() {
        let mut app = App::new(Session::default());
        app.toggle_focus();
        assert_eq!(app.mode_label(), "zview");
        app.radial_plot();
        assert!(!app.show_plot);
    }
}
