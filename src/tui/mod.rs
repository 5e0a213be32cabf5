//! Terminal UI using ratatui.
//!
//! The left side holds the history pane over a one-line command box, the
//! right side draws the current viewer with its readout and color bar.
//! `Tab` moves the keyboard between the command box and the viewer, where
//! the ZVIEW keys move the cursor, zoom and pop up the pick-key plots.

mod app;
mod events;
mod input;
pub mod theme;
mod ui;
mod widgets;

pub use app::{App, Focus};
pub use events::{Event, EventHandler, handle_key_event, handle_mouse_event};
pub use input::{InputLine, Recall};
pub use theme::{ColorScheme, Styles, Theme, colors, current_theme_name, set_theme, toggle_theme};
pub use ui::{render, run_tui};
