//! Color themes for the TUI.
//!
//! The active theme lives in a process-wide lock so widgets can fetch
//! colors without threading a theme through every render call.

use ratatui::prelude::*;
use std::sync::{PoisonError, RwLock};

/// Names accepted by [`Theme::from_name`], in cycling order.
pub const THEME_NAMES: [&str; 4] = ["dark", "light", "night", "high-contrast"];

/// Semantic colors of one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    // Pane chrome
    pub title: Color,
    pub frame: Color,
    pub frame_focused: Color,
    pub status_bg: Color,

    // Text
    pub text: Color,
    pub text_dim: Color,
    pub label: Color,
    pub highlight: Color,
    pub prompt: Color,
    pub warning: Color,
    pub error: Color,

    // Mode badges
    pub badge_fg: Color,
    pub mode_command: Color,
    pub mode_zview: Color,
    pub mode_plot: Color,

    // Image and plots
    pub cursor: Color,
    pub plot_points: Color,
    pub plot_fit: Color,
}

impl ColorScheme {
    pub const fn dark() -> Self {
        Self {
            title: Color::LightBlue,
            frame: Color::Rgb(70, 70, 90),
            frame_focused: Color::LightBlue,
            status_bg: Color::Rgb(24, 26, 36),

            text: Color::Rgb(220, 220, 225),
            text_dim: Color::Rgb(140, 140, 150),
            label: Color::Rgb(110, 110, 125),
            highlight: Color::Rgb(240, 200, 80),
            prompt: Color::LightGreen,
            warning: Color::Rgb(240, 170, 60),
            error: Color::Rgb(235, 90, 90),

            badge_fg: Color::Black,
            mode_command: Color::LightBlue,
            mode_zview: Color::LightGreen,
            mode_plot: Color::Rgb(240, 200, 80),

            cursor: Color::LightGreen,
            plot_points: Color::LightCyan,
            plot_fit: Color::LightRed,
        }
    }

    pub const fn light() -> Self {
        Self {
            title: Color::Rgb(20, 70, 160),
            frame: Color::Rgb(185, 185, 195),
            frame_focused: Color::Rgb(20, 70, 160),
            status_bg: Color::Rgb(232, 234, 240),

            text: Color::Rgb(25, 25, 30),
            text_dim: Color::Rgb(95, 95, 105),
            label: Color::Rgb(130, 130, 140),
            highlight: Color::Rgb(170, 110, 0),
            prompt: Color::Rgb(0, 120, 40),
            warning: Color::Rgb(170, 100, 0),
            error: Color::Rgb(190, 20, 20),

            badge_fg: Color::White,
            mode_command: Color::Rgb(20, 70, 160),
            mode_zview: Color::Rgb(0, 120, 40),
            mode_plot: Color::Rgb(170, 110, 0),

            cursor: Color::Rgb(0, 150, 50),
            plot_points: Color::Rgb(20, 70, 160),
            plot_fit: Color::Rgb(190, 20, 20),
        }
    }

    /// Reds only, for use at the telescope.
    pub const fn night() -> Self {
        Self {
            title: Color::Rgb(220, 60, 50),
            frame: Color::Rgb(90, 20, 20),
            frame_focused: Color::Rgb(200, 50, 40),
            status_bg: Color::Rgb(25, 0, 0),

            text: Color::Rgb(200, 60, 50),
            text_dim: Color::Rgb(140, 40, 35),
            label: Color::Rgb(110, 30, 25),
            highlight: Color::Rgb(255, 90, 70),
            prompt: Color::Rgb(240, 80, 60),
            warning: Color::Rgb(255, 110, 80),
            error: Color::Rgb(255, 40, 30),

            badge_fg: Color::Black,
            mode_command: Color::Rgb(160, 40, 30),
            mode_zview: Color::Rgb(220, 60, 50),
            mode_plot: Color::Rgb(255, 90, 70),

            cursor: Color::Rgb(255, 70, 50),
            plot_points: Color::Rgb(200, 60, 50),
            plot_fit: Color::Rgb(255, 120, 90),
        }
    }

    pub const fn high_contrast() -> Self {
        Self {
            title: Color::White,
            frame: Color::Gray,
            frame_focused: Color::LightYellow,
            status_bg: Color::Black,

            text: Color::White,
            text_dim: Color::Gray,
            label: Color::Gray,
            highlight: Color::LightYellow,
            prompt: Color::LightCyan,
            warning: Color::LightYellow,
            error: Color::LightRed,

            badge_fg: Color::Black,
            mode_command: Color::LightCyan,
            mode_zview: Color::LightGreen,
            mode_plot: Color::LightYellow,

            cursor: Color::LightMagenta,
            plot_points: Color::White,
            plot_fit: Color::LightRed,
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::dark()
    }
}

static THEME: RwLock<Theme> = RwLock::new(Theme::dark());

/// A named color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub colors: ColorScheme,
}

impl Theme {
    pub const fn dark() -> Self {
        Self {
            name: "dark",
            colors: ColorScheme::dark(),
        }
    }

    /// Look up a theme; unknown names fall back to `dark`.
    pub fn from_name(name: &str) -> Self {
        let (name, colors) = match name.to_lowercase().as_str() {
            "light" => ("light", ColorScheme::light()),
            "night" | "red" => ("night", ColorScheme::night()),
            "high-contrast" | "highcontrast" | "hc" => ("high-contrast", ColorScheme::high_contrast()),
            _ => ("dark", ColorScheme::dark()),
        };
        Self { name, colors }
    }

    /// The theme after this one in [`THEME_NAMES`].
    #[must_use]
    pub fn next(&self) -> Self {
        let i = THEME_NAMES.iter().position(|n| *n == self.name).unwrap_or(0);
        Self::from_name(THEME_NAMES[(i + 1) % THEME_NAMES.len()])
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

pub fn current_theme_name() -> &'static str {
    THEME.read().unwrap_or_else(PoisonError::into_inner).name
}

pub fn set_theme(theme: Theme) {
    *THEME.write().unwrap_or_else(PoisonError::into_inner) = theme;
}

/// Switch to the next theme and return its name.
pub fn toggle_theme() -> &'static str {
    let mut theme = THEME.write().unwrap_or_else(PoisonError::into_inner);
    *theme = theme.next();
    theme.name
}

pub fn colors() -> ColorScheme {
    THEME.read().unwrap_or_else(PoisonError::into_inner).colors
}

/// Shorthand styles built from the active theme.
pub struct Styles;

impl Styles {
    pub fn title() -> Style {
        Style::default().fg(colors().title).bold()
    }

    pub fn frame(focused: bool) -> Style {
        let c = colors();
        Style::default().fg(if focused { c.frame_focused } else { c.frame })
    }

    pub fn text() -> Style {
        Style::default().fg(colors().text)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(colors().text_dim)
    }

    pub fn label() -> Style {
        Style::default().fg(colors().label)
    }

    pub fn value() -> Style {
        Style::default().fg(colors().text).bold()
    }

    pub fn highlight() -> Style {
        Style::default().fg(colors().highlight)
    }

    pub fn status_bar() -> Style {
        Style::default().bg(colors().status_bg)
    }

    pub fn prompt() -> Style {
        Style::default().fg(colors().prompt).bold()
    }

    pub fn warning() -> Style {
        Style::default().fg(colors().warning)
    }

    pub fn error() -> Style {
        Style::default().fg(colors().error)
    }
}

/// Style of a history line, keyed on its content.
pub fn history_line_style(line: &str) -> Style {
    let body = strip_time_prefix(line);
    if body.starts_with("ZVIEW>") {
        Styles::prompt()
    } else if body.starts_with("!!") {
        Styles::error()
    } else if body.starts_with("warning:") {
        Styles::warning()
    } else {
        Styles::text()
    }
}

/// Drop a leading `HH:MM:SS ` stamp.
fn strip_time_prefix(line: &str) -> &str {
    let bytes = line.as_bytes();
    let stamped = bytes.len() >= 9
        && bytes[2] == b':'
        && bytes[5] == b':'
        && bytes[8] == b' '
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());
    if stamped { &line[9..] } else { line }
}

/// Badge naming the keyboard mode, shown in the viewer title.
pub fn mode_badge(mode: &str) -> Span<'static> {
    let c = colors();
    let bg = match mode {
        "command" => c.mode_command,
        "zview" => c.mode_zview,
        "plot" => c.mode_plot,
        _ => c.label,
    };
    Span::styled(
        format!(" {} ", mode.to_uppercase()),
        Style::default().fg(c.badge_fg).bg(bg).bold(),
    )
}

/// Key hints per mode, as `(key, action)` pairs.
pub struct FooterHints;

impl FooterHints {
    pub fn command() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Enter", "run"),
            ("↑↓", "recall"),
            ("PgUp/PgDn", "scroll"),
            ("Tab", "viewer"),
            ("^C", "quit"),
        ]
    }

    pub fn zview() -> Vec<(&'static str, &'static str)> {
        vec![
            ("←↓↑→/hjkl", "cursor"),
            ("+/-", "zoom"),
            ("0", "fit"),
            ("c", "center"),
            ("i", "invert"),
            ("p/e/g", "radial/contour/gauss"),
            ("T", "theme"),
            ("Tab", "command"),
        ]
    }

    pub fn plot() -> Vec<(&'static str, &'static str)> {
        vec![("Esc", "close"), ("p/e/g", "replot"), ("Tab", "command")]
    }
}

pub fn render_footer_hints(hints: &[(&str, &str)]) -> Vec<Span<'static>> {
    hints
        .iter()
        .enumerate()
        .flat_map(|(i, (key, action))| {
            let sep = (i > 0).then(|| Span::raw("  "));
            sep.into_iter().chain([
                Span::styled((*key).to_string(), Styles::highlight().bold()),
                Span::styled(format!(" {action}"), Styles::text_dim()),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_cycle() {
        let mut theme = Theme::dark();
        let mut seen = Vec::new();
        for _ in 0..THEME_NAMES.len() {
            seen.push(theme.name);
            theme = theme.next();
        }
        assert_eq!(seen, THEME_NAMES);
        assert_eq!(theme.name, "dark");
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(Theme::from_name("HC").name, "high-contrast");
        assert_eq!(Theme::from_name("red").name, "night");
        assert_eq!(Theme::from_name("Light").colors, ColorScheme::light());
        assert_eq!(Theme::from_name("bogus").name, "dark");
    }

    #[test]
    fn test_history_line_style() {
        assert_eq!(history_line_style("ZVIEW> lsv"), Styles::prompt());
        assert_eq!(history_line_style("12:01:02 ZVIEW> (radial plot)"), Styles::prompt());
        assert_eq!(history_line_style("!! No such command: 'x'"), Styles::error());
        assert_eq!(history_line_style("warning: this command will be deprecated--use 'rmb'"), Styles::warning());
        assert_eq!(history_line_style(">gview_0"), Styles::text());
        assert_eq!(strip_time_prefix("1:02:03 x"), "1:02:03 x");
    }

    #[test]
    fn test_footer_hints_spans() {
        let spans = render_footer_hints(&[("a", "one"), ("b", "two")]);
        assert_eq!(spans.len(), 5);
        assert_eq!(spans[0].content, "a");
        assert_eq!(spans[1].content, " one");
        assert_eq!(spans[2].content, "  ");
    }
}
