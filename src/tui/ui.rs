//! Terminal setup, main loop and layout.

use super::app::{App, Focus};
use super::events::{Event, EventHandler, handle_key_event, handle_mouse_event};
use super::theme::{
    FooterHints, Styles, Theme, history_line_style, mode_badge, render_footer_hints,
    set_theme,
};
use super::widgets::{self, ColorBar, ImageView, fits_terminal, render_size_warning};
use crate::config::{TuiConfig, TuiPreferences};
use crate::session::PlotData;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::io::{self, stdout};

/// Run the TUI until the user quits.
pub fn run_tui(app: &mut App, config: &TuiConfig) -> io::Result<()> {
    let theme = TuiPreferences::load().theme.unwrap_or_else(|| config.theme.clone());
    set_theme(Theme::from_name(&theme));

    enable_raw_mode()?;
    let mut stdout = stdout();
    if config.mouse_enabled {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(config.tick_rate_ms);
    let result = main_loop(&mut terminal, app, &events);

    disable_raw_mode()?;
    if config.mouse_enabled {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

fn main_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, events: &EventHandler) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            Event::Key(key) => handle_key_event(app, key),
            Event::Mouse(mouse) => handle_mouse_event(app, mouse),
            Event::Resize(_, _) => {}
            Event::Tick => app.tick += 1,
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Draw one frame.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    if !fits_terminal(area.width, area.height) {
        render_size_warning(frame, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(panes[0]);

    render_history(frame, left[0], app);
    render_command_box(frame, left[1], app);
    render_viewer(frame, panes[1], app);
    render_footer(frame, rows[1], app);

    if app.show_plot {
        render_plot_overlay(frame, area, app);
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::frame(focused))
        .title(title)
        .title_style(Styles::title())
}

fn render_history(frame: &mut Frame, area: Rect, app: &App) {
    let block = pane_block(" History ".to_string(), false);
    let inner = block.inner(area);
    let history = app.session.history();
    let visible = inner.height as usize;
    let end = history.len().saturating_sub(app.history_scroll);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = history
        .lines()
        .skip(start)
        .take(end - start)
        .map(|line| Line::styled(line.to_string(), history_line_style(line)))
        .collect();

    let block = if app.history_scroll > 0 {
        block.title_bottom(Line::styled(
            format!(" ↑ {} more ", app.history_scroll),
            Styles::text_dim(),
        ))
    } else {
        block
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_command_box(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Command;
    let block = pane_block(" Command ".to_string(), focused);
    let inner = block.inner(area);
    let line = Line::from(vec![
        Span::styled("ZVIEW> ", Styles::prompt()),
        Span::styled(app.input.text().to_string(), Styles::text()),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);

    if focused && !app.show_plot {
        let col = inner.x + 7 + app.input.cursor_column() as u16;
        frame.set_cursor_position(Position::new(col.min(inner.right().saturating_sub(1)), inner.y));
    }
}

fn render_viewer(frame: &mut Frame, area: Rect, app: &mut App) {
    let focused = app.focus == Focus::Viewer;
    let mode = app.mode_label();
    let Some(viewer) = app.session.current_viewer() else {
        let block = pane_block(" Viewer ".to_string(), focused);
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::styled("No viewers", Styles::text_dim()),
            Line::styled("rd <buf> <file>  then  v <buf>", Styles::label()),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let title = format!(
        " {}  [{}{} / {}]  zoom {:.1} ",
        viewer.name(),
        viewer.color_map_name(),
        if viewer.is_inverted() { " inv" } else { "" },
        viewer.color_algorithm().as_str(),
        viewer.zoom_level(),
    );
    let block = pane_block(title, focused).title_top(Line::from(mode_badge(mode)).right_aligned());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);
    let image_area = parts[0];

    let (w, h) = (u32::from(image_area.width), u32::from(image_area.height) * 2);
    if let Some(viewer) = app.session.current_viewer_mut() {
        viewer.set_window_size(w, h);
    }
    app.image_area = image_area;

    let Some(viewer) = app.session.current_viewer() else {
        return;
    };
    frame.render_widget(ImageView::new(viewer).show_cursor(focused || app.show_plot), image_area);

    let readout = viewer.readout().unwrap_or_else(|| "No image".to_string());
    frame.render_widget(
        Paragraph::new(readout).style(Styles::value()),
        parts[1],
    );
    frame.render_widget(ColorBar::new(viewer), parts[2]);
}

/// Key hints for the current mode, replaced by a status message when one is set.
fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(msg) = &app.status_message {
        Line::styled(msg.clone(), Styles::highlight().bold())
    } else {
        let hints = match (app.show_plot, app.focus) {
            (true, _) => FooterHints::plot(),
            (false, Focus::Command) => FooterHints::command(),
            (false, Focus::Viewer) => FooterHints::zview(),
        };
        Line::from(render_footer_hints(&hints))
    };
    frame.render_widget(
        Paragraph::new(line)
            .alignment(Alignment::Center)
            .style(Styles::status_bar()),
        area,
    );
}

fn render_plot_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let Some(plot) = app.session.plot() else {
        return;
    };
    let popup = widgets::centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let title = plot.kind().title();
    match plot {
        PlotData::Radial { profile, report } => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(2)])
                .split(popup);
            widgets::render_radial(frame, parts[0], profile, title);
            let summary = vec![
                Line::styled(
                    format!(
                        "X: {:.2}  Y: {:.2}  FWHM: {:.2}  seeing size {:5.2}",
                        report.x, report.y, report.fwhm, report.starsize
                    ),
                    Styles::value(),
                ),
                Line::styled(
                    format!("RA: {}  DEC: {}", report.ra_txt, report.dec_txt),
                    Styles::text_dim(),
                ),
            ];
            frame.render_widget(Paragraph::new(summary).style(Styles::status_bar()), parts[1]);
        }
        PlotData::Gaussians { cuts, .. } => widgets::render_gaussians(frame, popup, cuts, title),
        PlotData::Contour(contours) => {
            if let Some(viewer) = app.session.current_viewer() {
                widgets::render_contours(frame, popup, contours, viewer, title);
            }
        }
    }
}
