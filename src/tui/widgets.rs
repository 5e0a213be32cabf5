//! Custom widgets: the image view, color bar and pick-key plots.

use crate::analysis::{ContourGrid, CutFit, FwhmCuts, RadialProfile};
use crate::tui::theme::{Styles, colors};
use crate::viewer::Viewer;
use ratatui::{
    layout::Flex,
    prelude::*,
    symbols::Marker,
    widgets::{Axis as ChartAxis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '▀';

const fn rgb(c: [u8; 3]) -> Color {
    Color::Rgb(c[0], c[1], c[2])
}

/// A viewer drawn with two image rows per terminal cell.
pub struct ImageView<'a> {
    viewer: &'a Viewer,
    show_cursor: bool,
}

impl<'a> ImageView<'a> {
    pub const fn new(viewer: &'a Viewer) -> Self {
        Self {
            viewer,
            show_cursor: true,
        }
    }

    pub const fn show_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }
}

impl Widget for ImageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let (w, h) = (area.width as usize, area.height as usize * 2);
        let pixels = self.viewer.render(w, h);

        for row in 0..area.height {
            for col in 0..area.width {
                let (x, y) = (col as usize, row as usize * 2);
                let top = pixels.get(x, y).unwrap_or([0, 0, 0]);
                let bottom = pixels.get(x, y + 1).unwrap_or(top);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char(HALF_BLOCK)
                        .set_fg(rgb(top))
                        .set_bg(rgb(bottom));
                }
            }
        }

        if self.show_cursor && self.viewer.image().is_some() {
            let (cx, cy) = self.viewer.cursor();
            let (sx, sy) = self.viewer.data_to_screen(cx, cy, w, h);
            if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
                let (col, row) = (sx as u16, (sy / 2.0) as u16);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char('+')
                        .set_fg(colors().cursor)
                        .set_style(Style::default().bold());
                }
            }
        }
    }
}

/// The current color map, low values on the left.
pub struct ColorBar<'a> {
    viewer: &'a Viewer,
}

impl<'a> ColorBar<'a> {
    pub const fn new(viewer: &'a Viewer) -> Self {
        Self { viewer }
    }
}

impl Widget for ColorBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = self.viewer.colorbar(area.width as usize);
        for (i, c) in colors.into_iter().enumerate() {
            for row in 0..area.height {
                if let Some(cell) = buf.cell_mut((area.x + i as u16, area.y + row)) {
                    cell.set_char(' ').set_bg(rgb(c));
                }
            }
        }
    }
}

fn axis_labels(lo: f64, hi: f64) -> Vec<Span<'static>> {
    let mid = (lo + hi) / 2.0;
    [lo, mid, hi]
        .into_iter()
        .map(|v| Span::styled(format!("{v:.1}"), Style::default().fg(colors().text_dim)))
        .collect()
}

/// Pad a value range so flat data still gets a visible axis.
fn padded(lo: f64, hi: f64) -> [f64; 2] {
    if !(lo.is_finite() && hi.is_finite()) {
        return [0.0, 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(1e-6);
    [lo - pad, hi + pad]
}

/// Radial profile with its fitted gaussian.
pub fn render_radial(frame: &mut Frame, area: Rect, profile: &RadialProfile, title: &str) {
    let r_max = profile.max_distance().max(1.0);
    let curve = profile
        .fit
        .as_ref()
        .map(|fit| fit.curve(0.0, r_max, 100))
        .unwrap_or_default();
    let (lo, hi) = profile.value_range();
    let y_bounds = padded(lo, hi);

    let mut datasets = vec![Dataset::default()
        .name("pixels")
        .marker(Marker::Dot)
        .graph_type(GraphType::Scatter)
        .style(Style::default().fg(colors().plot_points))
        .data(&profile.points)];
    if !curve.is_empty() {
        datasets.push(
            Dataset::default()
                .name("fit")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(colors().plot_fit))
                .data(&curve),
        );
    }

    let chart = Chart::new(datasets)
        .block(plot_block(title))
        .x_axis(
            ChartAxis::default()
                .title("radius")
                .bounds([0.0, r_max])
                .labels(axis_labels(0.0, r_max)),
        )
        .y_axis(
            ChartAxis::default()
                .title("value")
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds[0], y_bounds[1])),
        );
    frame.render_widget(chart, area);
}

/// X and Y cuts side by side.
pub fn render_gaussians(frame: &mut Frame, area: Rect, cuts: &FwhmCuts, title: &str) {
    let block = plot_block(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);
    let (lo, hi) = cuts.value_range();
    let y_bounds = padded(lo, hi);
    render_cut(frame, halves[0], &cuts.x_cut, "X", y_bounds);
    render_cut(frame, halves[1], &cuts.y_cut, "Y", y_bounds);
}

fn render_cut(frame: &mut Frame, area: Rect, cut: &CutFit, label: &str, y_bounds: [f64; 2]) {
    let (x0, x1) = match (cut.samples.first(), cut.samples.last()) {
        (Some(a), Some(b)) if b.0 > a.0 => (a.0, b.0),
        _ => return,
    };
    let curve = cut.fit.curve(x0, x1, 100);
    let datasets = vec![
        Dataset::default()
            .name("data")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(colors().plot_points))
            .data(&cut.samples),
        Dataset::default()
            .name("fit")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(colors().plot_fit))
            .data(&curve),
    ];
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {label}  fwhm {:.2} ", cut.fwhm()))
                .title_style(Style::default().fg(colors().text)),
        )
        .x_axis(
            ChartAxis::default()
                .bounds([x0, x1])
                .labels(axis_labels(x0 + 1.0, x1 + 1.0)),
        )
        .y_axis(
            ChartAxis::default()
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds[0], y_bounds[1])),
        );
    frame.render_widget(chart, area);
}

/// Contour lines over the cutout, each band in its own color.
pub struct ContourView<'a> {
    contours: &'a ContourGrid,
    viewer: &'a Viewer,
}

impl<'a> ContourView<'a> {
    pub const fn new(contours: &'a ContourGrid, viewer: &'a Viewer) -> Self {
        Self { contours, viewer }
    }
}

impl Widget for ContourView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let grid = &self.contours.grid;
        if area.is_empty() || grid.width() == 0 || grid.height() == 0 {
            return;
        }
        let levels = self.contours.levels.len().max(1);
        let cmap = self.viewer.colorbar(levels + 1);
        // One cell per cutout pixel where it fits, FITS row 1 at the bottom.
        let cols = (area.width as usize).min(grid.width());
        let rows = (area.height as usize).min(grid.height());
        let sx = grid.width() as f64 / cols as f64;
        let sy = grid.height() as f64 / rows as f64;
        for row in 0..rows {
            for col in 0..cols {
                let cx = (col as f64 * sx) as usize;
                let cy = grid.height() - 1 - ((row as f64 * sy) as usize).min(grid.height() - 1);
                if !self.contours.is_contour(cx, cy) {
                    continue;
                }
                let band = grid
                    .get(cx, cy)
                    .and_then(|v| self.contours.band(v))
                    .unwrap_or(0);
                let color = cmap.get(band).copied().unwrap_or([255, 255, 255]);
                if let Some(cell) = buf.cell_mut((area.x + col as u16, area.y + row as u16)) {
                    cell.set_char('•').set_fg(rgb(color));
                }
            }
        }
    }
}

pub fn render_contours(frame: &mut Frame, area: Rect, contours: &ContourGrid, viewer: &Viewer, title: &str) {
    let block = plot_block(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    frame.render_widget(ContourView::new(contours, viewer), layout[0]);
    let caption = format!(
        "center X: {:.2}  Y: {:.2}  levels {:.1} .. {:.1}",
        contours.x + 1.0,
        contours.y + 1.0,
        contours.levels.first().copied().unwrap_or(f64::NAN),
        contours.levels.last().copied().unwrap_or(f64::NAN),
    );
    frame.render_widget(
        Paragraph::new(caption).style(Style::default().fg(colors().text_dim)),
        layout[1],
    );
}

fn plot_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors().highlight))
        .title(format!(" {title} "))
        .title_style(Style::default().fg(colors().highlight).bold())
}

/// A `percent_x` by `percent_y` rectangle centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

/// Whether the layout fits; the viewer pane needs room for the image.
pub const fn fits_terminal(width: u16, height: u16) -> bool {
    width >= MIN_WIDTH && height >= MIN_HEIGHT
}

pub fn render_size_warning(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::styled("Terminal too small", Styles::warning().bold()),
        Line::styled(
            format!("{}x{}, need {MIN_WIDTH}x{MIN_HEIGHT}", area.width, area.height),
            Styles::text_dim(),
        ),
    ];
    let [middle] = Layout::vertical([Constraint::Length(2)])
        .flex(Flex::Center)
        .areas(area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), middle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::Header;
    use crate::model::{AstroImage, Grid};
    use std::sync::Arc;

    #[test]
    fn test_terminal_size_check() {
        assert!(fits_terminal(80, 24));
        assert!(!fits_terminal(40, 24));
        assert!(!fits_terminal(80, MIN_HEIGHT - 1));
    }

    #[test]
    fn test_centered_rect_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert!(popup.x >= 20 && popup.y >= 15);
    }

    #[test]
    fn test_image_view_draws_half_blocks() {
        let grid = Grid::new(2, 2, vec![0.0, 0.0, 10.0, 10.0]).unwrap();
        let mut viewer = Viewer::new("v", 2, 2);
        viewer.set_image(Arc::new(AstroImage::new(grid, Header::new())));
        viewer.set_window_size(2, 2);
        viewer.cut_levels(0.0, 10.0);

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        ImageView::new(&viewer).show_cursor(false).render(area, &mut buf);
        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 255, 255));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_colorbar_fills_width() {
        let viewer = Viewer::new("v", 10, 10);
        let area = Rect::new(0, 0, 8, 1);
        let mut buf = Buffer::empty(area);
        ColorBar::new(&viewer).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].bg, Color::Rgb(0, 0, 0));
        assert_eq!(buf[(7, 0)].bg, Color::Rgb(255, 255, 255));
    }
}
