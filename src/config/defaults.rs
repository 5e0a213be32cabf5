//! Default values shared by the configuration types and the session.

/// Default viewer name prefix; viewers made implicitly are `gview_<n>`.
pub const DEFAULT_VIEWER_PREFIX: &str = "gview_";

/// Default viewer size in pixels (width, height).
pub const DEFAULT_VIEWER_WIDTH: u32 = 900;
pub const DEFAULT_VIEWER_HEIGHT: u32 = 1000;

/// Zoom factor applied per zoom step.
pub const DEFAULT_ZOOM_RATE: f64 = 1.4;

/// Background color for pixels outside the image, as RGB fractions.
pub const DEFAULT_BACKGROUND: [f64; 3] = [0.2, 0.2, 0.2];

/// Cutout radius used when picking objects.
pub const DEFAULT_PICK_RADIUS: usize = 10;
pub const DEFAULT_MIN_FWHM: f64 = 2.0;
pub const DEFAULT_MAX_FWHM: f64 = 50.0;
pub const DEFAULT_MIN_ELLIPSE: f64 = 0.5;
pub const DEFAULT_EDGE_WIDTH: f64 = 0.01;
pub const DEFAULT_CONTOUR_RADIUS: usize = 10;
pub const DEFAULT_NUM_CONTOURS: usize = 12;

/// Lines kept in the history pane.
pub const DEFAULT_HISTORY_LIMIT: usize = 5000;

/// Event loop tick rate in milliseconds.
pub const DEFAULT_TICK_RATE_MS: u64 = 250;
