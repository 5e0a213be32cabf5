//! Named viewers: what image is shown and how.

mod render;

pub use render::RgbImage;

use crate::config::{DEFAULT_BACKGROUND, DEFAULT_ZOOM_RATE, ViewerConfig};
use crate::display::{AutoCutMethod, ColorDist, DistKind, RgbMap, get_cmap};
use crate::error::Result;
use crate::model::{AstroImage, CoordSystem, deg2fmt};
use std::sync::Arc;
use tracing::{debug, info};

/// A display surface showing at most one image.
#[derive(Debug, Clone)]
pub struct Viewer {
    name: String,
    width: u32,
    height: u32,
    image: Option<Arc<AstroImage>>,
    cuts: (f64, f64),
    autocut: AutoCutMethod,
    rgbmap: RgbMap,
    /// Screen pixels per data pixel.
    scale: f64,
    zoom_rate: f64,
    /// Refit the zoom whenever the image or window size changes.
    autozoom: bool,
    /// Data coordinates shown at the window center.
    pan: (f64, f64),
    /// Data coordinates of the cursor.
    cursor: (f64, f64),
    bg: [u8; 3],
}

impl Viewer {
    /// Create a viewer with default display settings.
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width: width.max(1),
            height: height.max(1),
            image: None,
            cuts: (0.0, 0.0),
            autocut: AutoCutMethod::default(),
            rgbmap: RgbMap::default(),
            scale: 1.0,
            zoom_rate: DEFAULT_ZOOM_RATE,
            autozoom: true,
            pan: (0.0, 0.0),
            cursor: (0.0, 0.0),
            bg: DEFAULT_BACKGROUND.map(|c| (c * 255.0).round() as u8),
        }
    }

    /// Create a viewer using the configured defaults.
    pub fn from_config(name: impl Into<String>, width: u32, height: u32, config: &ViewerConfig) -> Result<Self> {
        let mut viewer = Self::new(name, width, height);
        viewer.autocut = config.autocut.parse()?;
        viewer.rgbmap = RgbMap::new(&config.color_map, &config.color_dist)?;
        viewer.zoom_rate = config.zoom_rate;
        Ok(viewer)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn image(&self) -> Option<&Arc<AstroImage>> {
        self.image.as_ref()
    }

    /// Display a new image: autocut, fit the window and center it.
    pub fn set_image(&mut self, image: Arc<AstroImage>) {
        info!(
            viewer = %self.name,
            "showing {}x{} image",
            image.width(),
            image.height()
        );
        let center = (
            (image.width() as f64 - 1.0) / 2.0,
            (image.height() as f64 - 1.0) / 2.0,
        );
        self.cuts = self.autocut.calc_cut_levels(image.grid());
        self.image = Some(image);
        self.pan = center;
        self.cursor = center;
        self.zoom_fit();
        self.prepare_dist();
    }

    // ------------------------------------------------------------------
    // Cut levels
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn cuts(&self) -> (f64, f64) {
        self.cuts
    }

    pub fn cut_levels(&mut self, lo: f64, hi: f64) {
        self.cuts = (lo, hi);
        self.prepare_dist();
    }

    #[must_use]
    pub const fn autocut_method(&self) -> AutoCutMethod {
        self.autocut
    }

    /// Recompute cut levels with the current autocut method.
    pub fn auto_levels(&mut self) {
        if let Some(image) = &self.image {
            self.cuts = self.autocut.calc_cut_levels(image.grid());
            self.prepare_dist();
        }
    }

    pub fn set_autocut_method(&mut self, method: AutoCutMethod) {
        self.autocut = method;
        self.auto_levels();
    }

    // ------------------------------------------------------------------
    // Color
    // ------------------------------------------------------------------

    #[must_use]
    pub fn color_map_name(&self) -> &str {
        self.rgbmap.cmap().name()
    }

    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.rgbmap.is_inverted()
    }

    pub fn set_color_map(&mut self, name: &str) -> Result<()> {
        self.rgbmap.set_cmap(get_cmap(name)?);
        Ok(())
    }

    pub const fn invert_cmap(&mut self) {
        self.rgbmap.invert();
    }

    #[must_use]
    pub const fn color_algorithm(&self) -> DistKind {
        self.rgbmap.dist().kind()
    }

    pub fn set_color_algorithm(&mut self, name: &str) -> Result<()> {
        self.rgbmap.set_dist(ColorDist::new(DistKind::from_name(name)?));
        self.prepare_dist();
        Ok(())
    }

    fn prepare_dist(&mut self) {
        if let Some(image) = &self.image {
            let (lo, hi) = self.cuts;
            self.rgbmap.dist_mut().prepare(image.grid().finite(), lo, hi);
        }
    }

    // ------------------------------------------------------------------
    // Zoom and pan
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Zoom level in steps of the zoom rate (0 is 1:1).
    #[must_use]
    pub fn zoom_level(&self) -> f64 {
        self.scale.ln() / self.zoom_rate.ln()
    }

    #[must_use]
    pub const fn is_autozoom(&self) -> bool {
        self.autozoom
    }

    /// Fit the whole image into the window and keep refitting on resize.
    pub fn zoom_fit(&mut self) {
        self.autozoom = true;
        if let Some(image) = &self.image {
            let sx = f64::from(self.width) / image.width() as f64;
            let sy = f64::from(self.height) / image.height() as f64;
            self.scale = sx.min(sy);
            self.pan = (
                (image.width() as f64 - 1.0) / 2.0,
                (image.height() as f64 - 1.0) / 2.0,
            );
        }
    }

    pub fn zoom_in(&mut self) {
        self.autozoom = false;
        self.scale *= self.zoom_rate;
    }

    pub fn zoom_out(&mut self) {
        self.autozoom = false;
        self.scale /= self.zoom_rate;
    }

    pub fn zoom_to(&mut self, level: i32) {
        self.autozoom = false;
        self.scale = self.zoom_rate.powi(level);
    }

    /// Resize the window (in screen pixels); refits when autozooming.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width.max(1);
        self.height = height.max(1);
        if self.autozoom {
            self.zoom_fit();
        }
    }

    #[must_use]
    pub const fn pan(&self) -> (f64, f64) {
        self.pan
    }

    /// Center the window on data coordinates.
    pub const fn pan_to(&mut self, x: f64, y: f64) {
        self.pan = (x, y);
    }

    pub const fn center_on_cursor(&mut self) {
        self.pan = self.cursor;
    }

    // ------------------------------------------------------------------
    // Cursor and readout
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Place the cursor, clamped to the image.
    pub fn set_cursor(&mut self, x: f64, y: f64) {
        self.cursor = match &self.image {
            Some(image) => (
                x.clamp(0.0, image.width() as f64 - 1.0),
                y.clamp(0.0, image.height() as f64 - 1.0),
            ),
            None => (x, y),
        };
    }

    pub fn move_cursor(&mut self, dx: f64, dy: f64) {
        self.set_cursor(self.cursor.0 + dx, self.cursor.1 + dy);
    }

    /// Pixel readout at the cursor in FITS (1-based) coordinates.
    #[must_use]
    pub fn readout(&self) -> Option<String> {
        let image = self.image.as_ref()?;
        let (x, y) = self.cursor;
        let (ra, dec) = match image.pixtoradec(x, y, CoordSystem::Data) {
            Ok((ra, dec)) => deg2fmt(ra, dec),
            Err(e) => {
                debug!("Bad coordinate conversion: {e}");
                ("BAD WCS".to_string(), "BAD WCS".to_string())
            }
        };
        let value = image
            .get_data((x + 0.5).floor() as i64, (y + 0.5).floor() as i64)
            .map_or_else(|| "N/A".to_string(), |v| v.to_string());
        Some(format!(
            "RA: {ra}  DEC: {dec}  X: {:.2}  Y: {:.2}  Value: {value}",
            x + 1.0,
            y + 1.0
        ))
    }

    // ------------------------------------------------------------------
    // Coordinate transforms
    // ------------------------------------------------------------------

    /// Screen position (pixels from the top left) of data coordinates.
    #[must_use]
    pub fn data_to_screen(&self, x: f64, y: f64, width: usize, height: usize) -> (f64, f64) {
        (
            (x - self.pan.0) * self.scale + width as f64 / 2.0,
            height as f64 / 2.0 - (y - self.pan.1) * self.scale,
        )
    }

    /// Data coordinates under a screen position.
    #[must_use]
    pub fn screen_to_data(&self, sx: f64, sy: f64, width: usize, height: usize) -> (f64, f64) {
        (
            self.pan.0 + (sx - width as f64 / 2.0) / self.scale,
            self.pan.1 + (height as f64 / 2.0 - sy) / self.scale,
        )
    }
}
