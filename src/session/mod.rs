//! The interactive session: named buffers, named viewers and the command
//! interpreter that drives them.
//!
//! Everything the user sees as text goes through [`Session::log`] into the
//! [`HistoryLog`]; commands never print.

pub mod commands;
mod history;

pub use commands::{Command, commands, lookup, suggest};
pub use history::HistoryLog;

use crate::analysis::{
    ContourGrid, FwhmCuts, ObjectInfo, ObjectReport, PlotKind, RadialProfile, find_objects,
    make_report,
};
use crate::config::{AppConfig, DEFAULT_VIEWER_PREFIX};
use crate::error::{CommandErrorKind, GviewError, Result};
use crate::model::AstroImage;
use crate::viewer::Viewer;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of the last pick-key plot.
#[derive(Debug, Clone)]
pub enum PlotData {
    Radial {
        profile: RadialProfile,
        report: ObjectReport,
    },
    Contour(ContourGrid),
    Gaussians {
        cuts: FwhmCuts,
        object: ObjectInfo,
    },
}

impl PlotData {
    #[must_use]
    pub const fn kind(&self) -> PlotKind {
        match self {
            Self::Radial { .. } => PlotKind::Radial,
            Self::Contour(_) => PlotKind::Contour,
            Self::Gaussians { .. } => PlotKind::Gaussians,
        }
    }
}

/// State shared by every command.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    buffers: BTreeMap<String, Arc<AstroImage>>,
    viewers: BTreeMap<String, Viewer>,
    current: Option<String>,
    cwd: PathBuf,
    history: HistoryLog,
    plot: Option<PlotData>,
    quit: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Session {
    /// Start a session in the process working directory.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let history = HistoryLog::new(config.history.max_lines, config.history.timestamps);
        Self {
            config,
            buffers: BTreeMap::new(),
            viewers: BTreeMap::new(),
            current: None,
            cwd,
            history,
            plot: None,
            quit: false,
        }
    }

    // ------------------------------------------------------------------
    // Command interpreter
    // ------------------------------------------------------------------

    /// Run one line of input. Failures are reported to the history, never
    /// returned.
    pub fn exec_cmd(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.log(&format!("ZVIEW> {text}"));

        let mut words = text.split_whitespace();
        let Some(name) = words.next() else {
            return;
        };
        let args: Vec<&str> = words.collect();

        let Some(cmd) = lookup(name) else {
            let mut msg = format!("!! No such command: '{name}'");
            if let Some(hint) = suggest(name) {
                msg.push_str(&format!(" (did you mean '{hint}'?)"));
            }
            self.log(&msg);
            return;
        };

        debug!(command = cmd.name, ?args, "executing");
        if let Err(e) = cmd.run(self, &args) {
            warn!(command = cmd.name, "command failed: {e}");
            self.log(&format!("!! Error executing '{text}': {e}"));
        }
    }

    pub fn log(&mut self, text: &str) {
        self.history.log(text, false);
    }

    /// Log with a time stamp prefix.
    pub fn log_with_time(&mut self, text: &str) {
        self.history.log(text, true);
    }

    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    pub const fn request_quit(&mut self) {
        self.quit = true;
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        commands::resolve(&self.cwd, path)
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn buffers(&self) -> &BTreeMap<String, Arc<AstroImage>> {
        &self.buffers
    }

    #[must_use]
    pub fn buffer(&self, name: &str) -> Option<&Arc<AstroImage>> {
        self.buffers.get(name)
    }

    fn require_buffer(&self, name: &str) -> Result<Arc<AstroImage>> {
        self.buffers
            .get(name)
            .cloned()
            .ok_or_else(|| GviewError::unknown_name("buffer", name))
    }

    // ------------------------------------------------------------------
    // Viewers
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn viewers(&self) -> &BTreeMap<String, Viewer> {
        &self.viewers
    }

    #[must_use]
    pub fn viewer(&self, name: &str) -> Option<&Viewer> {
        self.viewers.get(name)
    }

    #[must_use]
    pub fn current_viewer_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn current_viewer(&self) -> Option<&Viewer> {
        self.viewers.get(self.current.as_deref()?)
    }

    pub fn current_viewer_mut(&mut self) -> Option<&mut Viewer> {
        self.viewers.get_mut(self.current.as_deref()?)
    }

    /// Create (or replace) viewer `name`. The first viewer becomes current.
    pub fn make_viewer(&mut self, name: &str, width: u32, height: u32) -> Result<&mut Viewer> {
        let viewer = Viewer::from_config(name, width, height, &self.config.viewer)?;
        info!(viewer = name, width, height, "created viewer");
        if self.current.is_none() {
            self.current = Some(name.to_string());
        }
        self.viewers.insert(name.to_string(), viewer);
        self.viewers
            .get_mut(name)
            .ok_or_else(|| GviewError::unknown_name("viewer", name))
    }

    /// Remove viewer `name`; returns `false` when there is no such viewer.
    ///
    /// Deleting the current viewer makes the first remaining one current.
    pub fn delete_viewer(&mut self, name: &str) -> bool {
        if self.viewers.remove(name).is_none() {
            return false;
        }
        info!(viewer = name, "deleted viewer");
        if self.current.as_deref() == Some(name) {
            self.current = self.viewers.keys().next().cloned();
        }
        true
    }

    /// The current viewer, creating a default one if none exists.
    fn current_or_default_viewer(&mut self) -> Result<&mut Viewer> {
        if self.current.is_none() {
            let name = self.next_viewer_name();
            let (w, h) = (self.config.viewer.width, self.config.viewer.height);
            self.make_viewer(&name, w, h)?;
            self.current = Some(name);
        }
        let name = self.current.clone().unwrap_or_default();
        self.viewers
            .get_mut(&name)
            .ok_or_else(|| GviewError::unknown_name("viewer", name))
    }

    fn next_viewer_name(&self) -> String {
        (0..)
            .map(|i| format!("{DEFAULT_VIEWER_PREFIX}{i}"))
            .find(|name| !self.viewers.contains_key(name))
            .unwrap_or_else(|| DEFAULT_VIEWER_PREFIX.to_string())
    }

    /// Open a file given on the command line in its own viewer.
    pub fn open_file(&mut self, path: &Path) -> Result<()> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        let image = Arc::new(AstroImage::load_file(&path)?);
        let name = self.next_viewer_name();
        let (w, h) = (self.config.viewer.width, self.config.viewer.height);
        self.make_viewer(&name, w, h)?.set_image(image);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pick keys
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn plot(&self) -> Option<&PlotData> {
        self.plot.as_ref()
    }

    pub fn clear_plot(&mut self) {
        self.plot = None;
    }

    /// Image of the current viewer and the position to analyse: `position`
    /// or else the cursor, in data coordinates.
    fn pick_target(&self, position: Option<(f64, f64)>) -> Result<(Arc<AstroImage>, f64, f64)> {
        let viewer = self.current_viewer().ok_or_else(|| {
            GviewError::command("No viewers", CommandErrorKind::Failed("no current viewer".into()))
        })?;
        let image = viewer.image().cloned().ok_or_else(|| {
            GviewError::command(
                format!("No image in viewer '{}'", viewer.name()),
                CommandErrorKind::Failed("empty viewer".into()),
            )
        })?;
        let (x, y) = position.unwrap_or_else(|| viewer.cursor());
        Ok((image, x, y))
    }

    fn brightest_object(&self, image: &AstroImage, x: f64, y: f64) -> Result<ObjectInfo> {
        find_objects(image, x, y, &self.config.pick)?
            .into_iter()
            .next()
            .ok_or_else(|| GviewError::analysis("No object matches selection criteria"))
    }

    /// Measure the object nearest `position` (default: the cursor).
    pub fn pick(&mut self, position: Option<(f64, f64)>) -> Result<ObjectReport> {
        let (image, x, y) = self.pick_target(position)?;
        let obj = self.brightest_object(&image, x, y)?;
        Ok(make_report(&image, &obj, self.config.pick.pixel_coords_offset))
    }

    /// Radial profile of the object under the cursor.
    pub fn radial_plot(&mut self) {
        self.log_with_time(&format!("ZVIEW> ({})", PlotKind::Radial.title()));
        self.plot = None;
        let found = self.pick_target(None).and_then(|(image, x, y)| {
            let obj = self.brightest_object(&image, x, y)?;
            let profile = RadialProfile::compute(&image, obj.objx, obj.objy, self.config.pick.radius)?;
            let report = make_report(&image, &obj, self.config.pick.pixel_coords_offset);
            Ok((profile, report))
        });
        match found {
            Ok((profile, report)) => {
                self.log(&format!("seeing size {:5.2}", report.starsize));
                self.plot = Some(PlotData::Radial { profile, report });
            }
            Err(e) => {
                debug!("radial plot failed: {e}");
                self.log("No objects found");
            }
        }
    }

    /// Contours around the object under the cursor, or around the cursor
    /// itself when no object is found.
    pub fn contour_plot(&mut self) {
        self.log_with_time(&format!("ZVIEW> ({})", PlotKind::Contour.title()));
        self.plot = None;
        let settings = &self.config.pick;
        let mut missed = false;
        let found = self.pick_target(None).and_then(|(image, x, y)| {
            let (cx, cy) = match self.brightest_object(&image, x, y) {
                Ok(obj) => (obj.objx, obj.objy),
                Err(e) => {
                    debug!("no object for contours, using cursor: {e}");
                    missed = true;
                    (x, y)
                }
            };
            ContourGrid::compute(&image, cx, cy, settings.contour_radius, settings.num_contours)
        });
        if missed {
            self.log("No objects found");
        }
        match found {
            Ok(contours) => self.plot = Some(PlotData::Contour(contours)),
            Err(e) => self.log(&format!("!! Error making contour plot: {e}")),
        }
    }

    /// Horizontal and vertical gaussian fits through the object under the cursor.
    pub fn gaussians_plot(&mut self) {
        self.log_with_time(&format!("ZVIEW> ({})", PlotKind::Gaussians.title()));
        self.plot = None;
        let found = self.pick_target(None).and_then(|(image, x, y)| {
            let object = self.brightest_object(&image, x, y)?;
            let cuts = FwhmCuts::compute(&image, object.objx, object.objy, self.config.pick.radius)?;
            Ok((cuts, object))
        });
        match found {
            Ok((cuts, object)) => {
                self.log(&format!(
                    "fwhm x {:.2}  fwhm y {:.2}",
                    cuts.x_cut.fwhm(),
                    cuts.y_cut.fwhm()
                ));
                self.plot = Some(PlotData::Gaussians { cuts, object });
            }
            Err(e) => {
                debug!("gaussians plot failed: {e}");
                self.log("No objects found");
            }
        }
    }
}
