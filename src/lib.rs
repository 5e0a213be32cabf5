//! **A command-driven FITS image viewer for the terminal.**
//!
//! `gview` keeps named *buffers* of image data and named *viewers* that
//! display them. Everything is driven by short ZVIEW-style commands typed
//! into a command box, with results logged to a history pane.
//!
//! ## Core Concepts & Modules
//!
//! - **[`fits`]**: reads and writes 2-D FITS images and their headers.
//! - **[`model`]**: [`AstroImage`] (pixels + header + source path) and the
//!   TAN world coordinate system used for sky positions.
//! - **[`display`]**: autocut methods, color distributions and color maps,
//!   combined into an [`RgbMap`].
//! - **[`viewer`]**: a [`Viewer`] renders its image at a zoom and pan into
//!   an RGB buffer.
//! - **[`analysis`]**: star finding, FWHM and seeing measurements behind the
//!   ZVIEW pick keys.
//! - **[`session`]**: the command interpreter, [`Session`].
//! - **[`tui`]**: the ratatui front end.
//!
//! ## Driving a session
//!
//! ```no_run
//! use gview::Session;
//!
//! let mut session = Session::default();
//! session.exec_cmd("rd m31 /data/m31.fits");
//! session.exec_cmd("v m31 0 1500 heat");
//! session.exec_cmd("head m31 OBJECT EXPTIME");
//! for line in session.history().lines() {
//!     println!("{line}");
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Pixel coordinates and terminal cells convert between usize/u16/f64 everywhere
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::similar_names
)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod fits;
pub mod model;
pub mod session;
pub mod tui;
pub mod viewer;

// Re-export main types for convenience
pub use config::{AppConfig, ConfigError, PickSettings, Validatable, ViewerConfig};
pub use display::{AutoCutMethod, ColorMap, DistKind, RgbMap};
pub use error::{ErrorContext, GviewError, Result};
pub use model::{AstroImage, CoordSystem, Grid, Wcs};
pub use session::{PlotData, Session};
pub use viewer::{RgbImage, Viewer};
