//! Quick-look image quality analysis for the pick keys.
//!
//! [`find_objects`] locates stars around a position, [`make_report`] turns
//! a measurement into sky coordinates and seeing, and the [`plots`] types
//! hold the data drawn by the radial, contour and gaussian plots.

pub mod fit;
mod iqcalc;
pub mod plots;

pub use fit::{GaussianFit, fit_gaussian};
pub use iqcalc::{
    Axis, CutFit, ObjectInfo, ObjectReport, cut, evaluate_peaks, find_bright_peaks, find_objects,
    fit_cut, get_threshold, make_report, objlist_select, starsize,
};
pub use plots::{ContourGrid, FwhmCuts, PlotKind, RadialProfile};
