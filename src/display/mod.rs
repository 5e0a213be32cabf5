//! Turning pixel values into colors.
//!
//! Cut levels bound the data range, a [`ColorDist`] shapes the normalized
//! value, and a [`ColorMap`] picks the final RGB through an [`RgbMap`].

pub mod autocuts;
pub mod colormap;
pub mod dist;
mod rgbmap;

pub use autocuts::AutoCutMethod;
pub use colormap::{ColorMap, get_cmap, get_names};
pub use dist::{ColorDist, DistKind};
pub use rgbmap::RgbMap;
