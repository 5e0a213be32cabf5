//! Image data model: pixel grids, loaded images and world coordinates.

mod image;
pub mod wcs;

pub use image::{AstroImage, Cutout, Grid, ImageStats, Region, median_in_place};
pub use wcs::{CoordSystem, Wcs, deg2fmt, get_xy_rotation_and_scale};
