//! Data value to RGB mapping: cut levels, distribution, color map, inversion.

use super::colormap::{self, CMAP_SIZE, ColorMap};
use super::dist::{ColorDist, DistKind, normalize};
use crate::error::Result;

/// Combines a color distribution with a (possibly inverted) color map.
#[derive(Debug, Clone, Default)]
pub struct RgbMap {
    cmap: ColorMap,
    dist: ColorDist,
    inverted: bool,
}

impl RgbMap {
    /// Build from names, failing on unknown ones.
    pub fn new(cmap_name: &str, dist_name: &str) -> Result<Self> {
        Ok(Self {
            cmap: colormap::get_cmap(cmap_name)?,
            dist: ColorDist::new(DistKind::from_name(dist_name)?),
            inverted: false,
        })
    }

    #[must_use]
    pub const fn cmap(&self) -> &ColorMap {
        &self.cmap
    }

    pub fn set_cmap(&mut self, cmap: ColorMap) {
        self.cmap = cmap;
    }

    #[must_use]
    pub const fn dist(&self) -> &ColorDist {
        &self.dist
    }

    pub const fn dist_mut(&mut self) -> &mut ColorDist {
        &mut self.dist
    }

    pub fn set_dist(&mut self, dist: ColorDist) {
        self.dist = dist;
    }

    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub const fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    /// Color map index for a normalized value in [0, 1].
    #[must_use]
    pub fn index_of(&self, x: f64) -> usize {
        let idx = (self.dist.apply(x) * (CMAP_SIZE - 1) as f64).round() as usize;
        if self.inverted { CMAP_SIZE - 1 - idx } else { idx }
    }

    /// RGB for a data value between cut levels; `None` for non-finite data.
    #[must_use]
    pub fn get_rgb(&self, value: f64, lo: f64, hi: f64) -> Option<[u8; 3]> {
        value
            .is_finite()
            .then(|| self.cmap.color(self.index_of(normalize(value, lo, hi))))
    }
}
