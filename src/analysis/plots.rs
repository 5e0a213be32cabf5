//! Data behind the radial profile, FWHM and contour plots.

use super::fit::{GaussianFit, fit_gaussian};
use super::iqcalc::{Axis, CutFit, fit_cut};
use crate::error::{GviewError, Result};
use crate::model::{AstroImage, Grid};

/// Which plot the pick keys produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Radial,
    Contour,
    Gaussians,
}

impl PlotKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Radial => "radial plot",
            Self::Contour => "contour plot",
            Self::Gaussians => "gaussians plot",
        }
    }
}

/// Pixel values against distance from an object center.
#[derive(Debug, Clone)]
pub struct RadialProfile {
    pub x: f64,
    pub y: f64,
    pub radius: usize,
    /// (distance, value) of every finite pixel in the cutout.
    pub points: Vec<(f64, f64)>,
    /// Gaussian centered on the object, when the fit succeeds.
    pub fit: Option<GaussianFit>,
}

impl RadialProfile {
    pub fn compute(image: &AstroImage, x: f64, y: f64, radius: usize) -> Result<Self> {
        let cutout = image.cutout_radius(x, y, radius)?;
        let grid = &cutout.grid;
        let mut points = Vec::with_capacity(grid.width() * grid.height());
        for cy in 0..grid.height() {
            for cx in 0..grid.width() {
                let Some(v) = grid.get(cx, cy).filter(|v| v.is_finite()) else {
                    continue;
                };
                let dx = (cutout.x1 + cx) as f64 - x;
                let dy = (cutout.y1 + cy) as f64 - y;
                points.push((dx.hypot(dy), v));
            }
        }
        if points.is_empty() {
            return Err(GviewError::analysis("no finite pixels around object"));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Mirror the profile so the fitted center sits at distance 0.
        let (xs, ys): (Vec<f64>, Vec<f64>) = points
            .iter()
            .flat_map(|&(r, v)| [(r, v), (-r, v)])
            .unzip();
        let fit = fit_gaussian(&xs, &ys).ok();

        Ok(Self {
            x,
            y,
            radius,
            points,
            fit,
        })
    }

    /// Largest distance in the profile.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.0)
    }

    /// Value range of the profile points.
    #[must_use]
    pub fn value_range(&self) -> (f64, f64) {
        value_range(self.points.iter().map(|p| p.1))
    }
}

/// Horizontal and vertical cuts through an object, each with a fitted gaussian.
#[derive(Debug, Clone)]
pub struct FwhmCuts {
    pub x: f64,
    pub y: f64,
    pub x_cut: CutFit,
    pub y_cut: CutFit,
}

impl FwhmCuts {
    pub fn compute(image: &AstroImage, x: f64, y: f64, radius: usize) -> Result<Self> {
        let (px, py) = pixel_of(image.grid(), x, y)?;
        Ok(Self {
            x,
            y,
            x_cut: fit_cut(image.grid(), px, py, radius, Axis::X)?,
            y_cut: fit_cut(image.grid(), px, py, radius, Axis::Y)?,
        })
    }

    /// Value range over both cuts.
    #[must_use]
    pub fn value_range(&self) -> (f64, f64) {
        value_range(
            self.x_cut
                .samples
                .iter()
                .chain(&self.y_cut.samples)
                .map(|p| p.1),
        )
    }
}

/// A cutout with evenly spaced contour levels.
#[derive(Debug, Clone)]
pub struct ContourGrid {
    pub x: f64,
    pub y: f64,
    pub grid: Grid,
    /// Data coordinates of the lower left cutout pixel.
    pub x1: usize,
    pub y1: usize,
    /// Ascending, strictly between the cutout minimum and maximum.
    pub levels: Vec<f64>,
}

impl ContourGrid {
    pub fn compute(image: &AstroImage, x: f64, y: f64, radius: usize, num_contours: usize) -> Result<Self> {
        let cutout = image.cutout_radius(x, y, radius)?;
        let (lo, hi) = value_range(cutout.grid.finite());
        if !(lo.is_finite() && hi.is_finite()) {
            return Err(GviewError::analysis("no finite pixels around position"));
        }
        let n = num_contours.max(1);
        let levels = (1..=n)
            .map(|i| lo + (hi - lo) * i as f64 / (n + 1) as f64)
            .collect();
        Ok(Self {
            x,
            y,
            grid: cutout.grid,
            x1: cutout.x1,
            y1: cutout.y1,
            levels,
        })
    }

    /// Number of levels at or below `value`; `None` for non-finite values.
    #[must_use]
    pub fn band(&self, value: f64) -> Option<usize> {
        value
            .is_finite()
            .then(|| self.levels.partition_point(|&level| level <= value))
    }

    /// Whether a contour line passes through cell `(cx, cy)`: a neighbour to
    /// the right or above lies in a different band.
    #[must_use]
    pub fn is_contour(&self, cx: usize, cy: usize) -> bool {
        let Some(here) = self.grid.get(cx, cy).and_then(|v| self.band(v)) else {
            return false;
        };
        [(cx + 1, cy), (cx, cy + 1)].into_iter().any(|(nx, ny)| {
            self.grid
                .get(nx, ny)
                .and_then(|v| self.band(v))
                .is_some_and(|there| there != here)
        })
    }
}

fn pixel_of(grid: &Grid, x: f64, y: f64) -> Result<(usize, usize)> {
    let (px, py) = (x.round(), y.round());
    if px < 0.0 || py < 0.0 || px >= grid.width() as f64 || py >= grid.height() as f64 {
        return Err(GviewError::analysis(format!(
            "position ({x:.1}, {y:.1}) is outside the image"
        )));
    }
    Ok((px as usize, py as usize))
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::Header;

    fn star_image() -> AstroImage {
        let grid = Grid::from_fn(40, 40, |x, y| {
            let r2 = (x as f64 - 20.0).powi(2) + (y as f64 - 18.0).powi(2);
            10.0 + 500.0 * (-r2 / 8.0).exp()
        });
        AstroImage::new(grid, Header::new())
    }

    #[test]
    fn test_radial_profile() {
        let profile = RadialProfile::compute(&star_image(), 20.0, 18.0, 5).unwrap();
        assert_eq!(profile.points.len(), 121);
        assert_eq!(profile.points[0], (0.0, 510.0));
        let fit = profile.fit.unwrap();
        assert!(fit.center.abs() < 1e-6);
        assert!((fit.sigma - 2.0).abs() < 1e-3);
        assert_eq!(profile.value_range().1, 510.0);
    }

    #[test]
    fn test_fwhm_cuts() {
        let cuts = FwhmCuts::compute(&star_image(), 20.0, 18.0, 8).unwrap();
        assert_eq!(cuts.x_cut.samples.len(), 17);
        assert!((cuts.x_cut.fit.center - 20.0).abs() < 1e-4);
        assert!((cuts.y_cut.fit.center - 18.0).abs() < 1e-4);
        assert!(FwhmCuts::compute(&star_image(), -5.0, 18.0, 8).is_err());
    }

    #[test]
    fn test_contour_levels() {
        let contours = ContourGrid::compute(&star_image(), 20.0, 18.0, 10, 12).unwrap();
        assert_eq!(contours.levels.len(), 12);
        assert!(contours.levels.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(contours.band(f64::NAN), None);
        assert_eq!(contours.band(0.0), Some(0));
        assert_eq!(contours.band(1000.0), Some(12));
        assert!(contours.is_contour(10, 7));
        assert!(!contours.is_contour(0, 0));
    }
}
