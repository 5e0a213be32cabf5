//! In-memory astronomical images.

use super::wcs::{CoordSystem, Wcs};
use crate::error::{GviewError, Result};
use crate::fits::{self, Header, HeaderValue};
use std::path::{Path, PathBuf};

/// A dense row-major 2-D array of pixel values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Build a grid, checking that `data` holds exactly `width * height` values.
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(GviewError::invalid_argument(
                "data",
                format!("expected {} values for {width}x{height}, got {}", width * height, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` at every pixel.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Finite values only.
    pub fn finite(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied().filter(|v| v.is_finite())
    }

    /// Copy out the inclusive rectangle `[x1, x2] x [y1, y2]`.
    #[must_use]
    pub fn subgrid(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        let width = x2 + 1 - x1;
        let height = y2 + 1 - y1;
        let mut data = Vec::with_capacity(width * height);
        for y in y1..=y2 {
            let row = y * self.width;
            data.extend_from_slice(&self.data[row + x1..=row + x2]);
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// A cutout of an image with its bounds in the parent's data coordinates.
#[derive(Debug, Clone)]
pub struct Cutout {
    pub grid: Grid,
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

/// Inclusive pixel rectangle in 0-based data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

/// Summary statistics over the finite pixels of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
}

impl ImageStats {
    /// Compute statistics over finite values; `None` if there are none.
    pub fn compute(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let median = median_in_place(&mut values);
        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            stddev: variance.sqrt(),
        })
    }
}

/// Median of a non-empty slice (reorders it).
pub fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    let mid = n / 2;
    let (_, &mut upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    if n % 2 == 1 {
        upper
    } else {
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (lower + upper) / 2.0
    }
}

/// A loaded image: pixel grid, header and where it came from.
#[derive(Debug, Clone)]
pub struct AstroImage {
    grid: Grid,
    header: Header,
    path: Option<PathBuf>,
}

impl AstroImage {
    #[must_use]
    pub const fn new(grid: Grid, header: Header) -> Self {
        Self {
            grid,
            header,
            path: None,
        }
    }

    /// Load the first image HDU of a FITS file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let hdu = fits::read_fits(path)?;
        tracing::info!(
            "Loaded {}x{} image from {}",
            hdu.width,
            hdu.height,
            path.display()
        );
        Ok(Self {
            grid: Grid::new(hdu.width, hdu.height, hdu.data)?,
            header: hdu.header,
            path: Some(path.to_path_buf()),
        })
    }

    /// Save as a FITS file.
    pub fn save_as(&self, path: &Path) -> Result<()> {
        fits::write_fits(path, &self.header, self.width(), self.height(), self.grid.data())
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.grid.width()
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.grid.height()
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Pixel value at 0-based data coordinates.
    #[must_use]
    pub fn get_data(&self, x: i64, y: i64) -> Option<f64> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(x as usize, y as usize)
    }

    #[must_use]
    pub fn get_keyword(&self, keyword: &str) -> Option<&HeaderValue> {
        self.header.get(keyword)
    }

    /// Numeric keyword with a fallback.
    #[must_use]
    pub fn get_keyword_f64(&self, keyword: &str, default: f64) -> f64 {
        self.header.get_f64(keyword).unwrap_or(default)
    }

    /// Square cutout of `radius` pixels around `(x, y)`, clipped to the image.
    pub fn cutout_radius(&self, x: f64, y: f64, radius: usize) -> Result<Cutout> {
        let cx = x.round() as i64;
        let cy = y.round() as i64;
        let r = radius as i64;
        let max_x = self.width() as i64 - 1;
        let max_y = self.height() as i64 - 1;

        let x1 = (cx - r).max(0);
        let y1 = (cy - r).max(0);
        let x2 = (cx + r).min(max_x);
        let y2 = (cy + r).min(max_y);
        if x1 > x2 || y1 > y2 {
            return Err(GviewError::analysis(format!(
                "position ({x:.1}, {y:.1}) is outside the image"
            )));
        }

        let (x1, y1, x2, y2) = (x1 as usize, y1 as usize, x2 as usize, y2 as usize);
        Ok(Cutout {
            grid: self.grid.subgrid(x1, y1, x2, y2),
            x1,
            y1,
            x2,
            y2,
        })
    }

    /// Statistics over the whole image or a clamped region of it.
    pub fn statistics(&self, region: Option<Region>) -> Result<ImageStats> {
        let stats = match region {
            None => ImageStats::compute(self.grid.finite()),
            Some(r) => {
                let x2 = r.x2.min(self.width().saturating_sub(1));
                let y2 = r.y2.min(self.height().saturating_sub(1));
                if r.x1 > x2 || r.y1 > y2 {
                    return Err(GviewError::invalid_argument(
                        "region",
                        format!("({}, {}) - ({}, {}) is empty", r.x1, r.y1, r.x2, r.y2),
                    ));
                }
                let sub = self.grid.subgrid(r.x1, r.y1, x2, y2);
                ImageStats::compute(sub.finite())
            }
        };
        stats.ok_or_else(|| GviewError::analysis("no finite pixels in region"))
    }

    /// World coordinates of a pixel position.
    pub fn pixtoradec(&self, x: f64, y: f64, coords: CoordSystem) -> Result<(f64, f64)> {
        let wcs = Wcs::from_header(&self.header)?;
        Ok(wcs.pixtoradec(x, y, coords))
    }
}
