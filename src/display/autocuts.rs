//! Automatic cut level algorithms.

use crate::error::{GviewError, Result};
use crate::model::{Grid, median_in_place};
use std::fmt;
use std::str::FromStr;

/// Number of samples drawn by zscale.
const ZSCALE_SAMPLES: usize = 1000;
/// Contrast used to scale the zscale slope.
const ZSCALE_CONTRAST: f64 = 0.25;
const ZSCALE_MAX_REJECT: f64 = 0.5;
const ZSCALE_MIN_NPIXELS: usize = 5;
const ZSCALE_KREJ: f64 = 2.5;
const ZSCALE_MAX_ITERATIONS: usize = 5;

/// Fraction of pixels kept by the histogram method.
const HISTOGRAM_PCT: f64 = 0.999;
/// Longest side of the grid sampled by the median method.
const MEDIAN_MAX_SIDE: usize = 256;

/// Automatic cut level method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoCutMethod {
    #[default]
    ZScale,
    MinMax,
    Histogram,
    Median,
}

impl AutoCutMethod {
    pub const ALL: [Self; 4] = [Self::ZScale, Self::MinMax, Self::Histogram, Self::Median];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZScale => "zscale",
            Self::MinMax => "minmax",
            Self::Histogram => "histogram",
            Self::Median => "median",
        }
    }

    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }

    /// Compute (low, high) cut levels for `grid`.
    #[must_use]
    pub fn calc_cut_levels(self, grid: &Grid) -> (f64, f64) {
        let levels = match self {
            Self::ZScale => zscale(grid.finite(), ZSCALE_SAMPLES, ZSCALE_CONTRAST),
            Self::MinMax => minmax(grid.finite()),
            Self::Histogram => histogram_clip(grid.finite(), HISTOGRAM_PCT),
            Self::Median => median_filtered_minmax(grid),
        };
        levels.unwrap_or((0.0, 0.0))
    }
}

impl fmt::Display for AutoCutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoCutMethod {
    type Err = GviewError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GviewError::unknown_name("autocut method", s))
    }
}

fn minmax(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Clip `(1 - pct) / 2` of the pixels off each end of the distribution.
fn histogram_clip(values: impl Iterator<Item = f64>, pct: f64) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable_by(f64::total_cmp);
    let last = sorted.len() - 1;
    let clip = (1.0 - pct) / 2.0;
    let lo_idx = (clip * last as f64).round() as usize;
    let hi_idx = ((1.0 - clip) * last as f64).round() as usize;
    Some((sorted[lo_idx], sorted[hi_idx.min(last)]))
}

/// 3x3 median filter over a subsampled grid, then min/max.
fn median_filtered_minmax(grid: &Grid) -> Option<(f64, f64)> {
    let step = (grid.width().max(grid.height()) / MEDIAN_MAX_SIDE).max(1);
    let sw = grid.width().div_ceil(step);
    let sh = grid.height().div_ceil(step);
    let sample = Grid::from_fn(sw, sh, |x, y| grid.get(x * step, y * step).unwrap_or(f64::NAN));

    let mut filtered = Vec::with_capacity(sw * sh);
    let mut window = Vec::with_capacity(9);
    for y in 0..sh {
        for x in 0..sw {
            window.clear();
            for ny in y.saturating_sub(1)..=(y + 1).min(sh - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(sw - 1) {
                    if let Some(v) = sample.get(nx, ny).filter(|v| v.is_finite()) {
                        window.push(v);
                    }
                }
            }
            if !window.is_empty() {
                filtered.push(median_in_place(&mut window));
            }
        }
    }
    minmax(filtered.into_iter())
}

/// IRAF zscale: fit a line to sorted samples with iterative rejection and
/// scale its slope by `contrast`.
pub fn zscale(values: impl Iterator<Item = f64>, nsamples: usize, contrast: f64) -> Option<(f64, f64)> {
    let all: Vec<f64> = values.collect();
    if all.is_empty() {
        return None;
    }
    let stride = (all.len() / nsamples.max(1)).max(1);
    let mut samples: Vec<f64> = all.iter().step_by(stride).copied().take(nsamples).collect();
    samples.sort_unstable_by(f64::total_cmp);

    let npix = samples.len();
    let zmin = samples[0];
    let zmax = samples[npix - 1];
    let center = (npix - 1) / 2;
    let median = if npix % 2 == 1 {
        samples[center]
    } else {
        (samples[center] + samples[center + 1]) / 2.0
    };

    let minpix = ZSCALE_MIN_NPIXELS.max((npix as f64 * ZSCALE_MAX_REJECT) as usize);
    let ngrow = ((npix as f64 * 0.01) as usize).max(1);
    let (ngoodpix, _zstart, zslope) = fit_line(&samples, ngrow, minpix);

    if ngoodpix < minpix {
        return Some((zmin, zmax));
    }

    let zslope = if contrast > 0.0 { zslope / contrast } else { zslope };
    let z1 = zmin.max(median - (center as f64 - 1.0) * zslope);
    let z2 = zmax.min(median + (npix - center) as f64 * zslope);
    Some((z1, z2))
}

/// Iteratively fit a line to `samples`, rejecting outliers.
///
/// Returns (good pixel count, intercept at index 0, slope per index).
fn fit_line(samples: &[f64], ngrow: usize, minpix: usize) -> (usize, f64, f64) {
    let npix = samples.len();
    if npix < 2 {
        return (npix, samples.first().copied().unwrap_or(0.0), 0.0);
    }
    let xscale = 2.0 / (npix - 1) as f64;
    let xnorm: Vec<f64> = (0..npix).map(|i| i as f64 * xscale - 1.0).collect();

    let mut good = vec![true; npix];
    let mut ngoodpix = npix;
    let mut last_ngoodpix = npix + 1;
    let mut intercept = 0.0;
    let mut slope = 0.0;

    for _ in 0..ZSCALE_MAX_ITERATIONS {
        if ngoodpix >= last_ngoodpix || ngoodpix < minpix {
            break;
        }

        let (mut sum, mut sumx, mut sumy, mut sumxx, mut sumxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for i in (0..npix).filter(|&i| good[i]) {
            let x = xnorm[i];
            let y = samples[i];
            sum += 1.0;
            sumx += x;
            sumy += y;
            sumxx += x * x;
            sumxy += x * y;
        }
        let delta = sum * sumxx - sumx * sumx;
        if delta == 0.0 {
            break;
        }
        intercept = (sumxx * sumy - sumx * sumxy) / delta;
        slope = (sum * sumxy - sumx * sumy) / delta;

        let flat: Vec<f64> = (0..npix)
            .map(|i| samples[i] - (xnorm[i] * slope + intercept))
            .collect();
        let good_flat: Vec<f64> = (0..npix).filter(|&i| good[i]).map(|i| flat[i]).collect();
        let mean = good_flat.iter().sum::<f64>() / good_flat.len() as f64;
        let sigma = (good_flat.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / good_flat.len() as f64)
            .sqrt();
        let threshold = sigma * ZSCALE_KREJ;

        let mut rejected = vec![false; npix];
        for (i, &f) in flat.iter().enumerate() {
            if f.abs() > threshold {
                let lo = i.saturating_sub(ngrow / 2);
                let hi = (i + ngrow / 2).min(npix - 1);
                rejected[lo..=hi].iter_mut().for_each(|r| *r = true);
            }
        }
        for (g, r) in good.iter_mut().zip(&rejected) {
            *g = !r;
        }

        last_ngoodpix = ngoodpix;
        ngoodpix = good.iter().filter(|&&g| g).count();
    }

    (ngoodpix, intercept - slope, slope * xscale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_sky(width: usize, height: usize) -> Grid {
        // Deterministic pseudo-noise around 100 with one bright star.
        Grid::from_fn(width, height, |x, y| {
            let n = ((x * 7919 + y * 104_729) % 97) as f64 / 97.0 - 0.5;
            let r2 = (x as f64 - 20.0).powi(2) + (y as f64 - 20.0).powi(2);
            100.0 + 4.0 * n + 5000.0 * (-r2 / 4.0).exp()
        })
    }

    #[test]
    fn test_method_names_roundtrip() {
        for m in AutoCutMethod::ALL {
            assert_eq!(m.as_str().parse::<AutoCutMethod>().unwrap(), m);
        }
        assert!("bogus".parse::<AutoCutMethod>().is_err());
        assert_eq!("ZSCALE".parse::<AutoCutMethod>().unwrap(), AutoCutMethod::ZScale);
    }

    #[test]
    fn test_minmax() {
        let grid = Grid::new(3, 1, vec![5.0, f64::NAN, -1.0]).unwrap();
        assert_eq!(AutoCutMethod::MinMax.calc_cut_levels(&grid), (-1.0, 5.0));
    }

    #[test]
    fn test_zscale_ignores_star() {
        let grid = noisy_sky(64, 64);
        let (lo, hi) = AutoCutMethod::ZScale.calc_cut_levels(&grid);
        assert!(lo >= 95.0 && lo < 100.0, "lo = {lo}");
        assert!(hi > 100.0 && hi < 200.0, "hi = {hi}");
    }

    #[test]
    fn test_zscale_flat_image() {
        let grid = Grid::from_fn(10, 10, |_, _| 7.0);
        assert_eq!(AutoCutMethod::ZScale.calc_cut_levels(&grid), (7.0, 7.0));
    }

    #[test]
    fn test_histogram_clips_outliers() {
        let mut values: Vec<f64> = (0..10_000).map(f64::from).collect();
        values[0] = -1.0e9;
        values[9999] = 1.0e9;
        let grid = Grid::new(100, 100, values).unwrap();
        let (lo, hi) = AutoCutMethod::Histogram.calc_cut_levels(&grid);
        assert!(lo > -1.0e9 && hi < 1.0e9);
    }

    #[test]
    fn test_median_removes_hot_pixel() {
        let mut grid_values = vec![10.0; 100];
        grid_values[55] = 1.0e6;
        let grid = Grid::new(10, 10, grid_values).unwrap();
        assert_eq!(AutoCutMethod::Median.calc_cut_levels(&grid), (10.0, 10.0));
    }

    #[test]
    fn test_empty_grid() {
        let grid = Grid::new(1, 1, vec![f64::NAN]).unwrap();
        assert_eq!(AutoCutMethod::ZScale.calc_cut_levels(&grid), (0.0, 0.0));
    }
}
