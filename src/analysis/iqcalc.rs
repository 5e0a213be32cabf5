//! Image quality calculations: peak finding, FWHM measurement and
//! object selection around a picked position.

use super::fit::{GaussianFit, fit_gaussian};
use crate::config::PickSettings;
use crate::error::{GviewError, Result};
use crate::model::{AstroImage, CoordSystem, Grid, deg2fmt, get_xy_rotation_and_scale, median_in_place};
use tracing::{debug, error, warn};

/// Default peak threshold in standard deviations above the median.
const THRESHOLD_SIGMA: f64 = 5.0;

/// Direction of a one-dimensional cut through the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// A line of samples through a pixel and the gaussian fitted to it.
#[derive(Debug, Clone)]
pub struct CutFit {
    pub axis: Axis,
    /// (position, value) in the coordinates of the grid that was cut.
    pub samples: Vec<(f64, f64)>,
    pub fit: GaussianFit,
}

impl CutFit {
    #[must_use]
    pub fn fwhm(&self) -> f64 {
        self.fit.fwhm()
    }
}

/// A measured object candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    /// Peak pixel position.
    pub x: f64,
    pub y: f64,
    /// Fitted centroid.
    pub objx: f64,
    pub objy: f64,
    pub fwhm_x: f64,
    pub fwhm_y: f64,
    /// Quadratic mean of `fwhm_x` and `fwhm_y`.
    pub fwhm: f64,
    pub fwhm_radius: usize,
    /// Ratio of the smaller to the larger FWHM.
    pub ellipse: f64,
    /// Mean fitted background of both cuts.
    pub background: f64,
    /// Median of the searched data.
    pub skylevel: f64,
    /// Peak value above the sky level.
    pub brightness: f64,
}

impl ObjectInfo {
    fn shift(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.objx += dx;
        self.objy += dy;
    }
}

/// Default detection threshold: median plus `sigma` times the mean
/// absolute deviation from the median.
#[must_use]
pub fn get_threshold(data: &Grid, sigma: f64) -> Option<f64> {
    let mut values: Vec<f64> = data.finite().collect();
    if values.is_empty() {
        return None;
    }
    let median = median_in_place(&mut values);
    let dist = values.iter().map(|v| (v - median).abs()).sum::<f64>() / values.len() as f64;
    Some(median + sigma * dist)
}

/// Find local maxima brighter than `threshold` (default: median + 5 sigma).
///
/// A pixel is a maximum when it equals the largest value in the `radius`
/// sized window around it. Touching maxima (plateaus) are merged and
/// reported at the center of their bounding box.
#[must_use]
pub fn find_bright_peaks(data: &Grid, threshold: Option<f64>, radius: usize) -> Vec<(f64, f64)> {
    let Some(threshold) = threshold.or_else(|| get_threshold(data, THRESHOLD_SIGMA)) else {
        return Vec::new();
    };
    debug!(threshold, radius, "searching for bright peaks");

    let (width, height) = (data.width(), data.height());
    let half = (radius / 2).max(1);
    let mut maxima = vec![false; width * height];
    for y in 0..height {
        for x in 0..width {
            let Some(v) = data.get(x, y).filter(|v| v.is_finite() && *v > threshold) else {
                continue;
            };
            let window_max = (y.saturating_sub(half)..=(y + half).min(height - 1))
                .flat_map(|ny| (x.saturating_sub(half)..=(x + half).min(width - 1)).map(move |nx| (nx, ny)))
                .filter_map(|(nx, ny)| data.get(nx, ny))
                .filter(|v| v.is_finite())
                .fold(f64::NEG_INFINITY, f64::max);
            maxima[y * width + x] = v >= window_max;
        }
    }

    let mut peaks = Vec::new();
    let mut seen = vec![false; width * height];
    for start in 0..maxima.len() {
        if !maxima[start] || seen[start] {
            continue;
        }
        let (mut x1, mut y1, mut x2, mut y2) = (usize::MAX, usize::MAX, 0, 0);
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % width, idx / width);
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let n = ny * width + nx;
                    if maxima[n] && !seen[n] {
                        seen[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
        peaks.push(((x1 + x2) as f64 / 2.0, (y1 + y2) as f64 / 2.0));
    }
    debug!(count = peaks.len(), "bright peaks found");
    peaks
}

/// Samples along `axis` through `(x, y)`, `radius` pixels to each side.
#[must_use]
pub fn cut(data: &Grid, x: usize, y: usize, radius: usize, axis: Axis) -> Vec<(f64, f64)> {
    match axis {
        Axis::X => {
            let x1 = x.saturating_sub(radius);
            let x2 = (x + radius).min(data.width().saturating_sub(1));
            (x1..=x2)
                .filter_map(|cx| data.get(cx, y).map(|v| (cx as f64, v)))
                .collect()
        }
        Axis::Y => {
            let y1 = y.saturating_sub(radius);
            let y2 = (y + radius).min(data.height().saturating_sub(1));
            (y1..=y2)
                .filter_map(|cy| data.get(x, cy).map(|v| (cy as f64, v)))
                .collect()
        }
    }
}

/// Fit a gaussian to the cut along `axis` through `(x, y)`.
pub fn fit_cut(data: &Grid, x: usize, y: usize, radius: usize, axis: Axis) -> Result<CutFit> {
    let samples = cut(data, x, y, radius, axis);
    let (xs, ys): (Vec<f64>, Vec<f64>) = samples.iter().copied().unzip();
    let fit = fit_gaussian(&xs, &ys)?;
    Ok(CutFit { axis, samples, fit })
}

/// Measure each peak with gaussian fits along X and Y.
///
/// Peaks whose fits fail or whose centroid falls outside the data are dropped.
#[must_use]
pub fn evaluate_peaks(peaks: &[(f64, f64)], data: &Grid, fwhm_radius: usize) -> Vec<ObjectInfo> {
    let mut finite: Vec<f64> = data.finite().collect();
    if finite.is_empty() {
        return Vec::new();
    }
    let skylevel = median_in_place(&mut finite);
    let (width, height) = (data.width() as f64, data.height() as f64);

    let mut objects = Vec::with_capacity(peaks.len());
    for &(px, py) in peaks {
        let (x, y) = (px.round() as usize, py.round() as usize);
        let fits = fit_cut(data, x, y, fwhm_radius, Axis::X)
            .and_then(|fx| Ok((fx, fit_cut(data, x, y, fwhm_radius, Axis::Y)?)));
        let (fx, fy) = match fits {
            Ok(pair) => pair,
            Err(e) => {
                debug!("skipping peak at ({px}, {py}): {e}");
                continue;
            }
        };

        let (objx, objy) = (fx.fit.center, fy.fit.center);
        if !(0.0..width).contains(&objx) || !(0.0..height).contains(&objy) {
            debug!("skipping peak at ({px}, {py}): centroid ({objx:.2}, {objy:.2}) outside data");
            continue;
        }

        let (fwhm_x, fwhm_y) = (fx.fwhm(), fy.fwhm());
        let fwhm = ((fwhm_x * fwhm_x + fwhm_y * fwhm_y) / 2.0).sqrt();
        let ellipse = if fwhm_x.max(fwhm_y) > 0.0 {
            fwhm_x.min(fwhm_y) / fwhm_x.max(fwhm_y)
        } else {
            0.0
        };
        let peak_value = data.get(x, y).unwrap_or(f64::NAN);

        objects.push(ObjectInfo {
            x: px,
            y: py,
            objx,
            objy,
            fwhm_x,
            fwhm_y,
            fwhm,
            fwhm_radius,
            ellipse,
            background: (fx.fit.background + fy.fit.background) / 2.0,
            skylevel,
            brightness: peak_value - skylevel,
        });
    }
    objects
}

/// Keep objects with plausible FWHM and roundness that are away from the
/// edges, brightest first.
#[must_use]
pub fn objlist_select(
    objlist: Vec<ObjectInfo>,
    width: usize,
    height: usize,
    settings: &PickSettings,
) -> Vec<ObjectInfo> {
    let (w, h) = (width as f64, height as f64);
    let edgew = settings.edge_width;
    let mut results: Vec<ObjectInfo> = objlist
        .into_iter()
        .filter(|obj| {
            settings.min_fwhm < obj.fwhm
                && obj.fwhm < settings.max_fwhm
                && (settings.min_ellipse..=1.0).contains(&obj.ellipse)
                && w * edgew < obj.objx
                && obj.objx < w * (1.0 - edgew)
                && h * edgew < obj.objy
                && obj.objy < h * (1.0 - edgew)
        })
        .collect();
    results.sort_by(|a, b| b.brightness.total_cmp(&a.brightness));
    results
}

/// Seeing size in arcseconds from FWHM in pixels and pixel scale in degrees.
#[must_use]
pub fn starsize(fwhm_x: f64, deg_pix_x: f64, fwhm_y: f64, deg_pix_y: f64) -> f64 {
    (fwhm_x * deg_pix_x.abs() + fwhm_y * deg_pix_y.abs()) / 2.0 * 3600.0
}

/// Find objects near `(x, y)` (data coordinates) in `image`.
///
/// Returned positions are in the image's data coordinates, brightest first.
pub fn find_objects(image: &AstroImage, x: f64, y: f64, settings: &PickSettings) -> Result<Vec<ObjectInfo>> {
    search(image, x, y, settings).inspect_err(|e| error!("Error finding object: {e}"))
}

fn search(image: &AstroImage, x: f64, y: f64, settings: &PickSettings) -> Result<Vec<ObjectInfo>> {
    let cutout = image.cutout_radius(x, y, settings.radius)?;

    debug!("Finding bright peaks in cutout");
    let peaks = find_bright_peaks(&cutout.grid, settings.threshold, settings.radius);
    if peaks.is_empty() {
        return Err(GviewError::analysis("Cannot find bright peaks"));
    }

    debug!("Evaluating {} bright peaks...", peaks.len());
    let objlist = evaluate_peaks(&peaks, &cutout.grid, settings.radius);
    if objlist.is_empty() {
        return Err(GviewError::analysis(
            "Error evaluating bright peaks: no candidates found",
        ));
    }

    debug!("Selecting from {} candidates...", objlist.len());
    let mut results = objlist_select(objlist, cutout.grid.width(), cutout.grid.height(), settings);
    if results.is_empty() {
        return Err(GviewError::analysis("No object matches selection criteria"));
    }

    for obj in &mut results {
        obj.shift(cutout.x1 as f64, cutout.y1 as f64);
    }
    Ok(results)
}

/// Everything reported about a picked object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectReport {
    pub x: f64,
    pub y: f64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub ra_txt: String,
    pub dec_txt: String,
    pub equinox: f64,
    pub fwhm: f64,
    pub fwhm_x: f64,
    pub fwhm_y: f64,
    pub ellipse: f64,
    pub background: f64,
    pub skylevel: f64,
    pub brightness: f64,
    /// Seeing in arcseconds; 0 when the pixel scale is unknown.
    pub starsize: f64,
    pub time_local: String,
    pub time_ut: String,
}

impl ObjectReport {
    /// Report lines as logged by the `pick` command.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("X: {:.2}  Y: {:.2}", self.x, self.y),
            format!(
                "RA: {}  DEC: {}  ({:.6}, {:.6}) equinox {:.1}",
                self.ra_txt, self.dec_txt, self.ra_deg, self.dec_deg, self.equinox
            ),
            format!(
                "FWHM: {:.3}  (x {:.3}, y {:.3})  ellipse {:.3}",
                self.fwhm, self.fwhm_x, self.fwhm_y, self.ellipse
            ),
            format!(
                "background {:.3}  sky level {:.3}  brightness {:.3}",
                self.background, self.skylevel, self.brightness
            ),
            format!("seeing size {:5.2}", self.starsize),
            format!("local {}  UT {}", self.time_local, self.time_ut),
        ]
    }
}

/// Build the report for `obj` (data coordinates) found in `image`.
///
/// WCS problems do not fail the report: coordinates read `BAD WCS` and the
/// star size is 0.
#[must_use]
pub fn make_report(image: &AstroImage, obj: &ObjectInfo, pixel_coords_offset: f64) -> ObjectReport {
    let (x, y) = (obj.objx, obj.objy);
    let equinox = image.get_keyword_f64("EQUINOX", 2000.0);

    let (ra_deg, dec_deg, ra_txt, dec_txt) = match image.pixtoradec(x, y, CoordSystem::Data) {
        Ok((ra, dec)) => {
            let (ra_txt, dec_txt) = deg2fmt(ra, dec);
            (ra, dec, ra_txt, dec_txt)
        }
        Err(e) => {
            warn!("Couldn't calculate sky coordinates: {e}");
            (0.0, 0.0, "BAD WCS".to_string(), "BAD WCS".to_string())
        }
    };

    let starsize = match get_xy_rotation_and_scale(image.header()) {
        Ok((_, (cdelt1, cdelt2))) => starsize(obj.fwhm_x, cdelt1, obj.fwhm_y, cdelt2),
        Err(e) => {
            warn!("Couldn't calculate star size: {e}");
            0.0
        }
    };

    ObjectReport {
        x: x + pixel_coords_offset,
        y: y + pixel_coords_offset,
        ra_deg,
        dec_deg,
        ra_txt,
        dec_txt,
        equinox,
        fwhm: obj.fwhm,
        fwhm_x: obj.fwhm_x,
        fwhm_y: obj.fwhm_y,
        ellipse: obj.ellipse,
        background: obj.background,
        skylevel: obj.skylevel,
        brightness: obj.brightness,
        starsize,
        time_local: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        time_ut: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fit::FWHM_PER_SIGMA;
    use crate::fits::{Header, HeaderValue};

    const SIGMA: f64 = 2.0;

    fn star_grid(width: usize, height: usize, stars: &[(f64, f64, f64)]) -> Grid {
        Grid::from_fn(width, height, |x, y| {
            100.0
                + stars
                    .iter()
                    .map(|&(sx, sy, amp)| {
                        let r2 = (x as f64 - sx).powi(2) + (y as f64 - sy).powi(2);
                        amp * (-r2 / (2.0 * SIGMA * SIGMA)).exp()
                    })
                    .sum::<f64>()
        })
    }

    fn wcs_header() -> Header {
        let mut h = Header::new();
        h.set("CTYPE1", HeaderValue::Str("RA---TAN".into()), None);
        h.set("CTYPE2", HeaderValue::Str("DEC--TAN".into()), None);
        h.set("CRPIX1", HeaderValue::Float(1.0), None);
        h.set("CRPIX2", HeaderValue::Float(1.0), None);
        h.set("CRVAL1", HeaderValue::Float(150.0), None);
        h.set("CRVAL2", HeaderValue::Float(2.0), None);
        h.set("CD1_1", HeaderValue::Float(-5.0e-5), None);
        h.set("CD2_2", HeaderValue::Float(5.0e-5), None);
        h
    }

    #[test]
    fn test_find_single_peak() {
        let grid = star_grid(21, 21, &[(10.0, 11.0, 1000.0)]);
        let peaks = find_bright_peaks(&grid, None, 10);
        assert_eq!(peaks, vec![(10.0, 11.0)]);
    }

    #[test]
    fn test_threshold_rejects_faint() {
        let grid = star_grid(31, 31, &[(8.0, 8.0, 1000.0), (22.0, 22.0, 30.0)]);
        let peaks = find_bright_peaks(&grid, Some(500.0), 10);
        assert_eq!(peaks, vec![(8.0, 8.0)]);
    }

    #[test]
    fn test_threshold_mean_absolute_deviation() {
        let grid = Grid::new(5, 1, vec![0.0, 0.0, 0.0, 0.0, 10.0]).unwrap();
        assert_eq!(get_threshold(&grid, 5.0), Some(10.0));
        let empty = Grid::new(1, 1, vec![f64::NAN]).unwrap();
        assert_eq!(get_threshold(&empty, 5.0), None);
    }

    #[test]
    fn test_flat_data_has_no_peaks() {
        let grid = Grid::from_fn(10, 10, |_, _| 5.0);
        assert!(find_bright_peaks(&grid, None, 10).is_empty());
    }

    #[test]
    fn test_evaluate_peak_fwhm() {
        let grid = star_grid(21, 21, &[(10.0, 10.0, 1000.0)]);
        let objects = evaluate_peaks(&[(10.0, 10.0)], &grid, 10);
        assert_eq!(objects.len(), 1);
        let obj = &objects[0];
        let expected = SIGMA * FWHM_PER_SIGMA;
        assert!((obj.fwhm_x - expected).abs() < 1e-3, "{obj:?}");
        assert!((obj.fwhm - expected).abs() < 1e-3);
        assert!((obj.ellipse - 1.0).abs() < 1e-6);
        assert!((obj.background - 100.0).abs() < 1e-3);
        assert!(obj.brightness > 800.0);
    }

    #[test]
    fn test_objlist_select_filters_and_sorts() {
        let base = ObjectInfo {
            x: 10.0,
            y: 10.0,
            objx: 10.0,
            objy: 10.0,
            fwhm_x: 4.0,
            fwhm_y: 4.0,
            fwhm: 4.0,
            fwhm_radius: 10,
            ellipse: 1.0,
            background: 0.0,
            skylevel: 0.0,
            brightness: 10.0,
        };
        let bright = ObjectInfo {
            brightness: 50.0,
            ..base.clone()
        };
        let too_small = ObjectInfo {
            fwhm: 1.0,
            ..base.clone()
        };
        let elongated = ObjectInfo {
            ellipse: 0.2,
            ..base.clone()
        };
        let on_edge = ObjectInfo {
            objx: 0.1,
            ..base.clone()
        };
        let selected = objlist_select(
            vec![base, too_small, bright, elongated, on_edge],
            21,
            21,
            &PickSettings::default(),
        );
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].brightness, 50.0);
    }

    #[test]
    fn test_starsize() {
        let size = starsize(4.0, -5.0e-5, 4.0, 5.0e-5);
        assert!((size - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_find_objects_shifts_to_image_coords() {
        let grid = star_grid(100, 80, &[(60.0, 30.0, 2000.0)]);
        let image = AstroImage::new(grid, wcs_header());
        let found = find_objects(&image, 58.0, 33.0, &PickSettings::default()).unwrap();
        assert!((found[0].objx - 60.0).abs() < 1e-3);
        assert!((found[0].objy - 30.0).abs() < 1e-3);

        let report = make_report(&image, &found[0], 1.0);
        assert!((report.x - 61.0).abs() < 1e-3);
        assert_ne!(report.ra_txt, "BAD WCS");
        assert!((report.starsize - 2.0 * SIGMA * FWHM_PER_SIGMA * 5.0e-5 * 3600.0 / 2.0).abs() < 1e-3);
        assert_eq!(report.equinox, 2000.0);
    }

    #[test]
    fn test_find_objects_errors() {
        let flat = AstroImage::new(Grid::from_fn(50, 50, |_, _| 1.0), Header::new());
        let err = find_objects(&flat, 25.0, 25.0, &PickSettings::default()).unwrap_err();
        assert!(err.to_string().contains("Cannot find bright peaks"));
    }

    #[test]
    fn test_report_without_wcs() {
        let grid = star_grid(40, 40, &[(20.0, 20.0, 1000.0)]);
        let image = AstroImage::new(grid, Header::new());
        let found = find_objects(&image, 20.0, 20.0, &PickSettings::default()).unwrap();
        let report = make_report(&image, &found[0], 0.0);
        assert_eq!(report.ra_txt, "BAD WCS");
        assert_eq!(report.starsize, 0.0);
        assert!(report.lines().iter().any(|l| l.starts_with("seeing size ")));
    }
}
