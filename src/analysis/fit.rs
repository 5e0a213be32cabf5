//! One-dimensional gaussian fitting (Levenberg-Marquardt).

use crate::error::{GviewError, Result};

/// FWHM of a gaussian in units of sigma: 2 * sqrt(2 ln 2).
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_4;

const MAX_ITERATIONS: usize = 200;
const TOLERANCE: f64 = 1e-10;

/// A fitted `amplitude * exp(-(x - center)^2 / (2 sigma^2)) + background`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFit {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
    pub background: f64,
}

impl GaussianFit {
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let d = (x - self.center) / self.sigma;
        self.amplitude * (-0.5 * d * d).exp() + self.background
    }

    #[must_use]
    pub fn fwhm(&self) -> f64 {
        FWHM_PER_SIGMA * self.sigma.abs()
    }

    /// Sample the fitted curve at `n` evenly spaced points over `[x0, x1]`.
    #[must_use]
    pub fn curve(&self, x0: f64, x1: f64, n: usize) -> Vec<(f64, f64)> {
        let n = n.max(2);
        (0..n)
            .map(|i| {
                let x = x0 + (x1 - x0) * i as f64 / (n - 1) as f64;
                (x, self.eval(x))
            })
            .collect()
    }

    fn from_params(p: [f64; 4]) -> Self {
        Self {
            amplitude: p[0],
            center: p[1],
            sigma: p[2],
            background: p[3],
        }
    }

    const fn params(&self) -> [f64; 4] {
        [self.amplitude, self.center, self.sigma, self.background]
    }

    fn gradient(&self, x: f64) -> [f64; 4] {
        let d = (x - self.center) / self.sigma;
        let e = (-0.5 * d * d).exp();
        [
            e,
            self.amplitude * e * d / self.sigma,
            self.amplitude * e * d * d / self.sigma,
            1.0,
        ]
    }
}

/// Fit a gaussian plus constant background to `(x, y)` samples.
///
/// Non-finite samples are ignored; at least five finite samples are needed.
pub fn fit_gaussian(xs: &[f64], ys: &[f64]) -> Result<GaussianFit> {
    let points: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if points.len() < 5 {
        return Err(GviewError::analysis(format!(
            "too few points for a gaussian fit ({})",
            points.len()
        )));
    }

    let mut fit = initial_guess(&points);
    let mut chi2 = chi_square(&fit, &points);
    let mut lambda = 1e-3;

    for _ in 0..MAX_ITERATIONS {
        let (jtj, jtr) = normal_equations(&fit, &points);
        let mut improved = false;

        while lambda < 1e12 {
            let mut a = jtj;
            for (i, row) in a.iter_mut().enumerate() {
                row[i] += lambda * jtj[i][i].max(1e-12);
            }
            let Some(step) = solve4(a, jtr) else {
                lambda *= 10.0;
                continue;
            };
            let mut p = fit.params();
            for (pi, si) in p.iter_mut().zip(step) {
                *pi += si;
            }
            let candidate = GaussianFit::from_params(p);
            let candidate_chi2 = chi_square(&candidate, &points);
            if candidate_chi2.is_finite() && candidate_chi2 <= chi2 {
                let converged = (chi2 - candidate_chi2) <= TOLERANCE * chi2.max(TOLERANCE);
                fit = candidate;
                chi2 = candidate_chi2;
                lambda = (lambda / 10.0).max(1e-12);
                improved = !converged;
                break;
            }
            lambda *= 10.0;
        }

        if !improved {
            break;
        }
    }

    if !fit.params().iter().all(|v| v.is_finite()) || fit.sigma == 0.0 {
        return Err(GviewError::analysis("gaussian fit did not converge"));
    }
    fit.sigma = fit.sigma.abs();
    Ok(fit)
}

fn initial_guess(points: &[(f64, f64)]) -> GaussianFit {
    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    let (peak_x, _) = points
        .iter()
        .copied()
        .fold((points[0].0, f64::NEG_INFINITY), |best, p| if p.1 > best.1 { p } else { best });

    let half = min_y + (max_y - min_y) / 2.0;
    let above: Vec<f64> = points.iter().filter(|(_, y)| *y >= half).map(|(x, _)| *x).collect();
    let span = above.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - above.iter().copied().fold(f64::INFINITY, f64::min);

    GaussianFit {
        amplitude: max_y - min_y,
        center: peak_x,
        sigma: (span / FWHM_PER_SIGMA).max(0.5),
        background: min_y,
    }
}

fn chi_square(fit: &GaussianFit, points: &[(f64, f64)]) -> f64 {
    points.iter().map(|&(x, y)| (y - fit.eval(x)).powi(2)).sum()
}

fn normal_equations(fit: &GaussianFit, points: &[(f64, f64)]) -> ([[f64; 4]; 4], [f64; 4]) {
    let mut jtj = [[0.0; 4]; 4];
    let mut jtr = [0.0; 4];
    for &(x, y) in points {
        let g = fit.gradient(x);
        let r = y - fit.eval(x);
        for i in 0..4 {
            jtr[i] += g[i] * r;
            for j in 0..4 {
                jtj[i][j] += g[i] * g[j];
            }
        }
    }
    (jtj, jtr)
}

/// Solve a 4x4 linear system by gaussian elimination with partial pivoting.
fn solve4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = [0.0; 4];
    for row in (0..4).rev() {
        let tail: f64 = (row + 1..4).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
