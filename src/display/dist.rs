//! Color distribution functions mapping normalized data to color map index.

use crate::error::{GviewError, Result};

/// Number of histogram bins used by histogram equalization.
const HISTEQ_BINS: usize = 256;

/// Named color distribution algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistKind {
    #[default]
    Linear,
    Log,
    Power,
    Sqrt,
    Squared,
    Asinh,
    Sinh,
    Histeq,
}

impl DistKind {
    pub const ALL: [Self; 8] = [
        Self::Linear,
        Self::Log,
        Self::Power,
        Self::Sqrt,
        Self::Squared,
        Self::Asinh,
        Self::Sinh,
        Self::Histeq,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
            Self::Power => "power",
            Self::Sqrt => "sqrt",
            Self::Squared => "squared",
            Self::Asinh => "asinh",
            Self::Sinh => "sinh",
            Self::Histeq => "histeq",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| GviewError::unknown_name("color distribution", name))
    }

    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|d| d.as_str()).collect()
    }
}

/// A color distribution, with its lookup table when it depends on the data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorDist {
    kind: DistKind,
    /// Cumulative distribution for histeq, indexed by bin.
    cdf: Option<Vec<f64>>,
}

impl ColorDist {
    #[must_use]
    pub const fn new(kind: DistKind) -> Self {
        Self { kind, cdf: None }
    }

    #[must_use]
    pub const fn kind(&self) -> DistKind {
        self.kind
    }

    /// Rebuild the histeq table from `values` normalized by the cut levels.
    /// Other distributions ignore the data.
    pub fn prepare(&mut self, values: impl Iterator<Item = f64>, lo: f64, hi: f64) {
        if self.kind != DistKind::Histeq {
            self.cdf = None;
            return;
        }
        let mut hist = vec![0usize; HISTEQ_BINS];
        let mut total = 0usize;
        for v in values.filter(|v| v.is_finite()) {
            let x = normalize(v, lo, hi);
            hist[bin_of(x)] += 1;
            total += 1;
        }
        if total == 0 {
            self.cdf = None;
            return;
        }
        let mut running = 0usize;
        let cdf = hist
            .iter()
            .map(|&count| {
                running += count;
                running as f64 / total as f64
            })
            .collect();
        self.cdf = Some(cdf);
    }

    /// Map `x` in [0, 1] to [0, 1].
    #[must_use]
    pub fn apply(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        let y = match self.kind {
            DistKind::Linear => x,
            DistKind::Log => (1000.0 * x + 1.0).ln() / 1000f64.ln(),
            DistKind::Power => (1000f64.powf(x) - 1.0) / 1000.0,
            DistKind::Sqrt => x.sqrt(),
            DistKind::Squared => x * x,
            DistKind::Asinh => (10.0 * x).asinh() / 3.0,
            DistKind::Sinh => (3.0 * x).sinh() / 10.0,
            DistKind::Histeq => self.cdf.as_ref().map_or(x, |cdf| cdf[bin_of(x)]),
        };
        y.clamp(0.0, 1.0)
    }
}

/// Normalize a value into [0, 1] between the cut levels.
#[must_use]
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return if value > hi { 1.0 } else { 0.0 };
    }
    ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
}

fn bin_of(x: f64) -> usize {
    ((x * (HISTEQ_BINS - 1) as f64).round() as usize).min(HISTEQ_BINS - 1)
}
