//! Named color maps.
//!
//! Each map is a 256-entry RGB table built by linear interpolation between
//! control points.

use crate::error::{GviewError, Result};

/// Number of entries in every color map.
pub const CMAP_SIZE: usize = 256;

type ControlPoint = (f64, [f64; 3]);

const GRAY: &[ControlPoint] = &[(0.0, [0.0, 0.0, 0.0]), (1.0, [1.0, 1.0, 1.0])];

const HEAT: &[ControlPoint] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.34, [1.0, 0.0, 0.0]),
    (0.65, [1.0, 0.55, 0.0]),
    (0.85, [1.0, 1.0, 0.3]),
    (1.0, [1.0, 1.0, 1.0]),
];

const COOL: &[ControlPoint] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.3, [0.0, 0.0, 0.6]),
    (0.6, [0.0, 0.6, 1.0]),
    (0.85, [0.5, 1.0, 1.0]),
    (1.0, [1.0, 1.0, 1.0]),
];

const RAINBOW3: &[ControlPoint] = &[
    (0.0, [0.0, 0.0, 0.0]),
    (0.1, [0.45, 0.0, 0.75]),
    (0.25, [0.0, 0.0, 1.0]),
    (0.4, [0.0, 1.0, 1.0]),
    (0.55, [0.0, 1.0, 0.0]),
    (0.7, [1.0, 1.0, 0.0]),
    (0.85, [1.0, 0.0, 0.0]),
    (1.0, [1.0, 1.0, 1.0]),
];

const JET: &[ControlPoint] = &[
    (0.0, [0.0, 0.0, 0.5]),
    (0.11, [0.0, 0.0, 1.0]),
    (0.34, [0.0, 1.0, 1.0]),
    (0.65, [1.0, 1.0, 0.0]),
    (0.89, [1.0, 0.0, 0.0]),
    (1.0, [0.5, 0.0, 0.0]),
];

const VIRIDIS: &[ControlPoint] = &[
    (0.0, [0.267, 0.005, 0.329]),
    (0.25, [0.229, 0.322, 0.546]),
    (0.5, [0.128, 0.567, 0.551]),
    (0.75, [0.369, 0.789, 0.383]),
    (1.0, [0.993, 0.906, 0.144]),
];

const HSV: &[ControlPoint] = &[
    (0.0, [1.0, 0.0, 0.0]),
    (1.0 / 6.0, [1.0, 1.0, 0.0]),
    (2.0 / 6.0, [0.0, 1.0, 0.0]),
    (3.0 / 6.0, [0.0, 1.0, 1.0]),
    (4.0 / 6.0, [0.0, 0.0, 1.0]),
    (5.0 / 6.0, [1.0, 0.0, 1.0]),
    (1.0, [1.0, 0.0, 0.0]),
];

const RED: &[ControlPoint] = &[(0.0, [0.0, 0.0, 0.0]), (1.0, [1.0, 0.0, 0.0])];
const GREEN: &[ControlPoint] = &[(0.0, [0.0, 0.0, 0.0]), (1.0, [0.0, 1.0, 0.0])];
const BLUE: &[ControlPoint] = &[(0.0, [0.0, 0.0, 0.0]), (1.0, [0.0, 0.0, 1.0])];

/// Colors of the eight steps of `stairs8`.
const STAIRS8: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [0.5, 0.0, 0.5],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [0.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 1.0],
];

enum Shape {
    Ramp(&'static [ControlPoint]),
    Steps(&'static [[f64; 3]]),
}

/// Registered color maps, sorted by name.
const REGISTRY: &[(&str, Shape)] = &[
    ("blue", Shape::Ramp(BLUE)),
    ("cool", Shape::Ramp(COOL)),
    ("gray", Shape::Ramp(GRAY)),
    ("green", Shape::Ramp(GREEN)),
    ("heat", Shape::Ramp(HEAT)),
    ("hsv", Shape::Ramp(HSV)),
    ("jet", Shape::Ramp(JET)),
    ("rainbow3", Shape::Ramp(RAINBOW3)),
    ("ramp", Shape::Ramp(GRAY)),
    ("red", Shape::Ramp(RED)),
    ("stairs8", Shape::Steps(&STAIRS8)),
    ("viridis", Shape::Ramp(VIRIDIS)),
];

/// A named 256-entry RGB lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    name: String,
    table: Vec<[u8; 3]>,
}

impl ColorMap {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color for table index `idx` (clamped).
    #[must_use]
    pub fn color(&self, idx: usize) -> [u8; 3] {
        self.table[idx.min(CMAP_SIZE - 1)]
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            name: "gray".to_string(),
            table: build_ramp(GRAY),
        }
    }
}

/// Names of all known color maps, sorted.
#[must_use]
pub fn get_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Look up a color map by name (case-insensitive).
pub fn get_cmap(name: &str) -> Result<ColorMap> {
    let (name, shape) = REGISTRY
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .ok_or_else(|| GviewError::unknown_name("color map", name))?;
    let table = match shape {
        Shape::Ramp(points) => build_ramp(points),
        Shape::Steps(steps) => build_steps(steps),
    };
    Ok(ColorMap {
        name: (*name).to_string(),
        table,
    })
}

fn to_rgb(c: [f64; 3]) -> [u8; 3] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn build_ramp(points: &[ControlPoint]) -> Vec<[u8; 3]> {
    (0..CMAP_SIZE)
        .map(|i| {
            let t = i as f64 / (CMAP_SIZE - 1) as f64;
            let seg = points
                .windows(2)
                .find(|w| t <= w[1].0)
                .unwrap_or(&points[points.len() - 2..]);
            let (t0, c0) = seg[0];
            let (t1, c1) = seg[1];
            let f = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 1.0 };
            to_rgb([0usize, 1, 2].map(|k| c0[k] + (c1[k] - c0[k]) * f))
        })
        .collect()
}

fn build_steps(steps: &[[f64; 3]]) -> Vec<[u8; 3]> {
    (0..CMAP_SIZE)
        .map(|i| to_rgb(steps[i * steps.len() / CMAP_SIZE]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_sorted_and_loadable() {
        let names = get_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        for name in names {
            let cmap = get_cmap(name).unwrap();
            assert_eq!(cmap.table.len(), CMAP_SIZE);
        }
    }

    #[test]
    fn test_gray_endpoints() {
        let gray = get_cmap("GRAY").unwrap();
        assert_eq!(gray.name(), "gray");
        assert_eq!(gray.color(0), [0, 0, 0]);
        assert_eq!(gray.color(255), [255, 255, 255]);
        assert_eq!(gray.color(128), [128, 128, 128]);
        assert_eq!(gray.color(999), [255, 255, 255]);
    }

    #[test]
    fn test_stairs_are_flat() {
        let stairs = get_cmap("stairs8").unwrap();
        assert_eq!(stairs.color(0), stairs.color(31));
        assert_ne!(stairs.color(31), stairs.color(32));
    }

    #[test]
    fn test_unknown_cmap() {
        assert!(get_cmap("plasma9").is_err());
    }
}
