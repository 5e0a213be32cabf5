//! Configuration types for gview.

use super::defaults::{
    DEFAULT_CONTOUR_RADIUS, DEFAULT_EDGE_WIDTH, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_FWHM,
    DEFAULT_MIN_ELLIPSE, DEFAULT_MIN_FWHM, DEFAULT_NUM_CONTOURS, DEFAULT_PICK_RADIUS,
    DEFAULT_TICK_RATE_MS, DEFAULT_VIEWER_HEIGHT, DEFAULT_VIEWER_WIDTH, DEFAULT_ZOOM_RATE,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Application Configuration
// ============================================================================

/// Top-level configuration, usually loaded from `.gview.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for newly created viewers
    pub viewer: ViewerConfig,
    /// Object finding parameters for the pick keys
    pub pick: PickSettings,
    /// History pane settings
    pub history: HistoryConfig,
    /// Terminal UI settings
    pub tui: TuiConfig,
}

impl AppConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Defaults applied to every new viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ViewerConfig {
    /// Viewer width in pixels
    #[schemars(range(min = 1))]
    pub width: u32,
    /// Viewer height in pixels
    #[schemars(range(min = 1))]
    pub height: u32,
    /// Autocut method: zscale, minmax, histogram, median
    pub autocut: String,
    /// Initial color map name
    pub color_map: String,
    /// Initial color distribution: linear, log, power, sqrt, squared, asinh, sinh, histeq
    pub color_dist: String,
    /// Zoom factor per zoom step
    #[schemars(range(min = 1.0))]
    pub zoom_rate: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWER_WIDTH,
            height: DEFAULT_VIEWER_HEIGHT,
            autocut: "zscale".to_string(),
            color_map: "gray".to_string(),
            color_dist: "linear".to_string(),
            zoom_rate: DEFAULT_ZOOM_RATE,
        }
    }
}

/// Object finding and plotting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PickSettings {
    /// Cutout radius around the pick position, in pixels
    #[schemars(range(min = 1))]
    pub radius: usize,
    /// Peak detection threshold (default: median + 5 sigma of the cutout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Smallest accepted FWHM in pixels
    pub min_fwhm: f64,
    /// Largest accepted FWHM in pixels
    pub max_fwhm: f64,
    /// Smallest accepted minor/major FWHM ratio
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_ellipse: f64,
    /// Fraction of the cutout treated as edge on each side
    #[schemars(range(min = 0.0, max = 0.5))]
    pub edge_width: f64,
    /// Offset added to reported pixel positions
    pub pixel_coords_offset: f64,
    /// Cutout radius of the contour plot
    #[schemars(range(min = 1))]
    pub contour_radius: usize,
    /// Number of contour levels
    #[schemars(range(min = 1))]
    pub num_contours: usize,
}

impl Default for PickSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_PICK_RADIUS,
            threshold: None,
            min_fwhm: DEFAULT_MIN_FWHM,
            max_fwhm: DEFAULT_MAX_FWHM,
            min_ellipse: DEFAULT_MIN_ELLIPSE,
            edge_width: DEFAULT_EDGE_WIDTH,
            pixel_coords_offset: 0.0,
            contour_radius: DEFAULT_CONTOUR_RADIUS,
            num_contours: DEFAULT_NUM_CONTOURS,
        }
    }
}

/// History pane configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of lines kept
    #[schemars(range(min = 1))]
    pub max_lines: usize,
    /// Prefix time-stamped entries with `HH:MM:SS`
    pub timestamps: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_HISTORY_LIMIT,
            timestamps: true,
        }
    }
}

// ============================================================================
// TUI Configuration
// ============================================================================

/// TUI-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TuiConfig {
    /// Theme name: "dark", "light", "night" or "high-contrast"
    pub theme: String,
    /// Event loop tick rate in milliseconds
    #[schemars(range(min = 10))]
    pub tick_rate_ms: u64,
    /// Enable mouse support
    pub mouse_enabled: bool,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            mouse_enabled: true,
        }
    }
}

/// Settings changed from inside the TUI and remembered between runs.
///
/// Stored as JSON next to the config file; a saved theme wins over
/// `tui.theme`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl TuiPreferences {
    /// `<config dir>/gview/preferences.json`
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("gview").join("preferences.json"))
    }

    /// Saved preferences; unreadable or missing files give the defaults.
    #[must_use]
    pub fn load() -> Self {
        Self::config_path().map_or_else(Self::default, |path| Self::load_from(&path))
    }

    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> std::io::Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "viewer:\n  color_map: heat\npick:\n  radius: 15\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.viewer.color_map, "heat");
        assert_eq!(config.viewer.width, DEFAULT_VIEWER_WIDTH);
        assert_eq!(config.pick.radius, 15);
        assert_eq!(config.pick.min_fwhm, DEFAULT_MIN_FWHM);
        assert_eq!(config.history, HistoryConfig::default());
    }

    #[test]
    fn test_preferences_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        assert_eq!(TuiPreferences::load_from(&path), TuiPreferences::default());

        let prefs = TuiPreferences {
            theme: Some("night".into()),
        };
        prefs.save_to(&path).unwrap();
        assert_eq!(TuiPreferences::load_from(&path), prefs);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(TuiPreferences::load_from(&path).theme, None);
    }
}
