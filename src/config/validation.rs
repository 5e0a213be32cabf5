//! Configuration validation.

use super::types::{AppConfig, HistoryConfig, PickSettings, TuiConfig, ViewerConfig};
use crate::display::{AutoCutMethod, DistKind, get_cmap};
use thiserror::Error;

// ============================================================================
// Configuration Error
// ============================================================================

/// A field that failed validation, e.g. `viewer.color_map`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.viewer.validate());
        errors.extend(self.pick.validate());
        errors.extend(self.history.validate());
        errors.extend(self.tui.validate());
        errors
    }
}

impl Validatable for ViewerConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.width == 0 || self.height == 0 {
            errors.push(ConfigError::new(
                "viewer.width",
                format!("Viewer size must be positive, got {}x{}", self.width, self.height),
            ));
        }
        if self.autocut.parse::<AutoCutMethod>().is_err() {
            errors.push(ConfigError::new(
                "viewer.autocut",
                format!(
                    "Invalid autocut method '{}'. Valid options: {}",
                    self.autocut,
                    AutoCutMethod::names().join(", ")
                ),
            ));
        }
        if let Err(e) = get_cmap(&self.color_map) {
            errors.push(ConfigError::new("viewer.color_map", e.to_string()));
        }
        if DistKind::from_name(&self.color_dist).is_err() {
            errors.push(ConfigError::new(
                "viewer.color_dist",
                format!(
                    "Invalid color distribution '{}'. Valid options: {}",
                    self.color_dist,
                    DistKind::names().join(", ")
                ),
            ));
        }
        if self.zoom_rate.is_nan() || self.zoom_rate <= 1.0 {
            errors.push(ConfigError::new(
                "viewer.zoom_rate",
                format!("Zoom rate must be greater than 1.0, got {}", self.zoom_rate),
            ));
        }
        errors
    }
}

impl Validatable for PickSettings {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.radius == 0 {
            errors.push(ConfigError::new("pick.radius", "Radius must be at least 1"));
        }
        if self.min_fwhm < 0.0 || self.min_fwhm >= self.max_fwhm {
            errors.push(ConfigError::new(
                "pick.min_fwhm",
                format!(
                    "Need 0 <= min_fwhm < max_fwhm, got {} and {}",
                    self.min_fwhm, self.max_fwhm
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_ellipse) {
            errors.push(ConfigError::new(
                "pick.min_ellipse",
                format!("Must be between 0.0 and 1.0, got {}", self.min_ellipse),
            ));
        }
        if !(0.0..0.5).contains(&self.edge_width) {
            errors.push(ConfigError::new(
                "pick.edge_width",
                format!("Must be in [0.0, 0.5), got {}", self.edge_width),
            ));
        }
        if self.contour_radius == 0 {
            errors.push(ConfigError::new("pick.contour_radius", "Radius must be at least 1"));
        }
        if self.num_contours == 0 {
            errors.push(ConfigError::new("pick.num_contours", "Need at least one contour level"));
        }
        errors
    }
}

impl Validatable for HistoryConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if self.max_lines == 0 {
            return vec![ConfigError::new("history.max_lines", "Must keep at least one line")];
        }
        Vec::new()
    }
}

impl Validatable for TuiConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let valid_themes = crate::tui::theme::THEME_NAMES;
        if !valid_themes.contains(&self.theme.as_str()) {
            errors.push(ConfigError::new(
                "tui.theme",
                format!(
                    "Invalid theme '{}'. Valid options: {}",
                    self.theme,
                    valid_themes.join(", ")
                ),
            ));
        }
        if self.tick_rate_ms < 10 {
            errors.push(ConfigError::new(
                "tui.tick_rate_ms",
                format!("Tick rate must be at least 10 ms, got {}", self.tick_rate_ms),
            ));
        }
        errors
    }
}
