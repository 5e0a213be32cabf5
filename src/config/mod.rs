//! Configuration for gview.
//!
//! - Typed configuration structures with defaults
//! - Field-level validation
//! - YAML config file loading and discovery
//!
//! # Configuration File
//!
//! Place a `.gview.yaml` file in the working directory or
//! `~/.config/gview/config.yaml`:
//!
//! ```yaml
//! viewer:
//!   autocut: zscale
//!   color_map: heat
//! pick:
//!   radius: 15
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    DEFAULT_BACKGROUND, DEFAULT_HISTORY_LIMIT, DEFAULT_VIEWER_HEIGHT, DEFAULT_VIEWER_PREFIX,
    DEFAULT_VIEWER_WIDTH, DEFAULT_ZOOM_RATE,
};
pub use types::{AppConfig, HistoryConfig, PickSettings, TuiConfig, TuiPreferences, ViewerConfig};
pub use validation::{ConfigError, Validatable};

pub use file::{
    ConfigFileError, discover_config_file, generate_example_config, load_config_file,
    load_or_default,
};

/// JSON Schema for the `AppConfig` configuration format.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
