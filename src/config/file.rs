//! Configuration file loading and discovery.
//!
//! A config file is YAML. Without `--config` the first `.gview.yaml`,
//! `.gview.yml`, `gview.yaml` or `gview.yml` found in the working directory,
//! the user config directory or the home directory is used.

use super::types::AppConfig;
use super::validation::Validatable;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Configuration File Discovery
// ============================================================================

const CONFIG_FILE_NAMES: &[&str] = &[".gview.yaml", ".gview.yml", "gview.yaml", "gview.yml"];

/// File name used inside the user config directory.
const USER_CONFIG_FILE: &str = "config.yaml";

/// `explicit_path` if it exists, else the first config file in the
/// standard locations (`config.yaml` is also accepted under `~/.config/gview/`).
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir()
        && let Some(path) = find_config_in_dir(&cwd)
    {
        return Some(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let gview_dir = config_dir.join("gview");
        let path = gview_dir.join(USER_CONFIG_FILE);
        if path.exists() {
            return Some(path);
        }
        if let Some(path) = find_config_in_dir(&gview_dir) {
            return Some(path);
        }
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<super::ConfigError>),
}

fn join_errors(errors: &[super::ConfigError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Load and validate an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    // An empty file deserializes to unit, not to a mapping.
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_yaml::from_str(&content)?;
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigFileError::Invalid(errors));
    }
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                (config, Some(path))
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# gview configuration
# Place this file at .gview.yaml in the working directory or ~/.config/gview/config.yaml

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "viewer:\n  autocut: minmax\nhistory:\n  max_lines: 100").unwrap();
        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.viewer.autocut, "minmax");
        assert_eq!(config.history.max_lines, 100);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config_file(Path::new("/nonexistent/gview.yaml")).unwrap_err();
        assert!(matches!(err, ConfigFileError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "viewer:\n  color_map: plaid").unwrap();
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigFileError::Invalid(ref e) if e.len() == 1));
        assert!(err.to_string().contains("viewer.color_map"));
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(load_config_file(file.path()).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_find_config_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_in_dir(dir.path()).is_none());
        std::fs::write(dir.path().join("gview.yml"), "tui:\n  theme: light\n").unwrap();
        std::fs::write(dir.path().join(".gview.yaml"), "").unwrap();
        assert_eq!(
            find_config_in_dir(dir.path()).unwrap(),
            dir.path().join(".gview.yaml")
        );
    }

    #[test]
    fn test_example_config_parses() {
        let text = generate_example_config();
        let config: AppConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
