//! Settings file loader and serialization.

use crate::error::ConfigError;
use crate::models::UpdaterConfig;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_DIR: &str = ".config/c6-updater";
const SETTINGS_FILE: &str = "settings.json";

/// Get the global settings path: ~/.config/c6-updater/settings.json
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    Ok(home.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

/// Ensure the global settings directory exists
pub fn ensure_settings_dir_exists() -> Result<(), ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    fs::create_dir_all(home.join(SETTINGS_DIR)).map_err(ConfigError::Io)?;
    Ok(())
}

/// Load settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<UpdaterConfig, ConfigError> {
    validate_settings_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!("Settings file not found at: {}", path.display()))
        } else {
            ConfigError::Io(e)
        }
    })?;

    let config: UpdaterConfig = serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;

    Ok(config)
}

/// Save settings to a JSON file, pretty-printed.
pub fn save_settings(config: &UpdaterConfig, path: &Path) -> Result<(), ConfigError> {
    validate_settings_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
    }

    let json_content = serde_json::to_string_pretty(config).map_err(ConfigError::InvalidJson)?;
    fs::write(path, json_content).map_err(ConfigError::Io)?;

    Ok(())
}

/// Load settings when the file exists, fall back to defaults otherwise.
///
/// A present-but-broken settings file is still an error; silently ignoring
/// it would run the pipeline against paths the user did not configure.
pub fn load_or_default(path: &Path) -> Result<UpdaterConfig, ConfigError> {
    if path.exists() {
        load_settings(path)
    } else {
        Ok(UpdaterConfig::default())
    }
}

/// Validate a settings path (.json extension required).
pub fn validate_settings_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Settings path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "json" => {}
        Some(ext) => {
            return Err(ConfigError::ValidationFailed(format!(
                "Settings file must have .json extension, got .{}",
                ext.to_string_lossy()
            )))
        }
        None => {
            return Err(ConfigError::ValidationFailed(
                "Settings file must have .json extension".to_string(),
            ))
        }
    }

    Ok(())
}
