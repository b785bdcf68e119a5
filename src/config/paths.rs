//! Platform-specific configuration paths.

use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the configuration directory for the current platform.
///
/// - Linux: `~/.config/avescan/`
/// - macOS: `~/Library/Application Support/avescan/`
/// - Windows: `%APPDATA%\avescan\`
///
/// # Errors
///
/// Returns [`Error::ConfigDirNotFound`] when no home directory is available.
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the config file.
///
/// # Errors
///
/// Returns [`Error::ConfigDirNotFound`] when no home directory is available.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
