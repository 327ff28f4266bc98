//! Configuration for berth.
//!
//! ## config.kdl - User preferences
//!
//! Located at `$BERTH_CONFIG_DIR/config.kdl`, falling back to
//! `~/.config/berth/config.kdl`.
//!
//! Contains:
//! - `gh-program` - Provider CLI to run (default `gh`)
//! - `profile-name` - Transport profile name (default `ghcs`)
//! - `mount-root` - Remote directory `connect` opens (default `/workspaces`)
//! - `output-format` - "json" or "human"
//!
//! ## Data directory
//!
//! `$BERTH_DATA_DIR`, falling back to `~/.local/share/berth`. Holds output
//! surfaces and the action log. Nothing about codespaces is persisted there.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

use std::path::{Path, PathBuf};

use kdl::KdlDocument;

use crate::{Error, Result};

pub use resolver::{
    ConfigOverrides, GH_PROGRAM_ENV, Resolved, ResolvedConfig, ValueSource, resolve_config,
};
pub use schema::{BerthConfig, OutputFormat};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "BERTH_CONFIG_DIR";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BERTH_DATA_DIR";

/// Path of the system config.kdl, if a config directory can be determined.
pub fn system_config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir).join("config.kdl"));
        }
    }
    dirs::config_dir().map(|d| d.join("berth").join("config.kdl"))
}

/// Berth's data directory.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::data_dir()
        .map(|d| d.join("berth"))
        .ok_or_else(|| Error::Config("Could not determine a data directory".to_string()))
}

/// Load and validate a config.kdl file.
///
/// Returns an empty config if the file doesn't exist.
pub fn load_config_file(path: &Path) -> Result<BerthConfig> {
    if !path.exists() {
        return Ok(BerthConfig::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;

    let config = BerthConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = load_config_file(&dir.path().join("config.kdl")).unwrap();
        assert_eq!(config, BerthConfig::new());
    }

    #[test]
    fn test_load_invalid_kdl_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        std::fs::write(&path, "gh-program \"unterminated\n").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("config.kdl"));
    }

    #[test]
    fn test_load_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        std::fs::write(&path, "output-format \"human\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Human));
    }
}
