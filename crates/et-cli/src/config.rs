//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Number of records shown in the preview table by default.
pub const DEFAULT_PREVIEW_COUNT: usize = 20;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where artifacts are written. `None` writes next to the input log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// How many records the preview table shows.
    pub preview_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            preview_count: DEFAULT_PREVIEW_COUNT,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ET_*)
        figment = figment.merge(Env::prefixed("ET_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for et.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("et"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output_dir, None);
        assert_eq!(config.preview_count, DEFAULT_PREVIEW_COUNT);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "output_dir = \"/tmp/et-out\"\npreview_count = 5\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/et-out")));
        assert_eq!(config.preview_count, 5);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&temp.path().join("nope.toml"))).unwrap();
        assert_eq!(config.preview_count, DEFAULT_PREVIEW_COUNT);
    }

    #[test]
    fn test_dirs_config_path_ends_with_et() {
        if let Some(path) = dirs_config_path() {
            assert_eq!(path.file_name().unwrap(), "et");
        }
    }
}
