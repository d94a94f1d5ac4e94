//! Runtime settings
//!
//! Read from an optional `receiptvault.toml` in the working directory (or
//! the file given with `--config`), then from `RECEIPTVAULT__*` environment
//! variables. Command-line flags override both.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "receiptvault";
pub const ENV_PREFIX: &str = "RECEIPTVAULT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// `development`, `production` or `test`
    #[serde(default = "default_log_profile")]
    pub log_profile: String,
    /// Recorded on versions and batches when `--actor` is not given
    #[serde(default)]
    pub default_actor: Option<String>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(".receiptvault/receipts.db")
}

fn default_log_profile() -> String {
    "production".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_profile: default_log_profile(),
            default_actor: None,
        }
    }
}

impl Settings {
    /// # Errors
    ///
    /// When an explicit `config_file` is missing, or a source fails to parse.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "database_path = \"/var/lib/receipts.db\"\ndefault_actor = \"office\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.database_path, PathBuf::from("/var/lib/receipts.db"));
        assert_eq!(settings.default_actor.as_deref(), Some("office"));
        assert_eq!(settings.log_profile, "production");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }
}
