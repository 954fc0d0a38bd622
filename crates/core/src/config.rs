//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` in the user's
//! config directory, then `GAME_RENTAL_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "game-rental";
/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG: &str = r#"# Game Rental configuration
base_url = "http://localhost:8080/api"
api_key = ""
storage_prefix = "game-rental"
request_timeout_secs = 15
"#;

/// Runtime settings for the rental client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root URL of the document backend.
    pub base_url: String,
    /// Project key sent with every request.
    pub api_key: String,
    /// Prefix for files written to `data_dir`.
    pub storage_prefix: String,
    /// Where the signed-in session is kept.
    pub data_dir: PathBuf,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_key: String::new(),
            storage_prefix: "game-rental".to_string(),
            data_dir: default_data_dir(),
            request_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from a specific file, still honouring environment
    /// overrides. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("GAME_RENTAL"))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Path of the persisted session file.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}-session.json", self.storage_prefix))
    }
}

/// Default location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write a starter configuration file when none exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn starter_file_loads_with_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.storage_prefix, "game-rental");
        assert_eq!(config.request_timeout_secs, 15);
        assert!(config
            .session_path()
            .ends_with("game-rental-session.json"));
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "base_url = \"https://rental.example.com/api\"\napi_key = \"k-123\"\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.base_url, "https://rental.example.com/api");
        assert_eq!(config.api_key, "k-123");

        fs::write(&path, "base_url = \"changed\"\n")?;
        write_default_config(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.base_url, "changed");
        Ok(())
    }
}
