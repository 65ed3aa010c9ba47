use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fs::config_dir;

const FILE_NAME: &str = "config.toml";

pub const URL_ENV: &str = "CREATORVERSE_SUPABASE_URL";
pub const KEY_ENV: &str = "CREATORVERSE_ANON_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to access configuration file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Unable to write configuration file: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unable to create HTTP client: {0}")]
    Client(String),
    #[error("Missing configuration value `{0}`")]
    Missing(&'static str),
}

/// Connection settings for the hosted backend, serialized to TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Base URL of the project, e.g. `https://abcd.supabase.co`
    pub supabase_url: Option<String>,
    /// Public API key sent with every request
    pub anon_key: Option<String>,
    pub schema: String,
    pub table: String,
    /// Name of the realtime channel used for change notifications
    pub channel: String,
    pub heartbeat_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            anon_key: None,
            schema: "public".into(),
            table: "creators".into(),
            channel: "creators-changes".into(),
            heartbeat_secs: 30,
        }
    }
}

impl CoreConfig {
    /// Load the configuration from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::load_from(&Self::path()?)?;
        cfg.apply_env();

        Ok(cfg)
    }

    /// Load the configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            debug!("No configuration file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;

        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join(FILE_NAME))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var(URL_ENV) {
            self.supabase_url = Some(url);
        }
        if let Ok(key) = env::var(KEY_ENV) {
            self.anon_key = Some(key);
        }
    }

    /// True when enough is set to reach a hosted backend.
    pub fn is_configured(&self) -> bool {
        self.supabase_url.is_some() && self.anon_key.is_some()
    }

    pub fn supabase_url(&self) -> Result<&str, ConfigError> {
        self.supabase_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or(ConfigError::Missing("supabase_url"))
    }

    pub fn anon_key(&self) -> Result<&str, ConfigError> {
        self.anon_key
            .as_deref()
            .ok_or(ConfigError::Missing("anon_key"))
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    /// Return a configuration pointing at a fake backend, for use in tests.
    #[cfg(test)]
    pub(crate) fn mock() -> Self {
        Self {
            supabase_url: Some("https://example.supabase.co/".into()),
            anon_key: Some("anon".into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod test {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();

        let cfg = CoreConfig::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(cfg, CoreConfig::default());
        assert!(!cfg.is_configured());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = CoreConfig::mock();
        cfg.save_to(&path).unwrap();

        assert_eq!(CoreConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "supabase_url = \"https://x.supabase.co\"\n").unwrap();

        let cfg = CoreConfig::load_from(&path).unwrap();

        assert_eq!(cfg.table, "creators");
        assert_eq!(cfg.heartbeat_secs, 30);
        assert_eq!(cfg.supabase_url().unwrap(), "https://x.supabase.co");
        assert!(matches!(cfg.anon_key(), Err(ConfigError::Missing("anon_key"))));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "heartbeat_secs = \"soon\"").unwrap();

        assert!(matches!(
            CoreConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let cfg = CoreConfig::mock();

        assert_eq!(cfg.supabase_url().unwrap(), "https://example.supabase.co");
    }
}
