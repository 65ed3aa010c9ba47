use std::{fs, io, path::PathBuf, sync::Arc};

use creatorverse_lib::fs::config_dir;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::theme::Theme;

pub mod theme;

const FILE_NAME: &str = "gui.toml";

/// Handle to the frontend's configuration
pub type Cfg = Arc<RwLock<GuiConfig>>;

/// The frontend's configuration, serialized to TOML.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    pub theme: Theme,
}

impl GuiConfig {
    /// Read `gui.toml`, falling back to the defaults if it is missing or unreadable.
    pub fn load() -> Self {
        match Self::path().and_then(fs::read_to_string) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring invalid {FILE_NAME}: {e}");
                Self::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!("Unable to read {FILE_NAME}: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let contents = toml::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(Self::path()?, contents)
    }

    pub fn theme(&self) -> iced::Theme {
        (&self.theme).into()
    }

    fn path() -> io::Result<PathBuf> {
        Ok(config_dir()?.join(FILE_NAME))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        let cfg: GuiConfig = toml::from_str(r#"theme = "Light""#).unwrap();
        assert_eq!(cfg.theme, Theme::Light);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let cfg: GuiConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, GuiConfig::default());
    }
}
