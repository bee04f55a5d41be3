//! User configuration.
//!
//! Every section and field is optional in the file; anything left out keeps
//! its built-in default.

use crate::storage::project_dirs;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the location of the config file.
pub const CONFIG_PATH_ENV: &str = "TASKTUI_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid key binding {0:?}")]
    InvalidKey(String),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    #[error("could not determine a home directory")]
    NoHome,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub keybinds: KeyBinds,
    pub symbols: Symbols,
    pub colors: Colors,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// File stem of the database inside the data directory.
    pub name: String,
    /// Data directory; the platform data dir when unset.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyBinds {
    pub quit: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub focus: Vec<String>,
    pub toggle: Vec<String>,
    pub add: Vec<String>,
    pub delete: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Symbols {
    pub cursor: String,
    pub checked: String,
    pub in_progress: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Colors {
    pub text: String,
    pub selected: String,
    pub muted: String,
    pub error: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            name: "tasks".into(),
            directory: None,
        }
    }
}

impl Default for KeyBinds {
    fn default() -> Self {
        fn keys(raw: &[&str]) -> Vec<String> {
            raw.iter().map(|k| k.to_string()).collect()
        }
        KeyBinds {
            quit: keys(&["q", "ctrl+c"]),
            up: keys(&["up", "k"]),
            down: keys(&["down", "j"]),
            focus: keys(&["h", "l", "tab"]),
            toggle: keys(&["enter", "space", "x"]),
            add: keys(&["a"]),
            delete: keys(&["d"]),
        }
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Symbols {
            cursor: ">".into(),
            checked: "x".into(),
            in_progress: "~".into(),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Colors {
            text: "#FAFAFA".into(),
            selected: "#FF5FAF".into(),
            muted: "#808080".into(),
            error: "#FF5F5F".into(),
        }
    }
}

impl Config {
    /// Loads the user's config file, falling back to defaults when absent.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.database.directory {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoHome)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LogCapture;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database.name, "tasks");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r##"
[database]
name = "work"

[keybinds]
quit = ["ctrl+q"]

[colors]
selected = "#00FF00"
"##,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database.name, "work");
        assert_eq!(config.keybinds.quit, vec!["ctrl+q"]);
        assert_eq!(config.keybinds.add, KeyBinds::default().add);
        assert_eq!(config.colors.selected, "#00FF00");
        assert_eq!(config.colors.text, Colors::default().text);
        assert_eq!(config.symbols, Symbols::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[database\nname = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn config_discovery_is_logged() {
        let dir = tempdir().unwrap();
        let logs = LogCapture::default();
        let _guard = logs.install();

        Config::load_from(&dir.path().join("config.toml")).unwrap();
        let path = dir.path().join("present.toml");
        fs::write(&path, "[database]\nname = \"work\"\n").unwrap();
        Config::load_from(&path).unwrap();

        let output = logs.output();
        assert!(output.contains("no config file, using defaults"), "{output}");
        assert!(output.contains("loaded config"), "{output}");
    }

    #[test]
    fn log_dir_is_known_without_a_config() {
        let from_logging = crate::logging::default_log_dir();
        let from_config = Config::default().data_dir().ok();
        assert_eq!(from_logging, from_config);
    }

    #[test]
    fn explicit_directory_overrides_data_dir() {
        let mut config = Config::default();
        config.database.directory = Some(PathBuf::from("/tmp/tasktui-data"));
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/tasktui-data"));
    }
}
