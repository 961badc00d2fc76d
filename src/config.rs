//! Configuration — compiler and pad settings loaded from ~/.shunt/config.yaml.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings loaded from YAML. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log every token resolution and reduction.
    #[serde(default)]
    pub verbose: bool,
    /// Variables bound in the outermost evaluation scope.
    #[serde(default = "Config::default_globals")]
    pub globals: BTreeMap<String, i64>,
    /// Lines kept by the pad's log pane.
    #[serde(default = "Config::default_log_capacity")]
    pub log_capacity: usize,
}

impl Config {
    /// Load config from the standard path (~/.shunt/config.yaml).
    /// Returns None if the file is missing or unreadable.
    pub fn load() -> Option<Self> {
        Self::load_from(&default_config_path())
    }

    /// Like [`Config::load`], for an explicit path.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    fn default_globals() -> BTreeMap<String, i64> {
        BTreeMap::from([("magicnumber".to_string(), 56)])
    }

    fn default_log_capacity() -> usize {
        50
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            globals: Self::default_globals(),
            log_capacity: Self::default_log_capacity(),
        }
    }
}

/// Default path for the config file.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".shunt");
    path.push("config.yaml");
    path
}

/// Load a config from a YAML file. Returns the default config if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Config, io::Error> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Save a config to a YAML file, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config).map_err(io::Error::other)?;
    std::fs::write(path, yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.verbose);
        assert_eq!(config.globals.get("magicnumber"), Some(&56));
        assert_eq!(config.log_capacity, 50);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("verbose: true\n").unwrap();
        assert!(config.verbose);
        assert_eq!(config.globals.get("magicnumber"), Some(&56));
        assert_eq!(config.log_capacity, 50);
    }

    #[test]
    fn custom_globals_replace_defaults() {
        let yaml = r#"
globals:
  answer: 42
  zero: 0
log_capacity: 10
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.globals.len(), 2);
        assert_eq!(config.globals.get("answer"), Some(&42));
        assert!(!config.globals.contains_key("magicnumber"));
        assert_eq!(config.log_capacity, 10);
    }

    #[test]
    fn save_and_load_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.verbose = true;
        config.globals.insert("limit".to_string(), -3);

        save_config(file.path(), &config).unwrap();
        assert_eq!(load_config(file.path()).unwrap(), config);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        save_config(&path, &Config::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn invalid_yaml_is_invalid_data() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "globals: [1, 2").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn load_from_reads_saved_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let config = Config {
            verbose: true,
            ..Config::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(Config::load_from(&path), Some(config));
    }

    #[test]
    fn load_from_missing_or_broken_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("absent.yaml")), None);

        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "globals: [1, 2").unwrap();
        assert_eq!(Config::load_from(file.path()), None);
    }

    #[test]
    fn default_path_under_home() {
        assert!(default_config_path().ends_with(".shunt/config.yaml"));
    }
}
