use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::keywords::Vocabulary;
use crate::{ParseOptions, DEFAULT_MAX_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON vocabulary table replacing the built-in keywords.
    pub vocabulary: Option<PathBuf>,
    pub max_depth: usize,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vocabulary: None,
            max_depth: DEFAULT_MAX_DEPTH,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Reads the config file (if any), then applies `QVS_*` environment overrides.
    pub fn load() -> Result<Self, CliError> {
        let mut config = Self::load_from(&Self::get_config_path())?;
        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `QVS_VOCABULARY`, `QVS_MAX_DEPTH` and `QVS_FORMAT` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("QVS_VOCABULARY") {
            self.vocabulary = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("QVS_MAX_DEPTH") {
            self.max_depth = value.trim().parse().map_err(|_| CliError::Setting {
                name: "QVS_MAX_DEPTH".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("QVS_FORMAT") {
            self.format = OutputFormat::from_str(value.trim(), true).map_err(|_| {
                CliError::Setting {
                    name: "QVS_FORMAT".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        Ok(())
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::get_config_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    /// `$QVS_CONFIG`, else `~/.qvs/config.json`.
    pub fn get_config_path() -> PathBuf {
        if let Ok(path) = env::var("QVS_CONFIG") {
            return PathBuf::from(path);
        }
        let home = if cfg!(windows) {
            env::var("USERPROFILE")
        } else {
            env::var("HOME")
        };
        PathBuf::from(home.unwrap_or_else(|_| String::from(".")))
            .join(".qvs")
            .join("config.json")
    }

    /// Loads the configured vocabulary file; `None` means the built-in one.
    pub fn load_vocabulary(&self) -> Result<Option<Vocabulary>, CliError> {
        let Some(path) = &self.vocabulary else {
            return Ok(None);
        };
        let json = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        Vocabulary::from_json(&json)
            .map(Some)
            .map_err(|source| CliError::Vocabulary {
                path: path.clone(),
                source,
            })
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::keywords::standard_table;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            vocabulary: Some(PathBuf::from("/etc/qvs/keywords.json")),
            max_depth: 16,
            format: OutputFormat::Json,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "format": "json" }"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "max_depth = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CliError::Config { .. })
        ));
    }

    #[test]
    fn environment_overrides_the_file() {
        let mut config = Config::default();
        config
            .apply_env(env_of(&[
                ("QVS_VOCABULARY", "custom.json"),
                ("QVS_MAX_DEPTH", " 12 "),
                ("QVS_FORMAT", "JSON"),
            ]))
            .unwrap();
        assert_eq!(config.vocabulary, Some(PathBuf::from("custom.json")));
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.parse_options().max_depth, 12);
    }

    #[test]
    fn invalid_environment_values_are_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(env_of(&[("QVS_MAX_DEPTH", "deep")]));
        assert!(matches!(result, Err(CliError::Setting { name, .. }) if name == "QVS_MAX_DEPTH"));
    }

    #[test]
    fn loads_a_vocabulary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        let mut table = standard_table();
        table.version = "site/7".to_string();
        fs::write(&path, serde_json::to_string(&table).unwrap()).unwrap();

        let config = Config {
            vocabulary: Some(path),
            ..Config::default()
        };
        let vocabulary = config.load_vocabulary().unwrap().unwrap();
        assert_eq!(vocabulary.version(), "site/7");
        assert!(Config::default().load_vocabulary().unwrap().is_none());
    }
}
