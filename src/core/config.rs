//! Optional `config.toml` with connection and storage overrides.
//!
//! Every key is optional; a missing file is the same as an empty one.
//! Environment variables win over the file (see [`Config::base_url`]).

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::completion::DEFAULT_BASE_URL;
use crate::core::settings::DEFAULT_MODEL;
use crate::core::storage::default_data_dir;

pub const BASE_URL_ENV: &str = "GROQ_BASE_URL";

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path_display(path), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// API root, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: Option<String>,
    /// Model used for title suggestions, independent of the chat model.
    pub title_model: Option<String>,
    /// Where `chats.json`, `settings.json` and the log live.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "genie", "genie").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// `GROQ_BASE_URL`, then the file, then the Groq endpoint.
    pub fn base_url(&self) -> String {
        self.base_url_with_env(std::env::var(BASE_URL_ENV).ok())
    }

    fn base_url_with_env(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn title_model(&self) -> String {
        self.title_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// The command-line override wins over the file.
    pub fn data_dir(&self, cli_override: Option<PathBuf>) -> Option<PathBuf> {
        cli_override
            .or_else(|| self.data_dir.clone())
            .or_else(default_data_dir)
    }

    pub fn print_all(&self) {
        match Self::default_path() {
            Some(path) => println!("Config file: {}", path_display(&path)),
            None => println!("Config file: <unavailable>"),
        }
        println!("  base_url: {}", self.base_url());
        println!("  title_model: {}", self.title_model());
        match self.data_dir(None) {
            Some(dir) => println!("  data_dir: {}", path_display(&dir)),
            None => println!("  data_dir: <unavailable>"),
        }
    }
}

/// Shorten paths under the home directory to `~/...`.
pub fn path_display(path: &Path) -> String {
    if let Some(home) = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().expect("temp dir");
        let config = Config::load_from_path(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.title_model(), DEFAULT_MODEL);
        assert_eq!(config.base_url_with_env(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn reads_all_keys() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "base_url = \"http://localhost:8080/v1\"\ntitle_model = \"llama3-70b-8192\"\ndata_dir = \"/tmp/genie\""
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.base_url_with_env(None), "http://localhost:8080/v1");
        assert_eq!(config.title_model(), "llama3-70b-8192");
        assert_eq!(config.data_dir(None), Some(PathBuf::from("/tmp/genie")));
        assert_eq!(
            config.data_dir(Some(PathBuf::from("/elsewhere"))),
            Some(PathBuf::from("/elsewhere"))
        );
    }

    #[test]
    fn environment_overrides_file_base_url() {
        let config = Config {
            base_url: Some("http://file".into()),
            ..Config::default()
        };
        assert_eq!(config.base_url_with_env(Some("http://env".into())), "http://env");
        assert_eq!(config.base_url_with_env(Some("  ".into())), "http://file");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse config at"));
    }
}
