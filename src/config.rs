//! Application configuration.
//!
//! Loaded from a small YAML document supplied by the host app. Every key is
//! optional:
//!
//! ```yaml
//! api_base_url: https://www.themealdb.com/api/json/v1/1/
//! data_dir: /var/mobile/Containers/Data/Application/XYZ/Documents
//! saved_recipes_file: saved-recipes.data
//! activity_file: activity.json
//! request_timeout_secs: 30
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1/";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the recipe API; sub-paths such as `lookup.php` are joined onto it
    pub api_base_url: Url,
    /// Directory holding the persisted saved-recipes and activity records
    pub data_dir: Utf8PathBuf,
    /// File name of the saved-recipes record inside `data_dir`
    pub saved_recipes_file: String,
    /// File name of the navigation activity record inside `data_dir`
    pub activity_file: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid"),
            data_dir: Utf8PathBuf::from("."),
            saved_recipes_file: "saved-recipes.data".to_string(),
            activity_file: "activity.json".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Parses a YAML config document. Missing keys take their defaults and an
    /// empty document yields [`AppConfig::default`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Default config rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<Utf8PathBuf>) -> Self {
        AppConfig {
            data_dir: data_dir.into(),
            ..AppConfig::default()
        }
    }

    pub fn saved_recipes_path(&self) -> Utf8PathBuf {
        self.data_dir.join(&self.saved_recipes_file)
    }

    pub fn activity_path(&self) -> Utf8PathBuf {
        self.data_dir.join(&self.activity_file)
    }
}
