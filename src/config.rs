use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::layout::{DEFAULT_COLUMN_WIDTH, DEFAULT_VISIBLE_FIELDS};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub columns: ColumnsConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the index (or cluster); `/_search` is appended.
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColumnsConfig {
    #[serde(default = "default_visible")]
    pub default_visible: Vec<String>,
    #[serde(default = "default_width")]
    pub default_width: u32,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            default_visible: default_visible(),
            default_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

fn default_visible() -> Vec<String> {
    DEFAULT_VISIBLE_FIELDS.iter().map(|s| s.to_string()).collect()
}
fn default_width() -> u32 {
    DEFAULT_COLUMN_WIDTH
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("./data/flubber-settings.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            with_target: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// In-memory config pointing at `endpoint`, everything else defaulted.
    pub fn minimal(endpoint: &str) -> Self {
        Self {
            backend: BackendConfig {
                endpoint: endpoint.to_string(),
                timeout_secs: default_timeout_secs(),
            },
            columns: ColumnsConfig::default(),
            settings: SettingsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let endpoint = config.backend.endpoint.trim();
    if endpoint.is_empty() {
        anyhow::bail!("backend.endpoint must not be empty");
    }
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        anyhow::bail!(
            "backend.endpoint must be an http(s) URL, got '{}'",
            config.backend.endpoint
        );
    }
    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be > 0");
    }

    if config.columns.default_width == 0 {
        anyhow::bail!("columns.default_width must be >= 1");
    }

    Ok(())
}
