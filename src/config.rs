use crate::conversation::DEFAULT_GREETING;
use crate::events::DisplayMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENDPOINT_ENV: &str = "SUPPORT_CHAT_ENDPOINT";
const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat backend that receives the conversation as JSON
    pub endpoint: String,

    /// Whole-request timeout, body included
    pub request_timeout_secs: u64,

    /// First assistant message of a new conversation
    pub greeting: String,

    /// UI preferences
    pub ui: UiConfig,

    /// Application home directory, not persisted
    #[serde(skip)]
    pub home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: DisplayMode,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            greeting: DEFAULT_GREETING.to_string(),
            ui: UiConfig::default(),
            home: home.join(".support-chat"),
        }
    }
}

impl Config {
    /// Load `~/.support-chat/config.toml`, then apply environment overrides
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let mut config = Self::load_from(&home.join(".support-chat"))?;
        config.apply_env(std::env::var(ENDPOINT_ENV).ok());
        Ok(config)
    }

    /// Load the config file kept under `app_home`, falling back to defaults
    pub fn load_from(app_home: &Path) -> Result<Self> {
        let config_path = app_home.join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.home = app_home.to_path_buf();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.home).context("Failed to create config directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(self.config_path(), content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    fn apply_env(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
    }
}
