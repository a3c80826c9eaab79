use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::resilience::ResilienceConfig;
use crate::workflow::models::SessionContext;

/// Name given to the environment built from `ESIGN_*` variables
pub const ENV_ENVIRONMENT_NAME: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub host: String,
    pub api_token: String,
    pub company_id: String,
    pub user_id: String,
}

impl EnvironmentConfig {
    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.user_id.clone(), self.company_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub current_environment: Option<String>,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Attempts for workflow, template and contact reads. Create and send are never retried.
    #[serde(default = "default_max_read_attempts")]
    pub max_read_attempts: u32,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_read_attempts() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_read_attempts: default_max_read_attempts(),
        }
    }
}

impl Settings {
    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .max_read_attempts(self.max_read_attempts.max(1))
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("esign-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".esign-cli")
        };

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Missing file reads as the default config.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using default config");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!("Loaded config with {} environments", config.environments.len());
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
                info!("Created config directory: {:?}", config_dir);
            }
        }

        let config_content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// One-environment config from `ESIGN_HOST`, `ESIGN_API_TOKEN`,
    /// `ESIGN_COMPANY_ID` and `ESIGN_USER_ID`, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("Environment variable {} is not set", key))
        };

        let environment = EnvironmentConfig {
            host: require("ESIGN_HOST")?,
            api_token: require("ESIGN_API_TOKEN")?,
            company_id: require("ESIGN_COMPANY_ID")?,
            user_id: require("ESIGN_USER_ID")?,
        };

        let mut environments = HashMap::new();
        environments.insert(ENV_ENVIRONMENT_NAME.to_string(), environment);

        Ok(Self {
            current_environment: Some(ENV_ENVIRONMENT_NAME.to_string()),
            environments,
            settings: Settings::default(),
        })
    }

    /// Adds or replaces `name`. The first environment becomes current.
    pub fn add_environment(&mut self, name: String, environment: EnvironmentConfig) {
        info!("Adding environment: {}", name);
        self.environments.insert(name.clone(), environment);

        if self.current_environment.is_none() {
            info!("Set {} as current environment", name);
            self.current_environment = Some(name);
        }
    }

    pub fn get_current_environment(&self) -> Option<(&str, &EnvironmentConfig)> {
        let name = self.current_environment.as_deref()?;
        self.environments.get(name).map(|env| (name, env))
    }

    pub fn get_current_environment_name(&self) -> Option<&str> {
        self.current_environment.as_deref()
    }

    pub fn set_current_environment(&mut self, name: &str) -> Result<()> {
        if !self.environments.contains_key(name) {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Setting current environment to: {}", name);
        self.current_environment = Some(name.to_string());
        Ok(())
    }

    /// Sorted environment names
    pub fn list_environments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn remove_environment(&mut self, name: &str) -> Result<()> {
        if self.environments.remove(name).is_none() {
            anyhow::bail!("Environment '{}' not found", name);
        }
        info!("Removed environment: {}", name);

        if self.current_environment.as_deref() == Some(name) {
            warn!("Removed current environment, clearing current selection");
            self.current_environment = None;
        }
        Ok(())
    }
}
