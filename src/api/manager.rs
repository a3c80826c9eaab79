use anyhow::{Context, Result};
use log::{debug, info};

use super::client::EsignClient;
use crate::config::Config;
use crate::workflow::models::SessionContext;

/// A client bound to one configured environment
#[derive(Clone)]
pub struct Connection {
    pub environment: String,
    pub client: EsignClient,
    pub session: SessionContext,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("environment", &self.environment)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Builds clients for the environments in a [`Config`]
pub struct ClientManager {
    config: Config,
}

impl ClientManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Environment variables only, ignoring the config file.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    /// The config file, or `ESIGN_*` variables when it has no environments.
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        if config.environments.is_empty() {
            debug!("No environments configured, trying ESIGN_* variables");
            return Self::from_env()
                .context("No environments configured. Run 'esign-cli env add' or set ESIGN_* variables");
        }
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_client(&self) -> Result<Connection> {
        let name = self
            .config
            .get_current_environment_name()
            .context("No environment selected. Run 'esign-cli env select'")?
            .to_string();
        self.get_client_for(&name)
    }

    pub fn get_client_for(&self, name: &str) -> Result<Connection> {
        let environment = self
            .config
            .environments
            .get(name)
            .with_context(|| format!("Environment '{}' not found", name))?;

        let client = EsignClient::new(
            environment.host.clone(),
            environment.api_token.clone(),
            &self.config.settings.resilience(),
        )?;

        info!("Using environment {} ({})", name, environment.host);
        Ok(Connection {
            environment: name.to_string(),
            client,
            session: environment.session(),
        })
    }
}
