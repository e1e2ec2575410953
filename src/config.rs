use crate::{
    errors::{AnalyzerError, Result},
    network::Network,
};
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable holding the Infura project id used to build the RPC endpoint.
pub const INFURA_PROJECT_ID: &str = "INFURA_PROJECT_ID";

/// Environment variable holding the Etherscan-style metadata API key.
pub const ETHERSCAN_API_KEY: &str = "ETHERSCAN_API_KEY";

/// All settings for the server.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Application settings.
    pub application: ApplicationSettings,
    /// Settings for the analysis pipeline and its gateways.
    pub analysis: AnalysisSettings,
}

/// Application settings.
#[derive(Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    /// The port number on which the application will listen.
    pub port: u16,

    /// The hostname or IP address where the application will run.
    ///
    /// This is a `String` that specifies the network address at which the application is
    /// accessible. This could be a hostname like "localhost" or an IP address like
    /// "127.0.0.1".
    pub host: String,
}

/// Analysis settings. Credentials are not part of the config files, they are read from the
/// process environment by [`GatewayConfig::from_env`].
#[derive(Deserialize, Debug, Clone)]
pub struct AnalysisSettings {
    /// Network to analyze contracts on.
    #[serde(default)]
    pub network: Network,

    /// Delay between two consecutive contract analyses in a batch.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Timeout applied to every metadata API request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Overrides the Infura endpoint, e.g. to point at a local node. When set, no Infura project
    /// id is required.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Overrides the metadata API base URL of the selected network.
    #[serde(default)]
    pub explorer_url: Option<String>,
}

fn default_rate_limit_ms() -> u64 {
    200
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rate_limit_ms: default_rate_limit_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            rpc_url: None,
            explorer_url: None,
        }
    }
}

impl AnalysisSettings {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

/// Fully resolved connection settings for the gateway. Building one is the only place where
/// missing credentials are detected, so a gateway can never exist without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub network: Network,
    pub rpc_url: String,
    pub explorer_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Reads credentials from the process environment and resolves the endpoints for the
    /// configured network.
    pub fn from_env(settings: &AnalysisSettings) -> Result<Self> {
        Self::new(
            settings,
            std::env::var(INFURA_PROJECT_ID).ok(),
            std::env::var(ETHERSCAN_API_KEY).ok(),
        )
    }

    pub fn new(
        settings: &AnalysisSettings,
        project_id: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let project_id = project_id.filter(|id| !id.trim().is_empty());
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(AnalyzerError::MissingCredential(ETHERSCAN_API_KEY))?;

        let rpc_url = match (&settings.rpc_url, project_id) {
            (Some(url), _) => url.clone(),
            (None, Some(id)) => settings.network.rpc_url(&id),
            (None, None) => return Err(AnalyzerError::MissingCredential(INFURA_PROJECT_ID)),
        };
        let explorer_url = settings
            .explorer_url
            .clone()
            .unwrap_or_else(|| settings.network.explorer_url().to_string());

        Ok(Self {
            network: settings.network,
            rpc_url,
            explorer_url,
            api_key,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        })
    }
}

/// Reads `config/base.toml`, then the file matching the `APP_ENVIRONMENT` environment variable,
/// then `APP_`-prefixed environment variables (e.g. `APP_ANALYSIS__NETWORK=polygon`), and returns
/// the merged settings.
pub fn get_configuration() -> std::result::Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to get current directory: {e}")))?;
    let config_dir = base_path.join("config");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let environment_filename = format!("{}.toml", environment.as_str());

    let settings = Config::builder()
        .add_source(File::from(config_dir.join("base.toml")).required(false))
        .add_source(File::from(config_dir.join(environment_filename)).required(false))
        .add_source(
            config::Environment::with_prefix("APP").prefix_separator("_").separator("__"),
        )
        .build()?;
    settings.try_deserialize()
}

/// The possible runtime environments for the application.
pub enum Environment {
    /// Local development environment.
    Local,
    /// Production environment.
    Production,
}

impl Environment {
    /// Returns the environment as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Must be `local` or `production`"
            )),
        }
    }
}
