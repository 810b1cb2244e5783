use crate::error::ConfigError;
use config::{Config, Environment};
use murmur::prompt::SYSTEM_PROMPT;
use murmur::providers::anthropic::{ANTHROPIC_HOST, ANTHROPIC_MODEL};
use murmur::providers::configs::DEFAULT_MAX_TOKENS;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

#[derive(Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Takes precedence over `api_key_env` when set
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: default_provider_host(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key: None,
            api_key_env: default_api_key_env(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RelaySettings {
    #[serde(default = "default_setup_timeout_secs")]
    pub setup_timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            setup_timeout_secs: default_setup_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub relay: RelaySettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load()
    }

    fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            // Provider defaults
            .set_default("provider.host", default_provider_host())?
            .set_default("provider.model", default_model())?
            .set_default("provider.api_key_env", default_api_key_env())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("MURMUR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_provider_host() -> String {
    ANTHROPIC_HOST.to_string()
}

fn default_model() -> String {
    ANTHROPIC_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_setup_timeout_secs() -> u64 {
    30
}

fn default_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}
