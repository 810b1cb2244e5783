use crate::configuration::Settings;
use crate::error::RelayError;
use murmur::errors::ProviderResult;
use murmur::providers::anthropic::{http_client, AnthropicProvider};
use murmur::providers::configs::AnthropicProviderConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Where the provider credential comes from, resolved on every request
#[derive(Clone)]
pub enum ApiKeySource {
    Fixed(String),
    Env(String),
}

impl ApiKeySource {
    pub fn resolve(&self) -> Result<String, RelayError> {
        let key = match self {
            ApiKeySource::Fixed(key) => Some(key.clone()),
            ApiKeySource::Env(var) => std::env::var(var).ok(),
        };

        key.filter(|key| !key.trim().is_empty())
            .ok_or_else(|| RelayError::MissingApiKey {
                env_var: self.env_var().to_string(),
            })
    }

    fn env_var(&self) -> &str {
        match self {
            ApiKeySource::Fixed(_) => "MURMUR_PROVIDER__API_KEY",
            ApiKeySource::Env(var) => var,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub http: Client,
    pub provider_host: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_key: ApiKeySource,
    pub system_prompt: Arc<str>,
    pub setup_timeout: Duration,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> ProviderResult<Self> {
        let api_key = match &settings.provider.api_key {
            Some(key) => ApiKeySource::Fixed(key.clone()),
            None => ApiKeySource::Env(settings.provider.api_key_env.clone()),
        };

        Ok(Self {
            http: http_client()?,
            provider_host: settings.provider.host.clone(),
            model: settings.provider.model.clone(),
            max_tokens: settings.provider.max_tokens,
            api_key,
            system_prompt: Arc::from(settings.relay.system_prompt.as_str()),
            setup_timeout: Duration::from_secs(settings.relay.setup_timeout_secs),
        })
    }

    /// Provider for one request: the shared HTTP client with the freshly resolved key
    pub fn provider(&self, api_key: String) -> AnthropicProvider {
        let config = AnthropicProviderConfig {
            host: self.provider_host.clone(),
            api_key,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        };
        AnthropicProvider::with_client(self.http.clone(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_fixed_key() {
        let source = ApiKeySource::Fixed("sk-test".to_string());
        assert_eq!(source.resolve().unwrap(), "sk-test");
    }

    #[test]
    #[serial]
    fn test_env_key_is_read_per_call() {
        let source = ApiKeySource::Env("MURMUR_STATE_TEST_KEY".to_string());
        std::env::remove_var("MURMUR_STATE_TEST_KEY");
        assert!(matches!(
            source.resolve(),
            Err(RelayError::MissingApiKey { ref env_var }) if env_var == "MURMUR_STATE_TEST_KEY"
        ));

        std::env::set_var("MURMUR_STATE_TEST_KEY", "sk-later");
        assert_eq!(source.resolve().unwrap(), "sk-later");

        std::env::set_var("MURMUR_STATE_TEST_KEY", "  ");
        assert!(source.resolve().is_err());

        std::env::remove_var("MURMUR_STATE_TEST_KEY");
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.provider.api_key = Some("sk-config".to_string());
        settings.relay.setup_timeout_secs = 12;

        let state = AppState::from_settings(&settings).unwrap();
        assert_eq!(state.setup_timeout, Duration::from_secs(12));
        assert_eq!(state.api_key.resolve().unwrap(), "sk-config");
        assert_eq!(state.max_tokens, 4096);
    }
}
