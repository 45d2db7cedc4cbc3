//! Configuration for the AI gateway client.

use std::env;
use std::time::Duration;

use crate::error::AiError;

pub const DEFAULT_API_URL: &str = "https://ai.gateway.lovable.dev";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Configuration for [`GatewaySummarizer`](crate::GatewaySummarizer).
#[derive(Debug, Clone)]
pub struct AiGatewayConfig {
    /// Gateway base URL; `/v1/chat/completions` is appended.
    pub api_url: String,

    /// Bearer key for the gateway.
    pub api_key: String,

    /// Model name to request.
    pub model: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for AiGatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AiGatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `AI_GATEWAY_API_KEY`
    ///
    /// Optional:
    /// - `AI_GATEWAY_URL` (default: https://ai.gateway.lovable.dev)
    /// - `AI_GATEWAY_MODEL` (default: google/gemini-2.5-flash)
    /// - `AI_GATEWAY_TIMEOUT_SECS` (default: 20)
    pub fn from_env() -> Result<Self, AiError> {
        let api_key = env::var("AI_GATEWAY_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AiError::Configuration("AI_GATEWAY_API_KEY not set".to_string()))?;

        let api_url = env::var("AI_GATEWAY_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("AI_GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = env::var("AI_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Create a new config builder.
    pub fn builder() -> AiGatewayConfigBuilder {
        AiGatewayConfigBuilder::default()
    }
}

/// Builder for [`AiGatewayConfig`].
#[derive(Debug, Default)]
pub struct AiGatewayConfigBuilder {
    config: AiGatewayConfig,
}

impl AiGatewayConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> AiGatewayConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AiGatewayConfig::default();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "google/gemini-2.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_builder() {
        let config = AiGatewayConfig::builder()
            .api_key("key")
            .api_url("http://localhost:9000")
            .model("test-model")
            .timeout(Duration::from_secs(3))
            .build();

        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.model, "test-model");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    // Env vars are process-global, so every scenario runs under one lock.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_vars() {
            std::env::remove_var("AI_GATEWAY_API_KEY");
            std::env::remove_var("AI_GATEWAY_URL");
            std::env::remove_var("AI_GATEWAY_MODEL");
            std::env::remove_var("AI_GATEWAY_TIMEOUT_SECS");
        }

        clear_vars();
        match AiGatewayConfig::from_env() {
            Err(AiError::Configuration(msg)) => assert!(msg.contains("AI_GATEWAY_API_KEY")),
            other => panic!("expected configuration error, got {other:?}"),
        }

        std::env::set_var("AI_GATEWAY_API_KEY", "  ");
        assert!(AiGatewayConfig::from_env().is_err());

        clear_vars();
        std::env::set_var("AI_GATEWAY_API_KEY", "env-key");
        let config = AiGatewayConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);

        std::env::set_var("AI_GATEWAY_URL", "http://gateway.local/");
        std::env::set_var("AI_GATEWAY_MODEL", "other/model");
        std::env::set_var("AI_GATEWAY_TIMEOUT_SECS", "5");
        let config = AiGatewayConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://gateway.local");
        assert_eq!(config.model, "other/model");
        assert_eq!(config.timeout, Duration::from_secs(5));

        clear_vars();
    }
}
