//! Summarizer backed by an OpenAI-compatible chat completion gateway.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::AiGatewayConfig;
use crate::context::{ActivityContext, ActivitySummary};
use crate::error::AiError;
use crate::summarizer::Summarizer;

const SYSTEM_PROMPT: &str =
    "You are an agricultural AI assistant. Respond only with valid JSON.";

/// Greedy, so nested objects and surrounding prose are tolerated.
const JSON_SPAN: &str = r"(?s)\{.*\}";

/// Calls the configured gateway once per activity.
pub struct GatewaySummarizer {
    client: Client,
    config: AiGatewayConfig,
    json_span: Regex,
}

impl GatewaySummarizer {
    pub fn new(config: AiGatewayConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        let json_span = Regex::new(JSON_SPAN)
            .map_err(|e| AiError::Configuration(format!("Invalid reply pattern: {}", e)))?;

        tracing::info!(model = %config.model, url = %config.api_url, "AI gateway summarizer ready");

        Ok(Self {
            client,
            config,
            json_span,
        })
    }

    /// See [`AiGatewayConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, AiError> {
        Self::new(AiGatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &AiGatewayConfig {
        &self.config
    }

    async fn chat_completion(&self, prompt: String) -> Result<ChatCompletionResponse, AiError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);
            warn!(status = status.as_u16(), %message, "AI gateway error");
            return Err(AiError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AiError::InvalidReply(format!("Failed to parse response: {}", e)))
    }
}

/// Pull the summary object out of a free-text model reply.
pub fn parse_reply(json_span: &Regex, content: &str) -> Result<ActivitySummary, AiError> {
    let span = json_span
        .find(content)
        .ok_or_else(|| AiError::InvalidReply("no JSON object in reply".to_string()))?;

    let summary: ActivitySummary = serde_json::from_str(span.as_str())
        .map_err(|e| AiError::InvalidReply(e.to_string()))?;

    if summary.summary.trim().is_empty() {
        return Err(AiError::InvalidReply("empty summary".to_string()));
    }

    Ok(summary)
}

#[async_trait]
impl Summarizer for GatewaySummarizer {
    async fn summarize(&self, ctx: &ActivityContext) -> Result<ActivitySummary, AiError> {
        let completion = self.chat_completion(ctx.prompt()).await?;
        let content = completion.first_content();
        debug!(chars = content.len(), "AI gateway reply received");

        parse_reply(&self.json_span, content)
    }

    fn name(&self) -> &str {
        "GatewaySummarizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        Regex::new(JSON_SPAN).unwrap()
    }

    #[test]
    fn test_parse_fenced_reply() {
        let content = "Here you go:\n```json\n{\n  \"summary\": \"Planted maize.\",\n  \"extractedData\": {\"crop\": \"Maize\", \"inputs\": {\"seed\": \"H614\"}}\n}\n```";
        let summary = parse_reply(&pattern(), content).unwrap();

        assert_eq!(summary.summary, "Planted maize.");
        assert_eq!(summary.extracted_data["inputs"]["seed"], "H614");
    }

    #[test]
    fn test_parse_rejects_prose_and_empty_summary() {
        assert!(matches!(
            parse_reply(&pattern(), "I could not help with that."),
            Err(AiError::InvalidReply(_))
        ));
        assert!(matches!(
            parse_reply(&pattern(), r#"{"summary": "  "}"#),
            Err(AiError::InvalidReply(_))
        ));
        assert!(matches!(
            parse_reply(&pattern(), "{not json}"),
            Err(AiError::InvalidReply(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_network_error() {
        let config = AiGatewayConfig::builder()
            .api_key("key")
            .api_url("http://127.0.0.1:9")
            .timeout(std::time::Duration::from_secs(2))
            .build();
        let summarizer = GatewaySummarizer::new(config).unwrap();

        let result = summarizer.summarize(&ActivityContext::new("Planting")).await;
        assert!(matches!(result, Err(AiError::Network(_))));
    }
}
