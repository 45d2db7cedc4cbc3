//! Offline summarizer that never calls out.

use async_trait::async_trait;
use serde_json::json;

use crate::context::{ActivityContext, ActivitySummary};
use crate::error::AiError;
use crate::summarizer::{fallback_summary, Summarizer};

/// Deterministic summaries built from the context alone.
///
/// Used when no gateway key is configured.
#[derive(Debug, Clone, Default)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Summarizer for TemplateSummarizer {
    async fn summarize(&self, ctx: &ActivityContext) -> Result<ActivitySummary, AiError> {
        let mut extracted = json!({ "activityType": ctx.activity_type });
        if let Some(crop) = ctx.crop.as_deref().filter(|c| !c.trim().is_empty()) {
            extracted["crop"] = json!(crop);
        }
        if let Some(inputs) = ctx.inputs_used.as_deref().filter(|i| !i.trim().is_empty()) {
            extracted["inputsUsed"] = json!(inputs);
        }

        Ok(ActivitySummary {
            summary: fallback_summary(ctx),
            extracted_data: extracted,
        })
    }

    fn name(&self) -> &str {
        "TemplateSummarizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_template_summary() {
        let ctx = ActivityContext {
            crop: Some("Beans".to_string()),
            inputs_used: Some("DAP 50kg".to_string()),
            ..ActivityContext::new("Fertilizer")
        };

        let summary = TemplateSummarizer::new().summarize(&ctx).await.unwrap();
        assert_eq!(summary.summary, "Fertilizer activity recorded for Beans.");
        assert_eq!(summary.extracted_data["inputsUsed"], "DAP 50kg");
        assert_eq!(summary.extracted_data["activityType"], "Fertilizer");
    }
}
