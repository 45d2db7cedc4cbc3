//! Fixed-reply summarizer for tests.

use async_trait::async_trait;

use crate::context::{ActivityContext, ActivitySummary};
use crate::error::AiError;
use crate::summarizer::Summarizer;

/// Returns the same reply, or the same failure, for every call.
#[derive(Debug, Clone)]
pub struct StaticSummarizer {
    reply: Result<ActivitySummary, String>,
}

impl StaticSummarizer {
    pub fn replying(summary: ActivitySummary) -> Self {
        Self { reply: Ok(summary) }
    }

    /// Every call fails with a network error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
        }
    }
}

#[async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, _ctx: &ActivityContext) -> Result<ActivitySummary, AiError> {
        self.reply.clone().map_err(AiError::Network)
    }

    fn name(&self) -> &str {
        "StaticSummarizer"
    }
}
