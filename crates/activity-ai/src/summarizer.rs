//! The summarizer seam and the fallback that keeps it non-critical.

use async_trait::async_trait;

use crate::context::{ActivityContext, ActivitySummary};
use crate::error::AiError;

/// Turns activity metadata into a short description.
///
/// Object-safe so the server can hold an `Arc<dyn Summarizer>`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, ctx: &ActivityContext) -> Result<ActivitySummary, AiError>;

    /// Human-readable implementation name.
    fn name(&self) -> &str;
}

/// `"{type} activity recorded for {crop or 'crops'}. {notes}"`, trimmed.
pub fn fallback_summary(ctx: &ActivityContext) -> String {
    let crop = ctx
        .crop
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("crops");
    let notes = ctx.notes.as_deref().unwrap_or("");

    format!("{} activity recorded for {}. {}", ctx.activity_type, crop, notes)
        .trim_end()
        .to_string()
}

/// Summarize, substituting [`fallback_summary`] for any failure.
pub async fn summarize_or_fallback(
    summarizer: &dyn Summarizer,
    ctx: &ActivityContext,
) -> ActivitySummary {
    match summarizer.summarize(ctx).await {
        Ok(summary) if !summary.summary.trim().is_empty() => summary,
        Ok(_) => {
            tracing::warn!(summarizer = summarizer.name(), "Empty summary, using fallback");
            ActivitySummary::new(fallback_summary(ctx))
        }
        Err(e) => {
            tracing::warn!(summarizer = summarizer.name(), error = %e, "Summarization failed, using fallback");
            ActivitySummary::new(fallback_summary(ctx))
        }
    }
}
