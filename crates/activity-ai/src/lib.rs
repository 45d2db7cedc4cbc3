//! AI summaries for farm activities.
//!
//! A [`Summarizer`] turns an [`ActivityContext`] into an [`ActivitySummary`].
//! [`GatewaySummarizer`] asks an OpenAI-compatible chat gateway; callers go
//! through [`summarize_or_fallback`], which never fails and substitutes a
//! templated sentence when the gateway is down or replies with junk.
//!
//! ```rust,no_run
//! use activity_ai::{summarize_or_fallback, ActivityContext, GatewaySummarizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summarizer = GatewaySummarizer::from_env()?;
//!     let ctx = ActivityContext::new("Planting");
//!     let summary = summarize_or_fallback(&summarizer, &ctx).await;
//!     println!("{}", summary.summary);
//!     Ok(())
//! }
//! ```

mod api_types;
mod config;
mod context;
mod error;
mod gateway;
mod static_reply;
mod summarizer;
mod template;

pub use config::{AiGatewayConfig, AiGatewayConfigBuilder, DEFAULT_MODEL};
pub use context::{ActivityContext, ActivitySummary};
pub use error::AiError;
pub use gateway::GatewaySummarizer;
pub use static_reply::StaticSummarizer;
pub use summarizer::{fallback_summary, summarize_or_fallback, Summarizer};
pub use template::TemplateSummarizer;

pub use async_trait::async_trait;
