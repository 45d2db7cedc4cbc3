//! Application state shared across handlers.

use std::sync::Arc;

use activity_ai::Summarizer;
use database::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Gateway-backed in production, a fixed reply in tests.
    pub summarizer: Arc<dyn Summarizer>,
    pub session_ttl_hours: i64,
}

impl AppState {
    pub fn new(db: Database, summarizer: Arc<dyn Summarizer>, session_ttl_hours: i64) -> Self {
        Self {
            db,
            summarizer,
            session_ttl_hours,
        }
    }

    /// Append an audit record. Failures are logged, not returned.
    pub async fn audit(
        &self,
        actor_id: Option<&str>,
        action: &str,
        entity: &str,
        entity_id: Option<&str>,
        details: Option<&str>,
    ) {
        if let Err(e) =
            database::audit_log::record(self.db.pool(), actor_id, action, entity, entity_id, details)
                .await
        {
            tracing::warn!(error = %e, action, entity, "Failed to write audit log");
        }
    }
}
