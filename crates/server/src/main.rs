//! AgriLog HTTP server.
//!
//! Serves the JSON API for farmers, extension workers, institutions and
//! admins, plus a server-rendered admin dashboard.

mod auth;
mod config;
mod csv;
mod error;
mod routes;
mod state;
mod sweep;

use std::sync::Arc;

use activity_ai::{GatewaySummarizer, Summarizer, TemplateSummarizer};
use database::Database;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting AgriLog server");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let summarizer: Arc<dyn Summarizer> = match GatewaySummarizer::from_env() {
        Ok(gateway) => {
            info!(model = %gateway.config().model, "AI gateway configured");
            Arc::new(gateway)
        }
        Err(e) => {
            warn!(error = %e, "AI gateway unavailable, using templated summaries");
            Arc::new(TemplateSummarizer::new())
        }
    };

    sweep::spawn_expiry_sweep(db.clone(), config.expiry_sweep);

    let state = AppState::new(db, summarizer, config.session_ttl_hours);
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %config.addr, "AgriLog server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
