//! Route handlers, one module per role.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod extension;
pub mod farmer;
pub mod health;
pub mod institution;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use database::models::{RequestStatus, Role};
use database::DatabaseError;
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `?status=` filter on access-request listings.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub(crate) fn parse(&self) -> Result<Option<RequestStatus>> {
        match self.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
            None => Ok(None),
            Some(s) => RequestStatus::parse(s)
                .map(Some)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {s}"))),
        }
    }
}

/// `?q=` search parameter.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// 404 unless `user_id` is a farmer.
pub(crate) async fn ensure_farmer(state: &AppState, user_id: &str) -> Result<()> {
    match database::user_role::get_role(state.db.pool(), user_id).await {
        Ok(Role::Farmer) => Ok(()),
        Ok(_) | Err(DatabaseError::NotFound { .. }) => Err(DatabaseError::NotFound {
            entity: "Farmer",
            id: user_id.to_string(),
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/admin", get(admin::dashboard_page))
        // Health check
        .route("/health", get(health::health))
        // Auth
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        // AI
        .route("/api/ai/summarize", post(ai::summarize))
        // Farmer
        .route(
            "/api/farmer/activities",
            get(farmer::list_activities).post(farmer::create_activity),
        )
        .route("/api/farmer/activities/:id", patch(farmer::update_activity))
        .route("/api/farmer/activities/:id/accept", post(farmer::accept_activity))
        .route("/api/farmer/summary", get(farmer::summary))
        .route(
            "/api/farmer/fields",
            get(farmer::list_fields).post(farmer::create_field),
        )
        .route(
            "/api/farmer/permissions",
            get(farmer::list_permissions).post(farmer::grant_permission),
        )
        .route("/api/farmer/permissions/:id", delete(farmer::revoke_permission))
        .route("/api/farmer/access-requests", get(farmer::list_access_requests))
        .route(
            "/api/farmer/access-requests/:id/respond",
            post(farmer::respond_access_request),
        )
        .route(
            "/api/farmer/access-requests/:id/revoke",
            post(farmer::revoke_access_request),
        )
        .route(
            "/api/farmer/profile",
            get(farmer::get_profile).put(farmer::update_profile),
        )
        // Extension
        .route("/api/extension/farmers", get(extension::list_farmers))
        .route("/api/extension/farmers/:id/fields", get(extension::farmer_fields))
        .route("/api/extension/activities", post(extension::create_activity))
        .route("/api/extension/submissions", get(extension::submissions))
        .route("/api/extension/pending", get(extension::pending))
        .route("/api/extension/sync", post(extension::sync))
        // Institution
        .route("/api/institution/farmers", get(institution::search_farmers))
        .route(
            "/api/institution/access-requests",
            get(institution::list_access_requests).post(institution::create_access_request),
        )
        .route(
            "/api/institution/access-requests/:id/revoke",
            post(institution::revoke_access_request),
        )
        .route("/api/institution/approved", get(institution::approved))
        .route(
            "/api/institution/farmers/:id/profile",
            get(institution::farmer_profile),
        )
        .route("/api/institution/reports", get(institution::reports))
        .route("/api/institution/download", get(institution::download))
        .route("/api/institution/stats", get(institution::stats))
        .route(
            "/api/institution/profile",
            get(institution::get_profile).put(institution::update_profile),
        )
        // Admin
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/users", get(admin::users))
        .route("/api/admin/activities", get(admin::activities))
        .route("/api/admin/access-requests", get(admin::access_requests))
        .route("/api/admin/institutions", get(admin::institutions))
        .route("/api/admin/extension-workers", get(admin::extension_workers))
        .route("/api/admin/audit-logs", get(admin::audit_logs))
        .route(
            "/api/admin/settings",
            get(admin::settings).put(admin::update_settings),
        )
}
