//! Admin dashboard and platform-wide listings.

use std::collections::BTreeMap;

use askama::Template;
use axum::extract::{Query, State};
use axum::Json;
use database::farm_activity;
use database::models::{
    AccessRequest, AuditLog, FarmActivity, InstitutionProfile, Role, UserSummary,
    VerificationStatus,
};
use database::validation::validate_duration_days;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::routes::SearchQuery;
use crate::state::AppState;

/// Rows shown on the dashboard and by `/api/admin/activities`.
const RECENT_ACTIVITY_LIMIT: i64 = 100;

/// Settings an admin may change. All but the first are booleans.
const KNOWN_SETTINGS: [&str; 3] = [
    "default_access_days",
    "auto_confirm_signups",
    "require_admin_2fa",
];

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub stats: AdminStats,
    pub recent: Vec<FarmActivity>,
    pub audit: Vec<AuditLog>,
}

/// Platform statistics.
#[derive(Clone, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub users_by_role: BTreeMap<String, i64>,
    pub total_activities: i64,
    pub requests_by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct ExtensionWorker {
    pub user_id: String,
    pub full_name: String,
    pub village_location: Option<String>,
    pub submissions: usize,
    pub pending_review: usize,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

/// Render the dashboard page.
pub async fn dashboard_page(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<DashboardTemplate> {
    auth.require(Role::Admin)?;
    let stats = get_stats(&state).await?;
    let recent = farm_activity::list_recent_activities(state.db.pool(), 20, None).await?;
    let audit = database::audit_log::list_recent(state.db.pool(), Some(20)).await?;
    Ok(DashboardTemplate {
        stats,
        recent,
        audit,
    })
}

/// Get dashboard statistics as JSON.
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> Result<Json<AdminStats>> {
    auth.require(Role::Admin)?;
    Ok(Json(get_stats(&state).await?))
}

/// Fetch statistics from the database.
async fn get_stats(state: &AppState) -> Result<AdminStats> {
    let pool = state.db.pool();

    let users_by_role: BTreeMap<String, i64> = database::user_role::count_users_by_role(pool)
        .await?
        .into_iter()
        .map(|(role, count)| (role.as_str().to_string(), count))
        .collect();
    let requests_by_status = database::access_request::count_by_status(pool, None)
        .await?
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), count))
        .collect();

    Ok(AdminStats {
        total_users: users_by_role.values().sum(),
        users_by_role,
        total_activities: farm_activity::count_activities(pool).await?,
        requests_by_status,
    })
}

pub async fn users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>> {
    auth.require(Role::Admin)?;
    let users =
        database::user_role::list_users_with_roles(state.db.pool(), query.q.as_deref()).await?;
    Ok(Json(users))
}

pub async fn activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FarmActivity>>> {
    auth.require(Role::Admin)?;
    let activities = farm_activity::list_recent_activities(
        state.db.pool(),
        RECENT_ACTIVITY_LIMIT,
        query.q.as_deref(),
    )
    .await?;
    Ok(Json(activities))
}

pub async fn access_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<AccessRequest>>> {
    auth.require(Role::Admin)?;
    Ok(Json(database::access_request::list_all(state.db.pool()).await?))
}

pub async fn institutions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<InstitutionProfile>>> {
    auth.require(Role::Admin)?;
    Ok(Json(
        database::institution_profile::list_institutions(state.db.pool()).await?,
    ))
}

/// Extension workers with their submission counts.
pub async fn extension_workers(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ExtensionWorker>>> {
    auth.require(Role::Admin)?;
    let pool = state.db.pool();

    let profiles = database::profile::search_profiles(pool, None, Some(Role::Enumerator)).await?;
    let mut workers = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let collected =
            farm_activity::list_activities_collected_by(pool, &profile.user_id, None).await?;
        workers.push(ExtensionWorker {
            pending_review: collected
                .iter()
                .filter(|a| a.verification_status == VerificationStatus::Pending)
                .count(),
            submissions: collected.len(),
            user_id: profile.user_id,
            full_name: profile.full_name,
            village_location: profile.village_location,
        });
    }

    Ok(Json(workers))
}

pub async fn audit_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>> {
    auth.require(Role::Admin)?;
    let logs = database::audit_log::list_recent(state.db.pool(), query.limit).await?;
    Ok(Json(logs))
}

pub async fn settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BTreeMap<String, String>>> {
    auth.require(Role::Admin)?;
    let settings = database::system_setting::list_settings(state.db.pool())
        .await?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect();
    Ok(Json(settings))
}

/// Check one setting and return its stored string form.
fn setting_value(key: &str, value: &Value) -> Result<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    match key {
        "default_access_days" => {
            let days: i64 = text
                .parse()
                .map_err(|_| ApiError::bad_request("default_access_days must be a whole number"))?;
            validate_duration_days(days)?;
            Ok(days.to_string())
        }
        flag if KNOWN_SETTINGS.contains(&flag) => match text.as_str() {
            "true" | "false" => Ok(text),
            _ => Err(ApiError::bad_request(format!("{flag} must be true or false"))),
        },
        _ => Err(ApiError::bad_request(format!("Unknown setting: {key}"))),
    }
}

/// Update settings. The whole body is checked before anything is written.
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BTreeMap<String, Value>>,
) -> Result<Json<BTreeMap<String, String>>> {
    auth.require(Role::Admin)?;

    let updates = body
        .iter()
        .map(|(key, value)| Ok((key.as_str(), setting_value(key, value)?)))
        .collect::<Result<Vec<_>>>()?;

    for (key, value) in &updates {
        database::system_setting::upsert_setting(state.db.pool(), key, value).await?;
        state
            .audit(
                Some(&auth.user_id),
                "update",
                "system_setting",
                Some(*key),
                Some(value.as_str()),
            )
            .await;
    }

    settings(State(state), auth).await
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::KNOWN_SETTINGS;
    use crate::routes::tests::{send, send_raw, signup, test_app};

    #[tokio::test]
    async fn test_stats_and_listings() {
        let app = test_app().await;
        let (admin, _) = signup(&app, "admin@example.com", "admin").await;
        let (farmer, _) = signup(&app, "amina@example.com", "farmer").await;
        let (worker, _) = signup(&app, "worker@example.com", "enumerator").await;
        signup(&app, "bank@example.com", "institution").await;

        send(
            &app,
            "POST",
            "/api/farmer/activities",
            Some(&farmer),
            Some(json!({"activity_type": "Planting", "activity_date": "2025-03-04T08:00:00Z", "crop": "Sorghum"})),
        )
        .await;

        let (status, stats) = send(&app, "GET", "/api/admin/stats", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_users"], 4);
        assert_eq!(stats["users_by_role"]["farmer"], 1);
        assert_eq!(stats["total_activities"], 1);

        let (_, users) = send(&app, "GET", "/api/admin/users?q=amina", Some(&admin), None).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["role"], "farmer");

        let (_, activities) =
            send(&app, "GET", "/api/admin/activities?q=sorghum", Some(&admin), None).await;
        assert_eq!(activities.as_array().unwrap().len(), 1);

        let (_, institutions) = send(&app, "GET", "/api/admin/institutions", Some(&admin), None).await;
        assert_eq!(institutions[0]["organization_name"], "bank org");

        let (_, workers) =
            send(&app, "GET", "/api/admin/extension-workers", Some(&admin), None).await;
        assert_eq!(workers[0]["submissions"], 0);

        let (_, logs) = send(&app, "GET", "/api/admin/audit-logs?limit=2", Some(&admin), None).await;
        assert_eq!(logs.as_array().unwrap().len(), 2);
        assert_eq!(logs[0]["action"], "create");

        let (status, _) = send(&app, "GET", "/api/admin/users", Some(&worker), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_settings() {
        let app = test_app().await;
        let (admin, _) = signup(&app, "admin@example.com", "admin").await;

        let (_, settings) = send(&app, "GET", "/api/admin/settings", Some(&admin), None).await;
        for key in KNOWN_SETTINGS {
            assert!(settings[key].is_string(), "{key}");
        }
        assert_eq!(settings["default_access_days"], "30");

        let (status, settings) = send(
            &app,
            "PUT",
            "/api/admin/settings",
            Some(&admin),
            Some(json!({"default_access_days": 90, "require_admin_2fa": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["default_access_days"], "90");
        assert_eq!(settings["require_admin_2fa"], "true");

        for bad in [
            json!({"default_access_days": 0}),
            json!({"default_access_days": "soon"}),
            json!({"auto_confirm_signups": "maybe"}),
            json!({"theme": "dark"}),
        ] {
            let (status, _) =
                send(&app, "PUT", "/api/admin/settings", Some(&admin), Some(bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (_, settings) = send(&app, "GET", "/api/admin/settings", Some(&admin), None).await;
        assert_eq!(settings["default_access_days"], "90");
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let app = test_app().await;
        let (admin, _) = signup(&app, "admin@example.com", "admin").await;
        let (farmer, _) = signup(&app, "amina@example.com", "farmer").await;

        let resp = send_raw(&app, "GET", "/admin", Some(&admin), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("AgriLog Admin"));

        let resp = send_raw(&app, "GET", "/admin", Some(&farmer), None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
