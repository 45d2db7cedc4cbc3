//! Extension worker routes: farmer directory, verified capture and batch sync.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::farm_activity::{self, FarmerOverview, NewActivity};
use database::models::{FarmActivity, Field, Role, SyncStatus, VerificationStatus};
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::routes::ai::fill_summary;
use crate::routes::{ensure_farmer, SearchQuery};
use crate::state::AppState;

/// Appended to generated summaries of worker-collected records.
pub const VERIFIED_SOURCE_SUFFIX: &str = " — Collected by Extension Worker (Verified Source)";

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub entries: Vec<NewActivity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Synced,
    /// Already stored under the same ID.
    Duplicate,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub id: Option<String>,
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncResponse {
    pub synced: usize,
    pub duplicate: usize,
    pub failed: usize,
    pub results: Vec<SyncResult>,
}

/// Store `new` as collected by `worker_id` on behalf of `new.user_id`.
async fn record_for_farmer(
    state: &AppState,
    worker_id: &str,
    mut new: NewActivity,
) -> Result<FarmActivity> {
    if new.user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id (the farmer) is required"));
    }
    ensure_farmer(state, &new.user_id).await?;

    new.collected_by = Some(worker_id.to_string());
    if new.ai_summary.as_deref().map_or(true, |s| s.trim().is_empty()) {
        fill_summary(state, &mut new).await;
        if let Some(summary) = new.ai_summary.as_mut() {
            summary.push_str(VERIFIED_SOURCE_SUFFIX);
        }
    }
    if let Some(data) = new.ai_extracted_data.as_object_mut() {
        data.entry("collected_by")
            .or_insert_with(|| worker_id.into());
        data.entry("verification_level")
            .or_insert_with(|| "extension_worker".into());
    }

    Ok(farm_activity::create_activity(state.db.pool(), &new).await?)
}

/// Farmers with entry counts and last activity date.
pub async fn list_farmers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FarmerOverview>>> {
    auth.require(Role::Enumerator)?;
    let farmers = farm_activity::farmer_overview(state.db.pool(), query.q.as_deref()).await?;
    Ok(Json(farmers))
}

pub async fn farmer_fields(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(farmer_id): Path<String>,
) -> Result<Json<Vec<Field>>> {
    auth.require(Role::Enumerator)?;
    ensure_farmer(&state, &farmer_id).await?;
    let fields = database::field::list_fields(state.db.pool(), &farmer_id).await?;
    Ok(Json(fields))
}

/// Log a verified activity on a farmer's behalf.
pub async fn create_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(new): Json<NewActivity>,
) -> Result<(StatusCode, Json<FarmActivity>)> {
    auth.require(Role::Enumerator)?;
    let activity = record_for_farmer(&state, &auth.user_id, new).await?;
    state
        .audit(
            Some(&auth.user_id),
            "collect",
            "farm_activity",
            Some(&activity.id),
            Some(&format!("for {}", activity.user_id)),
        )
        .await;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Everything this worker has collected.
pub async fn submissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FarmActivity>>> {
    auth.require(Role::Enumerator)?;
    let activities =
        farm_activity::list_activities_collected_by(state.db.pool(), &auth.user_id, None).await?;
    Ok(Json(activities))
}

/// Collected records the farmer has not reviewed yet.
pub async fn pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FarmActivity>>> {
    auth.require(Role::Enumerator)?;
    let activities = farm_activity::list_activities_collected_by(
        state.db.pool(),
        &auth.user_id,
        Some(VerificationStatus::Pending),
    )
    .await?;
    Ok(Json(activities))
}

/// Replay queued captures in order. Each entry succeeds or fails on its own.
pub async fn sync(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    auth.require(Role::Enumerator)?;
    let mut response = SyncResponse::default();

    for mut new in req.entries {
        let id = new.id.clone();
        new.sync_status = SyncStatus::Synced;

        let (outcome, error) = match record_for_farmer(&state, &auth.user_id, new).await {
            Ok(_) => (SyncOutcome::Synced, None),
            Err(ApiError::Database(DatabaseError::AlreadyExists { id: existing, .. })) => {
                mark_own_synced(&state, &auth.user_id, &existing).await;
                (SyncOutcome::Duplicate, None)
            }
            Err(e) => {
                warn!(entry = ?id, error = %e, "Queued entry rejected");
                (SyncOutcome::Failed, Some(e.to_string()))
            }
        };

        match outcome {
            SyncOutcome::Synced => response.synced += 1,
            SyncOutcome::Duplicate => response.duplicate += 1,
            SyncOutcome::Failed => response.failed += 1,
        }
        response.results.push(SyncResult { id, outcome, error });
    }

    info!(
        worker = %auth.user_id,
        synced = response.synced,
        duplicate = response.duplicate,
        failed = response.failed,
        "Batch sync"
    );
    state
        .audit(
            Some(&auth.user_id),
            "sync",
            "farm_activity",
            None,
            Some(&format!(
                "{} synced, {} duplicate, {} failed",
                response.synced, response.duplicate, response.failed
            )),
        )
        .await;

    Ok(Json(response))
}

/// A replay of a row this worker stored earlier settles its sync flag.
async fn mark_own_synced(state: &AppState, worker_id: &str, id: &str) {
    let pool = state.db.pool();
    match farm_activity::get_activity(pool, id).await {
        Ok(existing)
            if existing.collected_by.as_deref() == Some(worker_id)
                && existing.sync_status == SyncStatus::Pending =>
        {
            if let Err(e) = farm_activity::mark_synced(pool, id).await {
                warn!(activity = %id, error = %e, "Failed to mark activity synced");
            }
        }
        Ok(_) => {}
        Err(e) => warn!(activity = %id, error = %e, "Failed to load duplicate activity"),
    }
}
