//! Institution routes: farmer search, access requests and grant-gated data.
//!
//! Reads of farmer data go through the institution's active grants. A grant
//! past its `expires_at` is ignored here even if the sweep has not run yet.

use std::collections::{BTreeMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::access_request::{self, NewAccessRequest};
use database::farm_activity::{self, ActivityFilter, ActivityStats, FarmerOverview};
use database::institution_profile::{self, InstitutionProfileInput};
use database::models::{AccessRequest, AccessType, FarmActivity, InstitutionProfile, Profile, Role};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::csv::activities_to_csv;
use crate::error::{ApiError, Result};
use crate::routes::{ensure_farmer, StatusQuery};
use crate::state::AppState;

/// Upper bound on rows in one export.
const MAX_EXPORT_ROWS: i64 = 10_000;

const ACCESS_LEVELS: [AccessType; 3] = [
    AccessType::View,
    AccessType::ViewDownload,
    AccessType::ViewDownloadAnalytics,
];

#[derive(Debug, Default, Deserialize)]
pub struct FarmerSearch {
    pub q: Option<String>,
    #[serde(default)]
    pub verified_only: bool,
}

#[derive(Debug, Serialize)]
pub struct FarmerSearchResult {
    #[serde(flatten)]
    pub farmer: FarmerOverview,
    pub has_access: bool,
}

#[derive(Debug, Deserialize)]
pub struct AccessRequestBody {
    pub farmer_id: String,
    #[serde(default)]
    pub request_reason: String,
    pub access_type: AccessType,
    /// Defaults to the `default_access_days` setting.
    pub duration_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ApprovedFarmer {
    #[serde(flatten)]
    pub grant: AccessRequest,
    pub full_name: String,
    pub village_location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FarmerRecords {
    pub grant: AccessRequest,
    pub profile: Profile,
    pub stats: ActivityStats,
    pub activities: Vec<FarmActivity>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub farmer_count: usize,
    #[serde(flatten)]
    pub stats: ActivityStats,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub format: Option<String>,
    pub farmer_id: Option<String>,
    pub crop: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InstitutionStats {
    pub requests: BTreeMap<String, i64>,
    pub active_grants: usize,
    pub accessible_records: i64,
}

/// Farmers reachable through grants whose access type passes `allowed`.
async fn granted_farmers(
    state: &AppState,
    institution_id: &str,
    allowed: impl Fn(AccessType) -> bool,
) -> Result<Vec<String>> {
    let access_types: Vec<AccessType> = ACCESS_LEVELS.into_iter().filter(|t| allowed(*t)).collect();
    Ok(access_request::farmers_with_access(state.db.pool(), institution_id, &access_types).await?)
}

/// Farmer directory with a flag for farmers this institution can read.
pub async fn search_farmers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FarmerSearch>,
) -> Result<Json<Vec<FarmerSearchResult>>> {
    auth.require(Role::Institution)?;
    let pool = state.db.pool();

    let granted: HashSet<String> = access_request::approved_farmer_ids(pool, &auth.user_id)
        .await?
        .into_iter()
        .collect();
    let farmers = farm_activity::farmer_overview(pool, query.q.as_deref()).await?;

    let results = farmers
        .into_iter()
        .filter(|f| !query.verified_only || f.verified_count > 0)
        .map(|farmer| FarmerSearchResult {
            has_access: granted.contains(&farmer.user_id),
            farmer,
        })
        .collect();

    Ok(Json(results))
}

pub async fn create_access_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AccessRequestBody>,
) -> Result<(StatusCode, Json<AccessRequest>)> {
    auth.require(Role::Institution)?;
    ensure_farmer(&state, &body.farmer_id).await?;

    let duration_days = match body.duration_days {
        Some(days) => days,
        None => database::system_setting::default_access_days(state.db.pool()).await?,
    };
    let new = NewAccessRequest {
        institution_id: auth.user_id.clone(),
        farmer_id: body.farmer_id,
        request_reason: body.request_reason,
        access_type: body.access_type,
        duration_days,
    };
    let request = access_request::create_request(state.db.pool(), &new).await?;

    state
        .audit(
            Some(&auth.user_id),
            "request",
            "access_request",
            Some(&request.id),
            Some(request.access_type.as_str()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_access_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<AccessRequest>>> {
    auth.require(Role::Institution)?;
    let requests =
        access_request::list_for_institution(state.db.pool(), &auth.user_id, query.parse()?)
            .await?;
    Ok(Json(requests))
}

pub async fn revoke_access_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AccessRequest>> {
    auth.require(Role::Institution)?;
    let request = access_request::revoke(state.db.pool(), &id, &auth.user_id).await?;
    state
        .audit(Some(&auth.user_id), "revoke", "access_request", Some(&id), None)
        .await;
    Ok(Json(request))
}

/// Active grants with the farmer's name.
pub async fn approved(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ApprovedFarmer>>> {
    auth.require(Role::Institution)?;
    let pool = state.db.pool();

    let grants = access_request::active_grants(pool, &auth.user_id).await?;
    let mut out = Vec::with_capacity(grants.len());
    for grant in grants {
        let profile = database::profile::get_profile(pool, &grant.farmer_id).await?;
        out.push(ApprovedFarmer {
            grant,
            full_name: profile.full_name,
            village_location: profile.village_location,
        });
    }

    Ok(Json(out))
}

/// One farmer's profile and records, if the institution holds a grant.
pub async fn farmer_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(farmer_id): Path<String>,
) -> Result<Json<FarmerRecords>> {
    auth.require(Role::Institution)?;
    let pool = state.db.pool();

    let grant = access_request::active_grant(pool, &auth.user_id, &farmer_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("No active access grant for this farmer"))?;

    let profile = database::profile::get_profile(pool, &farmer_id).await?;
    let stats = farm_activity::activity_stats(pool, &[farmer_id.clone()]).await?;
    let activities =
        farm_activity::list_activities_for_user(pool, &farmer_id, &ActivityFilter::default())
            .await?;

    state
        .audit(Some(&auth.user_id), "view", "farmer", Some(&farmer_id), None)
        .await;

    Ok(Json(FarmerRecords {
        grant,
        profile,
        stats,
        activities,
    }))
}

/// Aggregates across farmers granted with analytics access.
pub async fn reports(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Report>> {
    auth.require(Role::Institution)?;

    let farmers = granted_farmers(&state, &auth.user_id, |t| t.allows_analytics()).await?;
    if farmers.is_empty() {
        return Err(ApiError::forbidden("No active grant includes analytics access"));
    }
    let stats = farm_activity::activity_stats(state.db.pool(), &farmers).await?;

    Ok(Json(Report {
        farmer_count: farmers.len(),
        stats,
    }))
}

/// CSV export of records from farmers granted with download access.
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    auth.require(Role::Institution)?;

    let format = query.format.as_deref().unwrap_or("csv");
    if !format.eq_ignore_ascii_case("csv") {
        return Err(ApiError::bad_request(format!("Unsupported format: {format}")));
    }

    let mut farmers = granted_farmers(&state, &auth.user_id, |t| t.allows_download()).await?;
    if let Some(farmer_id) = query.farmer_id.as_deref() {
        farmers.retain(|f| f == farmer_id);
    }
    if farmers.is_empty() {
        return Err(ApiError::forbidden("No active grant includes download access"));
    }

    let filter = ActivityFilter {
        crop: query.crop,
        from: query.from,
        to: query.to,
        limit: Some(MAX_EXPORT_ROWS),
        ..Default::default()
    };
    let activities =
        farm_activity::list_activities_for_users(state.db.pool(), &farmers, &filter).await?;
    let body = activities_to_csv(&activities);

    state
        .audit(
            Some(&auth.user_id),
            "download",
            "farm_activity",
            None,
            Some(&format!("{} rows from {} farmer(s)", activities.len(), farmers.len())),
        )
        .await;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"agrilog-export.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<InstitutionStats>> {
    auth.require(Role::Institution)?;
    let pool = state.db.pool();

    let requests = access_request::count_by_status(pool, Some(&auth.user_id))
        .await?
        .into_iter()
        .map(|(status, count)| (status.as_str().to_string(), count))
        .collect();
    let farmers = granted_farmers(&state, &auth.user_id, |_| true).await?;
    let accessible_records = farm_activity::activity_stats(pool, &farmers).await?.total;

    Ok(Json(InstitutionStats {
        requests,
        active_grants: farmers.len(),
        accessible_records,
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<InstitutionProfile>> {
    auth.require(Role::Institution)?;
    Ok(Json(
        institution_profile::get_institution(state.db.pool(), &auth.user_id).await?,
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<InstitutionProfileInput>,
) -> Result<Json<InstitutionProfile>> {
    auth.require(Role::Institution)?;
    let profile =
        institution_profile::upsert_institution(state.db.pool(), &auth.user_id, &input).await?;
    state
        .audit(Some(&auth.user_id), "update", "institution_profile", Some(&auth.user_id), None)
        .await;
    Ok(Json(profile))
}
