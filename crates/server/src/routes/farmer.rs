//! Farmer routes: own records, fields, sharing and incoming access requests.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::access_request;
use database::data_permission::{self, NewDataPermission};
use database::farm_activity::{self, ActivityFilter, ActivityStats, ActivityUpdate, NewActivity};
use database::models::{
    AccessRequest, DataPermission, FarmActivity, Field, Profile, Role, VerificationStatus,
};
use database::profile::{self, ProfileUpdate};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::routes::ai::fill_summary;
use crate::routes::auth::optional;
use crate::routes::StatusQuery;
use crate::state::AppState;

/// Season summary for the farmer dashboard.
#[derive(Debug, Serialize)]
pub struct SeasonSummary {
    #[serde(flatten)]
    pub stats: ActivityStats,
    pub crops: Vec<String>,
    pub pending_sync: i64,
    pub pending_review: usize,
}

#[derive(Debug, Deserialize)]
pub struct NewFieldRequest {
    pub name: String,
}

/// An access request with the asking organization's name.
#[derive(Debug, Serialize)]
pub struct IncomingRequest {
    #[serde(flatten)]
    pub request: AccessRequest,
    pub organization_name: Option<String>,
    pub institution_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub approve: bool,
}

pub async fn list_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<Vec<FarmActivity>>> {
    auth.require(Role::Farmer)?;
    let activities =
        farm_activity::list_activities_for_user(state.db.pool(), &auth.user_id, &filter).await?;
    Ok(Json(activities))
}

/// Log an activity. A missing summary is generated before the insert.
pub async fn create_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut new): Json<NewActivity>,
) -> Result<(StatusCode, Json<FarmActivity>)> {
    auth.require(Role::Farmer)?;
    new.user_id = auth.user_id.clone();
    new.collected_by = None;
    fill_summary(&state, &mut new).await;

    let activity = farm_activity::create_activity(state.db.pool(), &new).await?;
    state
        .audit(
            Some(&auth.user_id),
            "create",
            "farm_activity",
            Some(&activity.id),
            Some(activity.activity_type.as_str()),
        )
        .await;

    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn update_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<ActivityUpdate>,
) -> Result<Json<FarmActivity>> {
    auth.require(Role::Farmer)?;
    let activity =
        farm_activity::update_activity(state.db.pool(), &id, &auth.user_id, &update).await?;
    state
        .audit(Some(&auth.user_id), "update", "farm_activity", Some(&id), None)
        .await;
    Ok(Json(activity))
}

/// Accept a record an extension worker logged for this farmer.
pub async fn accept_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FarmActivity>> {
    auth.require(Role::Farmer)?;
    let activity = farm_activity::accept_activity(state.db.pool(), &id, &auth.user_id).await?;
    state
        .audit(Some(&auth.user_id), "accept", "farm_activity", Some(&id), None)
        .await;
    Ok(Json(activity))
}

pub async fn summary(State(state): State<AppState>, auth: AuthUser) -> Result<Json<SeasonSummary>> {
    auth.require(Role::Farmer)?;
    let pool = state.db.pool();
    let owner = [auth.user_id.clone()];

    let stats = farm_activity::activity_stats(pool, &owner).await?;
    let crops = farm_activity::list_distinct_crops(pool, &auth.user_id).await?;
    let pending_sync = farm_activity::count_pending_sync(pool, &auth.user_id).await?;
    let pending_review = farm_activity::list_activities_for_user(pool, &auth.user_id, &ActivityFilter::default())
        .await?
        .iter()
        .filter(|a| a.verification_status == VerificationStatus::Pending)
        .count();

    Ok(Json(SeasonSummary {
        stats,
        crops,
        pending_sync,
        pending_review,
    }))
}

pub async fn list_fields(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<Field>>> {
    auth.require(Role::Farmer)?;
    let fields = database::field::list_fields(state.db.pool(), &auth.user_id).await?;
    Ok(Json(fields))
}

pub async fn create_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewFieldRequest>,
) -> Result<(StatusCode, Json<Field>)> {
    auth.require(Role::Farmer)?;
    let field = database::field::create_field(state.db.pool(), &auth.user_id, &req.name).await?;
    state
        .audit(Some(&auth.user_id), "create", "field", Some(&field.id), Some(&field.name))
        .await;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<DataPermission>>> {
    auth.require(Role::Farmer)?;
    let permissions = data_permission::list_for_user(state.db.pool(), &auth.user_id).await?;
    Ok(Json(permissions))
}

pub async fn grant_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(new): Json<NewDataPermission>,
) -> Result<(StatusCode, Json<DataPermission>)> {
    auth.require(Role::Farmer)?;
    let permission = data_permission::grant(state.db.pool(), &auth.user_id, &new).await?;
    state
        .audit(
            Some(&auth.user_id),
            "grant",
            "data_permission",
            Some(&permission.id),
            Some(&permission.shared_with_email),
        )
        .await;
    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn revoke_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    auth.require(Role::Farmer)?;
    data_permission::revoke(state.db.pool(), &id, &auth.user_id).await?;
    state
        .audit(Some(&auth.user_id), "revoke", "data_permission", Some(&id), None)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Requests addressed to this farmer, with organization names.
pub async fn list_access_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<IncomingRequest>>> {
    auth.require(Role::Farmer)?;
    let pool = state.db.pool();
    let requests = access_request::list_for_farmer(pool, &auth.user_id, query.parse()?).await?;

    let mut out = Vec::with_capacity(requests.len());
    for request in requests {
        let institution = optional(
            database::institution_profile::get_institution(pool, &request.institution_id).await,
        )?;
        out.push(IncomingRequest {
            organization_name: institution.as_ref().map(|i| i.organization_name.clone()),
            institution_type: institution.map(|i| i.institution_type),
            request,
        });
    }

    Ok(Json(out))
}

/// Approve or reject a pending request.
pub async fn respond_access_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<AccessRequest>> {
    auth.require(Role::Farmer)?;
    let request = access_request::respond(state.db.pool(), &id, &auth.user_id, req.approve).await?;
    let action = if req.approve { "approve" } else { "reject" };
    state
        .audit(Some(&auth.user_id), action, "access_request", Some(&id), None)
        .await;
    Ok(Json(request))
}

pub async fn revoke_access_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AccessRequest>> {
    auth.require(Role::Farmer)?;
    let request = access_request::revoke(state.db.pool(), &id, &auth.user_id).await?;
    state
        .audit(Some(&auth.user_id), "revoke", "access_request", Some(&id), None)
        .await;
    Ok(Json(request))
}

pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Profile>> {
    auth.require(Role::Farmer)?;
    Ok(Json(profile::get_profile(state.db.pool(), &auth.user_id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    auth.require(Role::Farmer)?;
    let profile = profile::update_profile(state.db.pool(), &auth.user_id, &update).await?;
    state
        .audit(Some(&auth.user_id), "update", "profile", Some(&auth.user_id), None)
        .await;
    Ok(Json(profile))
}
