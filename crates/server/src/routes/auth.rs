//! Signup, login, logout and the current-user view.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use database::account::{self, NewAccount, NewInstitutionProfile};
use database::models::{AdminProfile, InstitutionProfile, Profile, Role};
use database::validation::validate_password;
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, hash_token, new_token, verify_password, AuthUser, SESSION_COOKIE};
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Signup form. Institution and admin fields are read only for those roles.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub village_location: Option<String>,
    #[serde(default)]
    pub preferred_language: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub institution_type: Option<String>,
    #[serde(default)]
    pub country_region: Option<String>,
    #[serde(default)]
    pub representative_name: Option<String>,
    #[serde(default)]
    pub position_role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by signup and login. The token is shown once.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub dashboard: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub dashboard: &'static str,
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<InstitutionProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminProfile>,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

async fn open_session(state: &AppState, user_id: String, role: Role) -> Result<Response> {
    let token = new_token();
    database::session::create_session(
        state.db.pool(),
        &user_id,
        &hash_token(&token),
        state.session_ttl_hours,
    )
    .await?;

    let cookie = session_cookie(&token, state.session_ttl_hours * 3600);
    let body = SessionResponse {
        token,
        user_id,
        role,
        dashboard: role.dashboard_path(),
    };

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(body)).into_response())
}

/// Register a user and sign them in.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response> {
    let role = Role::parse(&req.role)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown role: {}", req.role)))?;
    validate_password(&req.password)?;

    let institution = (role == Role::Institution).then(|| NewInstitutionProfile {
        organization_name: req
            .organization_name
            .clone()
            .unwrap_or_else(|| req.full_name.clone()),
        institution_type: req
            .institution_type
            .clone()
            .unwrap_or_else(|| "other".to_string()),
        country_region: req.country_region.clone(),
        representative_name: req
            .representative_name
            .clone()
            .unwrap_or_else(|| req.full_name.clone()),
        position_role: req.position_role.clone(),
    });

    let new = NewAccount {
        email: req.email,
        password_hash: hash_password(&req.password)?,
        full_name: req.full_name,
        phone_number: req.phone_number,
        village_location: req.village_location,
        preferred_language: req.preferred_language,
        role,
        institution,
        admin_organization: req.organization_name.filter(|_| role == Role::Admin),
    };
    let account = account::create_account(state.db.pool(), &new).await?;

    state
        .audit(Some(&account.id), "signup", "account", Some(&account.id), Some(role.as_str()))
        .await;

    open_session(&state, account.id, role).await
}

/// Exchange credentials for a session.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let email = req.email.trim().to_lowercase();
    let account = account::get_account_by_email(state.db.pool(), &email)
        .await?
        .filter(|a| verify_password(&req.password, &a.password_hash))
        .ok_or_else(|| {
            info!(email = %email, "Failed login");
            ApiError::Unauthorized
        })?;

    let role = database::user_role::get_role(state.db.pool(), &account.id).await?;
    state
        .audit(Some(&account.id), "login", "session", None, None)
        .await;

    open_session(&state, account.id, role).await
}

/// End the presented session and clear the cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<Response> {
    database::session::delete_session(state.db.pool(), &auth.token_hash).await?;
    state
        .audit(Some(&auth.user_id), "logout", "session", None, None)
        .await;

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, session_cookie("", 0))]),
    )
        .into_response())
}

/// The caller's identity, profile and dashboard path.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<MeResponse>> {
    let pool = state.db.pool();
    let account = account::get_account(pool, &auth.user_id).await?;
    let profile = database::profile::get_profile(pool, &auth.user_id).await?;

    let institution = match auth.role {
        Role::Institution => optional(
            database::institution_profile::get_institution(pool, &auth.user_id).await,
        )?,
        _ => None,
    };
    let admin = match auth.role {
        Role::Admin => optional(database::institution_profile::get_admin(pool, &auth.user_id).await)?,
        _ => None,
    };

    Ok(Json(MeResponse {
        user_id: auth.user_id,
        email: account.email,
        role: auth.role,
        dashboard: auth.role.dashboard_path(),
        profile,
        institution,
        admin,
    }))
}

/// Turn `NotFound` into `None`.
pub(crate) fn optional<T>(result: database::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DatabaseError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
