//! Institution access requests.
//!
//! A request moves `pending → approved | rejected`, and an approved request
//! moves to `expired` when revoked or when `expires_at` passes. Expiry is
//! also applied at read time: an approved row past `expires_at` never counts
//! as an active grant, even before the sweep rewrites its status.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{AccessRequest, AccessType, RequestStatus};
use crate::validation::{validate_duration_days, validate_text_length, MAX_NOTES_LENGTH};

const REQUEST_COLUMNS: &str = "id, institution_id, farmer_id, request_reason, access_type, \
    duration_days, status, expires_at, created_at, updated_at";

/// An institution's new request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccessRequest {
    pub institution_id: String,
    pub farmer_id: String,
    #[serde(default)]
    pub request_reason: String,
    pub access_type: AccessType,
    pub duration_days: i64,
}

/// Create a request in `pending` status.
pub async fn create_request(pool: &SqlitePool, new: &NewAccessRequest) -> Result<AccessRequest> {
    validate_duration_days(new.duration_days)?;
    validate_text_length("request_reason", &new.request_reason, MAX_NOTES_LENGTH)?;

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO access_requests
            (id, institution_id, farmer_id, request_reason, access_type, duration_days, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(&id)
    .bind(&new.institution_id)
    .bind(&new.farmer_id)
    .bind(new.request_reason.trim())
    .bind(new.access_type)
    .bind(new.duration_days)
    .execute(pool)
    .await?;

    tracing::info!(
        request_id = %id,
        institution = %new.institution_id,
        farmer = %new.farmer_id,
        access_type = new.access_type.as_str(),
        "Access request created"
    );

    get_request(pool, &id).await
}

/// Get a request by ID.
pub async fn get_request(pool: &SqlitePool, id: &str) -> Result<AccessRequest> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM access_requests WHERE id = ?");
    sqlx::query_as::<_, AccessRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "AccessRequest",
            id: id.to_string(),
        })
}

/// List an institution's requests, newest first.
pub async fn list_for_institution(
    pool: &SqlitePool,
    institution_id: &str,
    status: Option<RequestStatus>,
) -> Result<Vec<AccessRequest>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM access_requests \
         WHERE institution_id = ?1 AND (?2 IS NULL OR status = ?2) \
         ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, AccessRequest>(&sql)
        .bind(institution_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// List requests addressed to a farmer, newest first.
pub async fn list_for_farmer(
    pool: &SqlitePool,
    farmer_id: &str,
    status: Option<RequestStatus>,
) -> Result<Vec<AccessRequest>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM access_requests \
         WHERE farmer_id = ?1 AND (?2 IS NULL OR status = ?2) \
         ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, AccessRequest>(&sql)
        .bind(farmer_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// List every request, newest first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<AccessRequest>> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM access_requests ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, AccessRequest>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Approve or reject a pending request addressed to `farmer_id`.
///
/// Approval starts the access window: `expires_at = now + duration_days`.
pub async fn respond(
    pool: &SqlitePool,
    id: &str,
    farmer_id: &str,
    approve: bool,
) -> Result<AccessRequest> {
    let result = if approve {
        sqlx::query(
            r#"
            UPDATE access_requests
            SET status = 'approved',
                expires_at = datetime('now', duration_days || ' days'),
                updated_at = datetime('now')
            WHERE id = ? AND farmer_id = ? AND status = 'pending'
            "#,
        )
    } else {
        sqlx::query(
            r#"
            UPDATE access_requests
            SET status = 'rejected', updated_at = datetime('now')
            WHERE id = ? AND farmer_id = ? AND status = 'pending'
            "#,
        )
    }
    .bind(id)
    .bind(farmer_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_error(pool, id, |r| r.farmer_id == farmer_id, "pending").await);
    }

    tracing::info!(request_id = %id, approve, "Access request answered");
    get_request(pool, id).await
}

/// End an approved request early. Either party may revoke.
pub async fn revoke(pool: &SqlitePool, id: &str, party_id: &str) -> Result<AccessRequest> {
    let result = sqlx::query(
        r#"
        UPDATE access_requests
        SET status = 'expired', updated_at = datetime('now')
        WHERE id = ?1 AND (farmer_id = ?2 OR institution_id = ?2) AND status = 'approved'
        "#,
    )
    .bind(id)
    .bind(party_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_error(
            pool,
            id,
            |r| r.farmer_id == party_id || r.institution_id == party_id,
            "approved",
        )
        .await);
    }

    tracing::info!(request_id = %id, by = %party_id, "Access revoked");
    get_request(pool, id).await
}

async fn transition_error(
    pool: &SqlitePool,
    id: &str,
    is_party: impl Fn(&AccessRequest) -> bool,
    expected: &'static str,
) -> DatabaseError {
    match get_request(pool, id).await {
        Ok(request) if is_party(&request) => DatabaseError::InvalidTransition {
            entity: "AccessRequest",
            id: id.to_string(),
            current: request.status.as_str().to_string(),
            expected,
        },
        Ok(_) => DatabaseError::NotFound {
            entity: "AccessRequest",
            id: id.to_string(),
        },
        Err(err) => err,
    }
}

/// Mark every approved request past its window as expired.
pub async fn expire_overdue(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE access_requests
        SET status = 'expired', updated_at = datetime('now')
        WHERE status = 'approved' AND expires_at IS NOT NULL AND expires_at <= datetime('now')
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// The institution's current grant over a farmer, if any.
pub async fn active_grant(
    pool: &SqlitePool,
    institution_id: &str,
    farmer_id: &str,
) -> Result<Option<AccessRequest>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM access_requests \
         WHERE institution_id = ? AND farmer_id = ? AND status = 'approved' \
           AND (expires_at IS NULL OR expires_at > datetime('now')) \
         ORDER BY expires_at DESC LIMIT 1"
    );
    let grant = sqlx::query_as::<_, AccessRequest>(&sql)
        .bind(institution_id)
        .bind(farmer_id)
        .fetch_optional(pool)
        .await?;

    Ok(grant)
}

/// Active grants held by an institution, one per farmer.
///
/// The latest-expiring grant wins; equal expiries fall back to the larger ID.
pub async fn active_grants(pool: &SqlitePool, institution_id: &str) -> Result<Vec<AccessRequest>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM access_requests a \
         WHERE institution_id = ?1 AND status = 'approved' \
           AND (expires_at IS NULL OR expires_at > datetime('now')) \
           AND NOT EXISTS ( \
               SELECT 1 FROM access_requests b \
               WHERE b.institution_id = a.institution_id AND b.farmer_id = a.farmer_id \
                 AND b.status = 'approved' \
                 AND (b.expires_at > a.expires_at \
                      OR (b.expires_at = a.expires_at AND b.id > a.id))) \
         ORDER BY expires_at"
    );
    let rows = sqlx::query_as::<_, AccessRequest>(&sql)
        .bind(institution_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Farmers the institution currently holds a grant over.
pub async fn approved_farmer_ids(pool: &SqlitePool, institution_id: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT farmer_id
        FROM access_requests
        WHERE institution_id = ? AND status = 'approved'
          AND (expires_at IS NULL OR expires_at > datetime('now'))
        "#,
    )
    .bind(institution_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Farmers the institution reaches through an active grant of one of
/// `access_types`. Each farmer appears once.
pub async fn farmers_with_access(
    pool: &SqlitePool,
    institution_id: &str,
    access_types: &[AccessType],
) -> Result<Vec<String>> {
    if access_types.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT DISTINCT farmer_id FROM access_requests WHERE institution_id = ",
    );
    qb.push_bind(institution_id.to_string());
    qb.push(
        " AND status = 'approved' \
          AND (expires_at IS NULL OR expires_at > datetime('now')) \
          AND access_type IN (",
    );
    let mut separated = qb.separated(", ");
    for access_type in access_types {
        separated.push_bind(*access_type);
    }
    separated.push_unseparated(") ORDER BY farmer_id");

    let ids = qb.build_query_scalar::<String>().fetch_all(pool).await?;
    Ok(ids)
}

/// Count requests grouped by status, optionally for one institution.
pub async fn count_by_status(
    pool: &SqlitePool,
    institution_id: Option<&str>,
) -> Result<Vec<(RequestStatus, i64)>> {
    let rows = sqlx::query_as::<_, (RequestStatus, i64)>(
        r#"
        SELECT status, COUNT(*)
        FROM access_requests
        WHERE ?1 IS NULL OR institution_id = ?1
        GROUP BY status
        "#,
    )
    .bind(institution_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
