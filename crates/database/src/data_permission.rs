//! Farmer-initiated sharing grants.

use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{DataPermission, DataRange, PermissionType, ShareTarget};
use crate::validation::validate_email;

/// A farmer's new sharing grant.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDataPermission {
    pub shared_with_email: String,
    pub shared_with_type: ShareTarget,
    pub permission_type: PermissionType,
    pub data_range: DataRange,
}

/// Record a grant from `user_id` to an external party.
pub async fn grant(
    pool: &SqlitePool,
    user_id: &str,
    new: &NewDataPermission,
) -> Result<DataPermission> {
    let email = new.shared_with_email.trim().to_lowercase();
    validate_email(&email)?;

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO data_permissions
            (id, user_id, shared_with_email, shared_with_type, permission_type, data_range)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&email)
    .bind(new.shared_with_type)
    .bind(new.permission_type)
    .bind(new.data_range)
    .execute(pool)
    .await?;

    tracing::info!(permission_id = %id, user_id = %user_id, "Data permission granted");

    sqlx::query_as::<_, DataPermission>(
        r#"
        SELECT id, user_id, shared_with_email, shared_with_type, permission_type,
               data_range, is_active, created_at
        FROM data_permissions
        WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_one(pool)
    .await
    .map_err(Into::into)
}

/// List a farmer's grants, newest first. Revoked grants are included.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<DataPermission>> {
    let rows = sqlx::query_as::<_, DataPermission>(
        r#"
        SELECT id, user_id, shared_with_email, shared_with_type, permission_type,
               data_range, is_active, created_at
        FROM data_permissions
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deactivate one of the farmer's grants. The row is kept for history.
pub async fn revoke(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE data_permissions
        SET is_active = 0
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "DataPermission",
            id: id.to_string(),
        });
    }

    Ok(())
}
