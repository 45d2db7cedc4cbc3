//! Role lookups and user listings.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Role, UserSummary};

/// Get the role of a user.
pub async fn get_role(pool: &SqlitePool, user_id: &str) -> Result<Role> {
    sqlx::query_scalar::<_, Role>(
        r#"
        SELECT role
        FROM user_roles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "UserRole",
        id: user_id.to_string(),
    })
}

/// List every user with their role, optionally filtered by name.
pub async fn list_users_with_roles(
    pool: &SqlitePool,
    search: Option<&str>,
) -> Result<Vec<UserSummary>> {
    let pattern = format!("%{}%", search.unwrap_or("").trim());

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT p.user_id, p.full_name, a.email, p.village_location, r.role, a.created_at
        FROM profiles p
        JOIN accounts a ON a.id = p.user_id
        JOIN user_roles r ON r.user_id = p.user_id
        WHERE p.full_name LIKE ?
        ORDER BY p.full_name
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// List the IDs of all users holding a role.
pub async fn list_user_ids_by_role(pool: &SqlitePool, role: Role) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT user_id
        FROM user_roles
        WHERE role = ?
        "#,
    )
    .bind(role)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Count users grouped by role.
pub async fn count_users_by_role(pool: &SqlitePool) -> Result<Vec<(Role, i64)>> {
    let rows = sqlx::query_as::<_, (Role, i64)>(
        r#"
        SELECT role, COUNT(*) as count
        FROM user_roles
        GROUP BY role
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
