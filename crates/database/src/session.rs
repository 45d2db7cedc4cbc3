//! Bearer session storage.
//!
//! Only the hash of a token is stored; the caller hashes before every call.

use sqlx::SqlitePool;

use crate::Result;

/// Store a session valid for `ttl_hours`.
pub async fn create_session(
    pool: &SqlitePool,
    user_id: &str,
    token_hash: &str,
    ttl_hours: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, user_id, expires_at)
        VALUES (?, ?, datetime('now', ? || ' hours'))
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(ttl_hours)
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolve a token hash to its user, ignoring expired sessions.
pub async fn find_session_user(pool: &SqlitePool, token_hash: &str) -> Result<Option<String>> {
    let user_id = sqlx::query_scalar::<_, String>(
        r#"
        SELECT user_id
        FROM sessions
        WHERE token_hash = ? AND expires_at > datetime('now')
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(user_id)
}

/// Delete a session. Returns true if one existed.
pub async fn delete_session(pool: &SqlitePool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove every expired session, returning how many were dropped.
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions
        WHERE expires_at <= datetime('now')
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::tests::{new_account, test_db};
    use crate::account::create_account;
    use crate::models::Role;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = test_db().await;
        let account = create_account(db.pool(), &new_account("a@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        create_session(db.pool(), &account.id, "hash-1", 24).await.unwrap();
        let user = find_session_user(db.pool(), "hash-1").await.unwrap();
        assert_eq!(user.as_deref(), Some(account.id.as_str()));

        assert!(delete_session(db.pool(), "hash-1").await.unwrap());
        assert!(find_session_user(db.pool(), "hash-1").await.unwrap().is_none());
        assert!(!delete_session(db.pool(), "hash-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_sessions_ignored_and_purged() {
        let db = test_db().await;
        let account = create_account(db.pool(), &new_account("a@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        create_session(db.pool(), &account.id, "stale", -1).await.unwrap();
        create_session(db.pool(), &account.id, "fresh", 1).await.unwrap();

        assert!(find_session_user(db.pool(), "stale").await.unwrap().is_none());
        assert_eq!(purge_expired_sessions(db.pool()).await.unwrap(), 1);
        assert!(find_session_user(db.pool(), "fresh").await.unwrap().is_some());
    }
}
