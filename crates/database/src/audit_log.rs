//! Append-only audit trail.

use sqlx::SqlitePool;

use crate::models::AuditLog;
use crate::Result;

/// Default number of rows returned by [`list_recent`].
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;

/// Append an audit record.
pub async fn record(
    pool: &SqlitePool,
    actor_id: Option<&str>,
    action: &str,
    entity: &str,
    entity_id: Option<&str>,
    details: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (actor_id, action, entity, entity_id, details)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor_id)
    .bind(action)
    .bind(entity)
    .bind(entity_id)
    .bind(details)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent audit records, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: Option<i64>) -> Result<Vec<AuditLog>> {
    let rows = sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT id, actor_id, action, entity, entity_id, details, created_at
        FROM audit_logs
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::tests::test_db;

    #[tokio::test]
    async fn test_newest_first_with_limit() {
        let db = test_db().await;

        for i in 0..3 {
            let id = format!("act-{i}");
            record(db.pool(), Some("user-1"), "create", "farm_activity", Some(&id), None)
                .await
                .unwrap();
        }
        record(db.pool(), None, "expire", "access_request", None, Some("2 expired"))
            .await
            .unwrap();

        let all = list_recent(db.pool(), None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].action, "expire");
        assert!(all[0].actor_id.is_none());

        let two = list_recent(db.pool(), Some(2)).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two[1].entity_id.as_deref(), Some("act-2"));
    }
}
