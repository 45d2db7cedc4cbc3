//! Platform-wide key/value settings.

use sqlx::SqlitePool;

use crate::models::SystemSetting;
use crate::Result;

/// Access window used when a request omits its duration.
pub const DEFAULT_ACCESS_DAYS: i64 = 30;

/// Create or update a setting.
pub async fn upsert_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO system_settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a setting by key.
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<SystemSetting>> {
    let record = sqlx::query_as::<_, SystemSetting>(
        r#"
        SELECT key, value, updated_at
        FROM system_settings
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List all settings by key.
pub async fn list_settings(pool: &SqlitePool) -> Result<Vec<SystemSetting>> {
    let rows = sqlx::query_as::<_, SystemSetting>(
        r#"
        SELECT key, value, updated_at
        FROM system_settings
        ORDER BY key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The configured default access window, falling back to 30 days when the
/// setting is missing or not a number.
pub async fn default_access_days(pool: &SqlitePool) -> Result<i64> {
    let days = get_setting(pool, "default_access_days")
        .await?
        .and_then(|s| s.value.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_ACCESS_DAYS);

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::tests::test_db;

    #[tokio::test]
    async fn test_seeded_defaults() {
        let db = test_db().await;

        let keys: Vec<_> = list_settings(db.pool())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(
            keys,
            vec!["auto_confirm_signups", "default_access_days", "require_admin_2fa"]
        );
        assert_eq!(default_access_days(db.pool()).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_upsert_and_typed_accessor() {
        let db = test_db().await;

        upsert_setting(db.pool(), "default_access_days", "90").await.unwrap();
        assert_eq!(default_access_days(db.pool()).await.unwrap(), 90);

        upsert_setting(db.pool(), "default_access_days", "soon").await.unwrap();
        assert_eq!(default_access_days(db.pool()).await.unwrap(), DEFAULT_ACCESS_DAYS);

        upsert_setting(db.pool(), "maintenance_mode", "on").await.unwrap();
        let setting = get_setting(db.pool(), "maintenance_mode").await.unwrap().unwrap();
        assert_eq!(setting.value, "on");
        assert!(get_setting(db.pool(), "missing").await.unwrap().is_none());
    }
}
