//! User profile storage.

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Profile, Role};
use crate::validation::{validate_full_name, validate_phone};

/// Profile fields a user may change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub village_location: Option<String>,
    pub preferred_language: Option<String>,
}

/// Get a user's profile.
pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Profile> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT user_id, full_name, phone_number, village_location, preferred_language,
               created_at, updated_at
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Profile",
        id: user_id.to_string(),
    })
}

/// Apply a partial update to a user's profile and return the result.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<Profile> {
    if let Some(name) = update.full_name.as_deref() {
        validate_full_name(name)?;
    }
    if let Some(phone) = update.phone_number.as_deref() {
        validate_phone(phone)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE profiles
        SET full_name = COALESCE(?, full_name),
            phone_number = COALESCE(?, phone_number),
            village_location = COALESCE(?, village_location),
            preferred_language = COALESCE(?, preferred_language),
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(update.full_name.as_deref().map(str::trim))
    .bind(&update.phone_number)
    .bind(&update.village_location)
    .bind(&update.preferred_language)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Profile",
            id: user_id.to_string(),
        });
    }

    get_profile(pool, user_id).await
}

/// Search profiles by name or village, optionally limited to one role.
pub async fn search_profiles(
    pool: &SqlitePool,
    query: Option<&str>,
    role: Option<Role>,
) -> Result<Vec<Profile>> {
    let pattern = format!("%{}%", query.unwrap_or("").trim());

    let profiles = sqlx::query_as::<_, Profile>(
        r#"
        SELECT p.user_id, p.full_name, p.phone_number, p.village_location,
               p.preferred_language, p.created_at, p.updated_at
        FROM profiles p
        JOIN user_roles r ON r.user_id = p.user_id
        WHERE (p.full_name LIKE ?1 OR COALESCE(p.village_location, '') LIKE ?1)
          AND (?2 IS NULL OR r.role = ?2)
        ORDER BY p.full_name
        "#,
    )
    .bind(pattern)
    .bind(role)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::create_account;
    use crate::account::tests::{new_account, test_db};

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let db = test_db().await;
        let result = get_profile(db.pool(), "missing").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = test_db().await;
        let account = create_account(db.pool(), &new_account("a@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let update = ProfileUpdate {
            phone_number: Some("+254712345678".to_string()),
            preferred_language: Some("sw".to_string()),
            ..Default::default()
        };
        let profile = update_profile(db.pool(), &account.id, &update).await.unwrap();

        assert_eq!(profile.full_name, "Amina");
        assert_eq!(profile.phone_number.as_deref(), Some("+254712345678"));
        assert_eq!(profile.preferred_language, "sw");
        assert_eq!(profile.village_location.as_deref(), Some("Kisumu"));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_phone() {
        let db = test_db().await;
        let account = create_account(db.pool(), &new_account("a@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let update = ProfileUpdate {
            phone_number: Some("123".to_string()),
            ..Default::default()
        };
        let result = update_profile(db.pool(), &account.id, &update).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_search_by_name_village_and_role() {
        let db = test_db().await;
        create_account(db.pool(), &new_account("a@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();
        let mut other = new_account("b@example.com", "Baraka", Role::Farmer);
        other.village_location = Some("Eldoret".to_string());
        create_account(db.pool(), &other).await.unwrap();
        create_account(db.pool(), &new_account("w@example.com", "Wanjiru", Role::Enumerator))
            .await
            .unwrap();

        let farmers = search_profiles(db.pool(), None, Some(Role::Farmer)).await.unwrap();
        assert_eq!(farmers.len(), 2);

        let by_village = search_profiles(db.pool(), Some("eldo"), None).await.unwrap();
        assert_eq!(by_village.len(), 1);
        assert_eq!(by_village[0].full_name, "Baraka");

        let everyone = search_profiles(db.pool(), Some(""), None).await.unwrap();
        assert_eq!(everyone.len(), 3);
    }
}
