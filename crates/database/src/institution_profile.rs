//! Organization metadata for institution and admin users.

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{AdminProfile, InstitutionProfile};
use crate::validation::validate_full_name;

/// Institution details an institution user may set.
#[derive(Debug, Clone, Deserialize)]
pub struct InstitutionProfileInput {
    pub organization_name: String,
    pub institution_type: String,
    #[serde(default)]
    pub country_region: Option<String>,
    pub representative_name: String,
    #[serde(default)]
    pub position_role: Option<String>,
}

/// Get an institution's profile.
pub async fn get_institution(pool: &SqlitePool, user_id: &str) -> Result<InstitutionProfile> {
    sqlx::query_as::<_, InstitutionProfile>(
        r#"
        SELECT user_id, organization_name, institution_type, country_region,
               representative_name, position_role, updated_at
        FROM institution_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "InstitutionProfile",
        id: user_id.to_string(),
    })
}

/// Create or replace an institution's profile.
pub async fn upsert_institution(
    pool: &SqlitePool,
    user_id: &str,
    input: &InstitutionProfileInput,
) -> Result<InstitutionProfile> {
    validate_full_name(&input.representative_name)?;
    if input.organization_name.trim().is_empty() {
        return Err(
            crate::validation::ValidationError::Empty("organization_name".to_string()).into(),
        );
    }

    sqlx::query(
        r#"
        INSERT INTO institution_profiles
            (user_id, organization_name, institution_type, country_region,
             representative_name, position_role)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            organization_name = excluded.organization_name,
            institution_type = excluded.institution_type,
            country_region = excluded.country_region,
            representative_name = excluded.representative_name,
            position_role = excluded.position_role,
            updated_at = datetime('now')
        "#,
    )
    .bind(user_id)
    .bind(input.organization_name.trim())
    .bind(input.institution_type.trim())
    .bind(&input.country_region)
    .bind(input.representative_name.trim())
    .bind(&input.position_role)
    .execute(pool)
    .await?;

    get_institution(pool, user_id).await
}

/// List every institution profile by organization name.
pub async fn list_institutions(pool: &SqlitePool) -> Result<Vec<InstitutionProfile>> {
    let rows = sqlx::query_as::<_, InstitutionProfile>(
        r#"
        SELECT user_id, organization_name, institution_type, country_region,
               representative_name, position_role, updated_at
        FROM institution_profiles
        ORDER BY organization_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get an admin's profile.
pub async fn get_admin(pool: &SqlitePool, user_id: &str) -> Result<AdminProfile> {
    sqlx::query_as::<_, AdminProfile>(
        r#"
        SELECT user_id, role_level, organization, updated_at
        FROM admin_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "AdminProfile",
        id: user_id.to_string(),
    })
}

/// Create or replace an admin's profile.
pub async fn upsert_admin(
    pool: &SqlitePool,
    user_id: &str,
    role_level: &str,
    organization: Option<&str>,
) -> Result<AdminProfile> {
    sqlx::query(
        r#"
        INSERT INTO admin_profiles (user_id, role_level, organization)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            role_level = excluded.role_level,
            organization = excluded.organization,
            updated_at = datetime('now')
        "#,
    )
    .bind(user_id)
    .bind(role_level)
    .bind(organization)
    .execute(pool)
    .await?;

    get_admin(pool, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::create_account;
    use crate::account::tests::{new_account, test_db};
    use crate::models::Role;

    #[tokio::test]
    async fn test_institution_upsert_replaces() {
        let db = test_db().await;
        let inst = create_account(
            db.pool(),
            &new_account("coop@example.com", "Lake Coop", Role::Institution),
        )
        .await
        .unwrap();

        // Signup without details falls back to the display name.
        let initial = get_institution(db.pool(), &inst.id).await.unwrap();
        assert_eq!(initial.organization_name, "Lake Coop");

        let input = InstitutionProfileInput {
            organization_name: "Lake Victoria Cooperative".to_string(),
            institution_type: "cooperative".to_string(),
            country_region: Some("Kenya".to_string()),
            representative_name: "Otieno".to_string(),
            position_role: None,
        };
        let updated = upsert_institution(db.pool(), &inst.id, &input).await.unwrap();
        assert_eq!(updated.organization_name, "Lake Victoria Cooperative");
        assert_eq!(updated.country_region.as_deref(), Some("Kenya"));

        assert_eq!(list_institutions(db.pool()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_profile() {
        let db = test_db().await;
        let admin = create_account(db.pool(), &new_account("root@example.com", "Root", Role::Admin))
            .await
            .unwrap();

        let profile = get_admin(db.pool(), &admin.id).await.unwrap();
        assert_eq!(profile.role_level, "standard");

        let profile = upsert_admin(db.pool(), &admin.id, "super", Some("AgriLog"))
            .await
            .unwrap();
        assert_eq!(profile.role_level, "super");
        assert_eq!(profile.organization.as_deref(), Some("AgriLog"));
    }

    #[tokio::test]
    async fn test_farmer_has_no_institution_profile() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();
        assert!(matches!(
            get_institution(db.pool(), &farmer.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
