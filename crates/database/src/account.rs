//! Account creation and lookup.
//!
//! Signup writes the account, its profile, its role and any role-specific
//! profile in one transaction so a half-registered user never exists.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Account, Role};
use crate::validation::{validate_email, validate_full_name, validate_phone};

/// Institution details captured at signup.
#[derive(Debug, Clone, Default)]
pub struct NewInstitutionProfile {
    pub organization_name: String,
    pub institution_type: String,
    pub country_region: Option<String>,
    pub representative_name: String,
    pub position_role: Option<String>,
}

/// Everything needed to register a user.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub village_location: Option<String>,
    pub preferred_language: Option<String>,
    pub role: Role,
    pub institution: Option<NewInstitutionProfile>,
    pub admin_organization: Option<String>,
}

/// Register a new user and return the account.
pub async fn create_account(pool: &SqlitePool, new: &NewAccount) -> Result<Account> {
    let email = new.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_full_name(&new.full_name)?;
    if let Some(phone) = new.phone_number.as_deref() {
        validate_phone(phone)?;
    }

    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&email)
    .bind(&new.password_hash)
    .execute(&mut *tx)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Account", &email))?;

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, full_name, phone_number, village_location, preferred_language)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.full_name.trim())
    .bind(&new.phone_number)
    .bind(&new.village_location)
    .bind(new.preferred_language.as_deref().unwrap_or("en"))
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role)
        VALUES (?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.role)
    .execute(&mut *tx)
    .await?;

    match new.role {
        Role::Institution => {
            let inst = new.institution.clone().unwrap_or_else(|| NewInstitutionProfile {
                organization_name: new.full_name.clone(),
                institution_type: "other".to_string(),
                representative_name: new.full_name.clone(),
                ..Default::default()
            });
            sqlx::query(
                r#"
                INSERT INTO institution_profiles
                    (user_id, organization_name, institution_type, country_region,
                     representative_name, position_role)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&inst.organization_name)
            .bind(&inst.institution_type)
            .bind(&inst.country_region)
            .bind(&inst.representative_name)
            .bind(&inst.position_role)
            .execute(&mut *tx)
            .await?;
        }
        Role::Admin => {
            sqlx::query(
                r#"
                INSERT INTO admin_profiles (user_id, organization)
                VALUES (?, ?)
                "#,
            )
            .bind(&id)
            .bind(&new.admin_organization)
            .execute(&mut *tx)
            .await?;
        }
        Role::Farmer | Role::Enumerator => {}
    }

    tx.commit().await?;

    tracing::info!(user_id = %id, role = new.role.as_str(), "Account created");

    get_account(pool, &id).await
}

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: &str) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Account",
        id: id.to_string(),
    })
}

/// Get an account by email (case-insensitive).
pub async fn get_account_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM accounts
        WHERE email = ?
        "#,
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Delete an account and everything that cascades from it.
pub async fn delete_account(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}
