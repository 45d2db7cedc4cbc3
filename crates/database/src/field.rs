//! Farmer-owned plots.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::Field;
use crate::validation::{validate_text_length, ValidationError};

const MAX_FIELD_NAME_LENGTH: usize = 100;

/// Create a named field for a farmer.
pub async fn create_field(pool: &SqlitePool, user_id: &str, name: &str) -> Result<Field> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty("name".to_string()).into());
    }
    validate_text_length("name", name, MAX_FIELD_NAME_LENGTH)?;

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO fields (id, user_id, name)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(name)
    .execute(pool)
    .await?;

    get_field(pool, user_id, &id).await
}

/// Get one of a farmer's fields. Another farmer's field is `NotFound`.
pub async fn get_field(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Field> {
    sqlx::query_as::<_, Field>(
        r#"
        SELECT id, user_id, name, created_at
        FROM fields
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Field",
        id: id.to_string(),
    })
}

/// List a farmer's fields by name.
pub async fn list_fields(pool: &SqlitePool, user_id: &str) -> Result<Vec<Field>> {
    let fields = sqlx::query_as::<_, Field>(
        r#"
        SELECT id, user_id, name, created_at
        FROM fields
        WHERE user_id = ?
        ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(fields)
}
