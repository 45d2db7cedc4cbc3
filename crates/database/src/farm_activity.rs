//! Farm activity records.
//!
//! Activities are owned by a farmer (`user_id`). Extension workers may log
//! them on a farmer's behalf, in which case `collected_by` is set and the
//! record waits for the farmer to accept or edit it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{ActivityType, FarmActivity, SyncStatus, VerificationStatus};
use crate::validation::{
    validate_coordinates, validate_date, validate_text_length, MAX_NOTES_LENGTH,
};

const ACTIVITY_COLUMNS: &str = "id, user_id, activity_type, activity_date, field_id, crop, notes, \
    inputs_used, yield_estimate, location_lat, location_lng, ai_summary, ai_extracted_data, \
    sync_status, collected_by, verification_status, created_at, updated_at";

/// Default page size for activity listings.
pub const DEFAULT_LIST_LIMIT: i64 = 200;

/// A new activity to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    /// Client-generated ID. Replaying the same ID is reported as `AlreadyExists`.
    #[serde(default)]
    pub id: Option<String>,
    /// Owning farmer. Route handlers overwrite this from the session.
    #[serde(default)]
    pub user_id: String,
    pub activity_type: ActivityType,
    pub activity_date: String,
    pub field_id: Option<String>,
    pub crop: Option<String>,
    pub notes: Option<String>,
    pub inputs_used: Option<String>,
    pub yield_estimate: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub ai_summary: Option<String>,
    #[serde(default = "empty_object")]
    pub ai_extracted_data: serde_json::Value,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub collected_by: Option<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl NewActivity {
    /// A bare self-reported activity; set the optional fields directly.
    pub fn new(user_id: &str, activity_type: ActivityType, activity_date: &str) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            activity_type,
            activity_date: activity_date.to_string(),
            field_id: None,
            crop: None,
            notes: None,
            inputs_used: None,
            yield_estimate: None,
            location_lat: None,
            location_lng: None,
            ai_summary: None,
            ai_extracted_data: empty_object(),
            sync_status: SyncStatus::Synced,
            collected_by: None,
        }
    }
}

/// Fields a farmer may correct on an existing record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityUpdate {
    pub activity_type: Option<ActivityType>,
    pub crop: Option<String>,
    pub notes: Option<String>,
    pub inputs_used: Option<String>,
    pub yield_estimate: Option<String>,
}

/// Listing filter. Empty fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    /// Substring over type, crop and notes.
    pub search: Option<String>,
    /// Substring over crop.
    pub crop: Option<String>,
    /// Inclusive lower date bound (`YYYY-MM-DD` or RFC 3339).
    pub from: Option<String>,
    /// Inclusive upper date bound.
    pub to: Option<String>,
    #[serde(default)]
    pub verified_only: bool,
    pub limit: Option<i64>,
}

/// Aggregated counts for a season summary or report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    pub total: i64,
    pub verified: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_crop: BTreeMap<String, i64>,
    /// Keyed by `YYYY-MM`.
    pub by_month: BTreeMap<String, i64>,
}

/// Per-farmer activity rollup used in farmer directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FarmerOverview {
    pub user_id: String,
    pub full_name: String,
    pub village_location: Option<String>,
    pub activity_count: i64,
    pub verified_count: i64,
    pub last_activity_date: Option<String>,
}

fn validate_new_activity(new: &NewActivity) -> Result<()> {
    validate_date("activity_date", &new.activity_date)?;
    if let (Some(lat), Some(lng)) = (new.location_lat, new.location_lng) {
        validate_coordinates(lat, lng)?;
    }
    if let Some(notes) = new.notes.as_deref() {
        validate_text_length("notes", notes, MAX_NOTES_LENGTH)?;
    }
    Ok(())
}

/// Insert an activity and return the stored row.
pub async fn create_activity(pool: &SqlitePool, new: &NewActivity) -> Result<FarmActivity> {
    validate_new_activity(new)?;
    if let Some(field_id) = new.field_id.as_deref() {
        crate::field::get_field(pool, &new.user_id, field_id).await?;
    }

    let id = new
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let verification = if new.collected_by.is_some() {
        VerificationStatus::Pending
    } else {
        VerificationStatus::SelfReported
    };

    sqlx::query(
        r#"
        INSERT INTO farm_activities
            (id, user_id, activity_type, activity_date, field_id, crop, notes, inputs_used,
             yield_estimate, location_lat, location_lng, ai_summary, ai_extracted_data,
             sync_status, collected_by, verification_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.user_id)
    .bind(new.activity_type)
    .bind(&new.activity_date)
    .bind(&new.field_id)
    .bind(&new.crop)
    .bind(&new.notes)
    .bind(&new.inputs_used)
    .bind(&new.yield_estimate)
    .bind(new.location_lat)
    .bind(new.location_lng)
    .bind(&new.ai_summary)
    .bind(Json(&new.ai_extracted_data))
    .bind(new.sync_status)
    .bind(&new.collected_by)
    .bind(verification)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "FarmActivity", &id))?;

    get_activity(pool, &id).await
}

/// Get an activity by ID.
pub async fn get_activity(pool: &SqlitePool, id: &str) -> Result<FarmActivity> {
    let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM farm_activities WHERE id = ?");
    sqlx::query_as::<_, FarmActivity>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "FarmActivity",
            id: id.to_string(),
        })
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ActivityFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (activity_type LIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(crop, '') LIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(notes, '') LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(crop) = filter.crop.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND COALESCE(crop, '') LIKE ")
            .push_bind(format!("%{}%", crop.trim()));
    }
    if let Some(from) = filter.from.as_deref() {
        qb.push(" AND date(activity_date) >= date(")
            .push_bind(from.to_string())
            .push(")");
    }
    if let Some(to) = filter.to.as_deref() {
        qb.push(" AND date(activity_date) <= date(")
            .push_bind(to.to_string())
            .push(")");
    }
    if filter.verified_only {
        qb.push(" AND collected_by IS NOT NULL");
    }
}

fn push_owner_list(qb: &mut QueryBuilder<'_, Sqlite>, user_ids: &[String]) {
    qb.push(" AND user_id IN (");
    let mut separated = qb.separated(", ");
    for id in user_ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
}

/// List one farmer's activities, newest first.
pub async fn list_activities_for_user(
    pool: &SqlitePool,
    user_id: &str,
    filter: &ActivityFilter,
) -> Result<Vec<FarmActivity>> {
    list_activities_for_users(pool, &[user_id.to_string()], filter).await
}

/// List activities owned by any of `user_ids`, newest first.
pub async fn list_activities_for_users(
    pool: &SqlitePool,
    user_ids: &[String],
    filter: &ActivityFilter,
) -> Result<Vec<FarmActivity>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {ACTIVITY_COLUMNS} FROM farm_activities WHERE 1 = 1"
    ));
    push_owner_list(&mut qb, user_ids);
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY activity_date DESC, created_at DESC LIMIT ")
        .push_bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));

    let activities = qb.build_query_as::<FarmActivity>().fetch_all(pool).await?;
    Ok(activities)
}

/// List activities an extension worker collected, newest first.
pub async fn list_activities_collected_by(
    pool: &SqlitePool,
    worker_id: &str,
    status: Option<VerificationStatus>,
) -> Result<Vec<FarmActivity>> {
    let sql = format!(
        "SELECT {ACTIVITY_COLUMNS} FROM farm_activities \
         WHERE collected_by = ?1 AND (?2 IS NULL OR verification_status = ?2) \
         ORDER BY created_at DESC"
    );
    let activities = sqlx::query_as::<_, FarmActivity>(&sql)
        .bind(worker_id)
        .bind(status)
        .fetch_all(pool)
        .await?;

    Ok(activities)
}

/// List the most recent activities across all farmers.
pub async fn list_recent_activities(
    pool: &SqlitePool,
    limit: i64,
    search: Option<&str>,
) -> Result<Vec<FarmActivity>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {ACTIVITY_COLUMNS} FROM farm_activities WHERE 1 = 1"
    ));
    let filter = ActivityFilter {
        search: search.map(str::to_string),
        ..Default::default()
    };
    push_filter(&mut qb, &filter);
    qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

    let activities = qb.build_query_as::<FarmActivity>().fetch_all(pool).await?;
    Ok(activities)
}

/// Apply a farmer's correction to their own activity.
///
/// Records collected by an extension worker become `edited`.
pub async fn update_activity(
    pool: &SqlitePool,
    id: &str,
    owner_id: &str,
    update: &ActivityUpdate,
) -> Result<FarmActivity> {
    if let Some(notes) = update.notes.as_deref() {
        validate_text_length("notes", notes, MAX_NOTES_LENGTH)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE farm_activities
        SET activity_type = COALESCE(?, activity_type),
            crop = COALESCE(?, crop),
            notes = COALESCE(?, notes),
            inputs_used = COALESCE(?, inputs_used),
            yield_estimate = COALESCE(?, yield_estimate),
            verification_status = CASE
                WHEN collected_by IS NOT NULL THEN 'edited'
                ELSE verification_status
            END,
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(update.activity_type)
    .bind(&update.crop)
    .bind(&update.notes)
    .bind(&update.inputs_used)
    .bind(&update.yield_estimate)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "FarmActivity",
            id: id.to_string(),
        });
    }

    get_activity(pool, id).await
}

/// Accept an extension-collected record as-is.
pub async fn accept_activity(pool: &SqlitePool, id: &str, owner_id: &str) -> Result<FarmActivity> {
    let result = sqlx::query(
        r#"
        UPDATE farm_activities
        SET verification_status = 'accepted', updated_at = datetime('now')
        WHERE id = ? AND user_id = ? AND verification_status = 'pending'
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let activity = get_activity(pool, id).await?;
        if activity.user_id != owner_id {
            return Err(DatabaseError::NotFound {
                entity: "FarmActivity",
                id: id.to_string(),
            });
        }
        return Err(DatabaseError::InvalidTransition {
            entity: "FarmActivity",
            id: id.to_string(),
            current: activity.verification_status.as_str().to_string(),
            expected: "pending",
        });
    }

    get_activity(pool, id).await
}

/// Flag a queued activity as persisted.
pub async fn mark_synced(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE farm_activities
        SET sync_status = 'synced', updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "FarmActivity",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count a farmer's activities still marked `pending` sync.
pub async fn count_pending_sync(pool: &SqlitePool, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM farm_activities
        WHERE user_id = ? AND sync_status = 'pending'
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count all activities.
pub async fn count_activities(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM farm_activities
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Distinct crops a farmer has logged, alphabetically.
pub async fn list_distinct_crops(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let crops = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT crop
        FROM farm_activities
        WHERE user_id = ? AND crop IS NOT NULL AND crop != ''
        ORDER BY crop
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(crops)
}

/// Aggregate counts by type, crop and month across `user_ids`.
pub async fn activity_stats(pool: &SqlitePool, user_ids: &[String]) -> Result<ActivityStats> {
    if user_ids.is_empty() {
        return Ok(ActivityStats::default());
    }

    let rows = grouped_counts(pool, user_ids, "activity_type").await?;
    let by_type: BTreeMap<String, i64> = rows.into_iter().collect();

    let rows = grouped_counts(pool, user_ids, "crop").await?;
    let by_crop: BTreeMap<String, i64> = rows.into_iter().collect();

    let rows = grouped_counts(pool, user_ids, "strftime('%Y-%m', activity_date)").await?;
    let by_month: BTreeMap<String, i64> = rows.into_iter().collect();

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*), COALESCE(SUM(collected_by IS NOT NULL), 0) FROM farm_activities WHERE 1 = 1",
    );
    push_owner_list(&mut qb, user_ids);
    let (total, verified) = qb.build_query_as::<(i64, i64)>().fetch_one(pool).await?;

    Ok(ActivityStats {
        total,
        verified,
        by_type,
        by_crop,
        by_month,
    })
}

/// `expr` is always a fixed column expression chosen in this module.
async fn grouped_counts(
    pool: &SqlitePool,
    user_ids: &[String],
    expr: &str,
) -> Result<Vec<(String, i64)>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {expr} AS bucket, COUNT(*) FROM farm_activities WHERE {expr} IS NOT NULL AND {expr} != ''"
    ));
    push_owner_list(&mut qb, user_ids);
    qb.push(" GROUP BY bucket");

    let rows = qb.build_query_as::<(String, i64)>().fetch_all(pool).await?;
    Ok(rows)
}

/// Per-farmer counts and last activity date for every farmer.
pub async fn farmer_overview(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<FarmerOverview>> {
    let pattern = format!("%{}%", search.unwrap_or("").trim());

    let rows = sqlx::query_as::<_, FarmerOverview>(
        r#"
        SELECT p.user_id, p.full_name, p.village_location,
               COUNT(f.id) AS activity_count,
               COALESCE(SUM(f.collected_by IS NOT NULL), 0) AS verified_count,
               MAX(f.activity_date) AS last_activity_date
        FROM profiles p
        JOIN user_roles r ON r.user_id = p.user_id AND r.role = 'farmer'
        LEFT JOIN farm_activities f ON f.user_id = p.user_id
        WHERE p.full_name LIKE ?1 OR COALESCE(p.village_location, '') LIKE ?1
        GROUP BY p.user_id
        ORDER BY p.full_name
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::account::create_account;
    use crate::account::tests::{new_account, test_db};
    use crate::models::Role;
    use crate::validation::ValidationError;

    pub(crate) fn activity(user_id: &str, kind: ActivityType, crop: &str, date: &str) -> NewActivity {
        NewActivity {
            crop: Some(crop.to_string()),
            ..NewActivity::new(user_id, kind, date)
        }
    }

    #[tokio::test]
    async fn test_create_and_get_activity() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let mut new = activity(&farmer.id, ActivityType::Planting, "Maize", "2025-03-04T08:00:00Z");
        new.location_lat = Some(-0.09);
        new.location_lng = Some(34.76);
        new.ai_extracted_data = serde_json::json!({"crop": "Maize"});
        let created = create_activity(db.pool(), &new).await.unwrap();

        let fetched = get_activity(db.pool(), &created.id).await.unwrap();
        assert_eq!(fetched.activity_type, ActivityType::Planting);
        assert_eq!(fetched.verification_status, VerificationStatus::SelfReported);
        assert_eq!(fetched.ai_extracted_data.0["crop"], "Maize");
        assert!(!fetched.is_verified());
    }

    #[tokio::test]
    async fn test_replayed_id_reports_already_exists() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let mut new = activity(&farmer.id, ActivityType::Harvest, "Beans", "2025-06-01T00:00:00Z");
        new.id = Some("queued-1".to_string());
        create_activity(db.pool(), &new).await.unwrap();

        let again = create_activity(db.pool(), &new).await;
        assert!(matches!(again, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_rejects_bad_coordinates() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let mut new = activity(&farmer.id, ActivityType::Irrigation, "Rice", "2025-03-04T08:00:00Z");
        new.location_lat = Some(120.0);
        new.location_lng = Some(0.0);
        assert!(matches!(
            create_activity(db.pool(), &new).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_foreign_field() {
        let db = test_db().await;
        let amina = create_account(db.pool(), &new_account("a@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();
        let baraka = create_account(db.pool(), &new_account("b@example.com", "Baraka", Role::Farmer))
            .await
            .unwrap();
        let plot = crate::field::create_field(db.pool(), &amina.id, "River plot")
            .await
            .unwrap();

        let mut new = activity(&baraka.id, ActivityType::Planting, "Maize", "2025-03-04");
        new.field_id = Some(plot.id.clone());
        assert!(matches!(
            create_activity(db.pool(), &new).await,
            Err(DatabaseError::NotFound { entity: "Field", .. })
        ));

        new.user_id = amina.id.clone();
        let stored = create_activity(db.pool(), &new).await.unwrap();
        assert_eq!(stored.field_id.as_deref(), Some(plot.id.as_str()));
    }

    #[tokio::test]
    async fn test_rejects_unparsable_date() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let new = activity(&farmer.id, ActivityType::Planting, "Maize", "soon");
        assert!(matches!(
            create_activity(db.pool(), &new).await,
            Err(DatabaseError::Validation(ValidationError::InvalidDate { .. }))
        ));

        let plain = activity(&farmer.id, ActivityType::Planting, "Maize", "2025-03-04");
        let stored = create_activity(db.pool(), &plain).await.unwrap();
        let filter = ActivityFilter {
            from: Some("2025-03-01".to_string()),
            to: Some("2025-03-31".to_string()),
            ..Default::default()
        };
        let found = list_activities_for_user(db.pool(), &farmer.id, &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, stored.id);
    }

    #[tokio::test]
    async fn test_filters() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();
        let worker = create_account(db.pool(), &new_account("w@example.com", "Wanjiru", Role::Enumerator))
            .await
            .unwrap();

        let mut first = activity(&farmer.id, ActivityType::Planting, "Maize", "2025-01-10T08:00:00Z");
        first.notes = Some("rows spaced 75cm".to_string());
        create_activity(db.pool(), &first).await.unwrap();
        create_activity(
            db.pool(),
            &activity(&farmer.id, ActivityType::Pest, "Beans", "2025-02-15T08:00:00Z"),
        )
        .await
        .unwrap();
        let mut verified = activity(&farmer.id, ActivityType::Harvest, "Maize", "2025-03-31T16:00:00Z");
        verified.collected_by = Some(worker.id.clone());
        create_activity(db.pool(), &verified).await.unwrap();

        let all = list_activities_for_user(db.pool(), &farmer.id, &ActivityFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].activity_type, ActivityType::Harvest);

        let maize = ActivityFilter {
            crop: Some("maize".to_string()),
            ..Default::default()
        };
        assert_eq!(
            list_activities_for_user(db.pool(), &farmer.id, &maize).await.unwrap().len(),
            2
        );

        let search = ActivityFilter {
            search: Some("75cm".to_string()),
            ..Default::default()
        };
        assert_eq!(
            list_activities_for_user(db.pool(), &farmer.id, &search).await.unwrap().len(),
            1
        );

        let range = ActivityFilter {
            from: Some("2025-02-01".to_string()),
            to: Some("2025-03-31".to_string()),
            ..Default::default()
        };
        assert_eq!(
            list_activities_for_user(db.pool(), &farmer.id, &range).await.unwrap().len(),
            2
        );

        let verified_only = ActivityFilter {
            verified_only: true,
            ..Default::default()
        };
        let rows = list_activities_for_user(db.pool(), &farmer.id, &verified_only)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].verification_status, VerificationStatus::Pending);

        let collected = list_activities_collected_by(db.pool(), &worker.id, None)
            .await
            .unwrap();
        assert_eq!(collected.len(), 1);

        let capped = ActivityFilter {
            limit: Some(2),
            ..Default::default()
        };
        let rows = list_activities_for_users(db.pool(), &[farmer.id.clone()], &capped)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].activity_type, ActivityType::Harvest);
    }

    #[tokio::test]
    async fn test_accept_and_edit_collected_activity() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();
        let worker = create_account(db.pool(), &new_account("w@example.com", "Wanjiru", Role::Enumerator))
            .await
            .unwrap();

        let mut first = activity(&farmer.id, ActivityType::Planting, "Maize", "2025-01-10T08:00:00Z");
        first.collected_by = Some(worker.id.clone());
        let first = create_activity(db.pool(), &first).await.unwrap();

        let accepted = accept_activity(db.pool(), &first.id, &farmer.id).await.unwrap();
        assert_eq!(accepted.verification_status, VerificationStatus::Accepted);

        let again = accept_activity(db.pool(), &first.id, &farmer.id).await;
        assert!(matches!(again, Err(DatabaseError::InvalidTransition { .. })));

        let mut second = activity(&farmer.id, ActivityType::Pest, "Maize", "2025-01-20T08:00:00Z");
        second.collected_by = Some(worker.id.clone());
        let second = create_activity(db.pool(), &second).await.unwrap();

        let update = ActivityUpdate {
            notes: Some("fall armyworm".to_string()),
            ..Default::default()
        };
        let edited = update_activity(db.pool(), &second.id, &farmer.id, &update)
            .await
            .unwrap();
        assert_eq!(edited.verification_status, VerificationStatus::Edited);
        assert_eq!(edited.notes.as_deref(), Some("fall armyworm"));
        assert_eq!(edited.crop.as_deref(), Some("Maize"));

        let not_owner = update_activity(db.pool(), &second.id, &worker.id, &update).await;
        assert!(matches!(not_owner, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_pending_sync_and_mark_synced() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();

        let mut queued = activity(&farmer.id, ActivityType::Irrigation, "Rice", "2025-01-10T08:00:00Z");
        queued.sync_status = SyncStatus::Pending;
        let queued = create_activity(db.pool(), &queued).await.unwrap();

        assert_eq!(count_pending_sync(db.pool(), &farmer.id).await.unwrap(), 1);
        mark_synced(db.pool(), &queued.id).await.unwrap();
        assert_eq!(count_pending_sync(db.pool(), &farmer.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stats_and_overview() {
        let db = test_db().await;
        let farmer = create_account(db.pool(), &new_account("f@example.com", "Amina", Role::Farmer))
            .await
            .unwrap();
        create_account(db.pool(), &new_account("g@example.com", "Baraka", Role::Farmer))
            .await
            .unwrap();

        for (kind, crop, date) in [
            (ActivityType::Planting, "Maize", "2025-01-10T08:00:00Z"),
            (ActivityType::Pest, "Maize", "2025-02-11T08:00:00Z"),
            (ActivityType::Pest, "Beans", "2025-02-20T08:00:00Z"),
        ] {
            create_activity(db.pool(), &activity(&farmer.id, kind, crop, date))
                .await
                .unwrap();
        }

        let stats = activity_stats(db.pool(), &[farmer.id.clone()]).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.verified, 0);
        assert_eq!(stats.by_type.get("Pest"), Some(&2));
        assert_eq!(stats.by_crop.get("Maize"), Some(&2));
        assert_eq!(stats.by_month.get("2025-02"), Some(&2));

        assert_eq!(activity_stats(db.pool(), &[]).await.unwrap(), ActivityStats::default());

        let crops = list_distinct_crops(db.pool(), &farmer.id).await.unwrap();
        assert_eq!(crops, vec!["Beans".to_string(), "Maize".to_string()]);

        let overview = farmer_overview(db.pool(), None).await.unwrap();
        assert_eq!(overview.len(), 2);
        let amina = overview.iter().find(|o| o.full_name == "Amina").unwrap();
        assert_eq!(amina.activity_count, 3);
        assert_eq!(amina.last_activity_date.as_deref(), Some("2025-02-20T08:00:00Z"));
        let baraka = overview.iter().find(|o| o.full_name == "Baraka").unwrap();
        assert_eq!(baraka.activity_count, 0);
        assert!(baraka.last_activity_date.is_none());

        assert_eq!(count_activities(db.pool()).await.unwrap(), 3);
        assert_eq!(list_recent_activities(db.pool(), 2, None).await.unwrap().len(), 2);
        assert_eq!(
            list_recent_activities(db.pool(), 50, Some("beans")).await.unwrap().len(),
            1
        );
    }
}
