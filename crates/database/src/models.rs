//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Role tag associated with a user; determines dashboard routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Institution,
    /// Extension worker collecting data on behalf of farmers.
    Enumerator,
    Admin,
}

impl Role {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Institution => "institution",
            Role::Enumerator => "enumerator",
            Role::Admin => "admin",
        }
    }

    /// Parse a role from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "farmer" => Some(Role::Farmer),
            "institution" => Some(Role::Institution),
            "enumerator" | "extension" | "extension_worker" => Some(Role::Enumerator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Dashboard path a client should route this role to.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Farmer => "/farmer",
            Role::Institution => "/institution",
            Role::Enumerator => "/extension",
            Role::Admin => "/admin",
        }
    }
}

/// Kind of logged farm activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum ActivityType {
    Planting,
    Fertilizer,
    Pest,
    Irrigation,
    Harvest,
    Other,
}

impl ActivityType {
    /// All activity types in display order.
    pub const ALL: [ActivityType; 6] = [
        ActivityType::Planting,
        ActivityType::Fertilizer,
        ActivityType::Pest,
        ActivityType::Irrigation,
        ActivityType::Harvest,
        ActivityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Planting => "Planting",
            ActivityType::Fertilizer => "Fertilizer",
            ActivityType::Pest => "Pest",
            ActivityType::Irrigation => "Irrigation",
            ActivityType::Harvest => "Harvest",
            ActivityType::Other => "Other",
        }
    }

    /// Parse an activity type, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

/// Whether an activity has reached the shared store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
}

/// Review state of an activity.
///
/// Farmer-entered records are `SelfReported`. Records collected by an
/// extension worker start `Pending` until the farmer accepts or edits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VerificationStatus {
    SelfReported,
    Pending,
    Accepted,
    Edited,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::SelfReported => "self_reported",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Accepted => "accepted",
            VerificationStatus::Edited => "edited",
        }
    }
}

/// Level of access an institution asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AccessType {
    View,
    ViewDownload,
    ViewDownloadAnalytics,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::View => "view",
            AccessType::ViewDownload => "view_download",
            AccessType::ViewDownloadAnalytics => "view_download_analytics",
        }
    }

    /// Whether this level includes exporting records.
    pub fn allows_download(&self) -> bool {
        *self >= AccessType::ViewDownload
    }

    /// Whether this level includes aggregated reports.
    pub fn allows_analytics(&self) -> bool {
        *self == AccessType::ViewDownloadAnalytics
    }
}

/// Lifecycle of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            "expired" => Some(RequestStatus::Expired),
            _ => None,
        }
    }
}

/// Organization type a farmer can share records with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ShareTarget {
    Insurer,
    Bank,
    Cooperative,
    Government,
}

/// What a farmer-granted data permission allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PermissionType {
    View,
    Download,
}

/// Slice of history covered by a data permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum DataRange {
    #[serde(rename = "3months")]
    #[sqlx(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "full")]
    #[sqlx(rename = "full")]
    Full,
    #[serde(rename = "verified")]
    #[sqlx(rename = "verified")]
    Verified,
}

/// Login credentials for a user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: String,
}

/// User identity shown across dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub village_location: Option<String>,
    /// Language code (e.g., "en", "sw").
    pub preferred_language: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A profile joined with its role, as listed for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub village_location: Option<String>,
    pub role: Role,
    pub created_at: String,
}

/// One logged farming event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FarmActivity {
    pub id: String,
    /// Owning farmer.
    pub user_id: String,
    pub activity_type: ActivityType,
    /// RFC 3339 timestamp of when the activity happened.
    pub activity_date: String,
    pub field_id: Option<String>,
    pub crop: Option<String>,
    pub notes: Option<String>,
    pub inputs_used: Option<String>,
    pub yield_estimate: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub ai_summary: Option<String>,
    /// Free-form data extracted by the AI gateway.
    pub ai_extracted_data: Json<serde_json::Value>,
    pub sync_status: SyncStatus,
    /// Extension worker who logged this on the farmer's behalf.
    pub collected_by: Option<String>,
    pub verification_status: VerificationStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl FarmActivity {
    /// Whether an extension worker vouched for this record.
    pub fn is_verified(&self) -> bool {
        self.collected_by.is_some()
    }
}

/// An institution's ask to view a farmer's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccessRequest {
    pub id: String,
    pub institution_id: String,
    pub farmer_id: String,
    pub request_reason: String,
    pub access_type: AccessType,
    pub duration_days: i64,
    pub status: RequestStatus,
    /// Set when the request is approved.
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A farmer-initiated grant to an external party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DataPermission {
    pub id: String,
    pub user_id: String,
    pub shared_with_email: String,
    pub shared_with_type: ShareTarget,
    pub permission_type: PermissionType,
    pub data_range: DataRange,
    pub is_active: bool,
    pub created_at: String,
}

/// Organization metadata for institution users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InstitutionProfile {
    pub user_id: String,
    pub organization_name: String,
    pub institution_type: String,
    pub country_region: Option<String>,
    pub representative_name: String,
    pub position_role: Option<String>,
    pub updated_at: String,
}

/// Organization metadata for admin users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AdminProfile {
    pub user_id: String,
    pub role_level: String,
    pub organization: Option<String>,
    pub updated_at: String,
}

/// A named farmer-owned plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Field {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: String,
}

/// An audit trail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub actor_id: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub created_at: String,
}

/// A platform-wide setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}
