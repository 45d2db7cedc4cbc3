//! The activity write a client sends to the server or queues for later.

use serde::{Deserialize, Serialize};

/// Whether the entry was written straight through or queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
}

/// Body of `POST /api/farmer/activities` and `POST /api/extension/activities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivityPayload {
    /// Client-generated ID, so a replayed entry is recognized as a duplicate.
    pub id: String,
    /// Owning farmer.
    pub user_id: String,
    pub activity_type: String,
    /// RFC 3339.
    pub activity_date: String,
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub inputs_used: Option<String>,
    #[serde(default)]
    pub yield_estimate: Option<String>,
    #[serde(default)]
    pub location_lat: Option<f64>,
    #[serde(default)]
    pub location_lng: Option<f64>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default = "empty_object")]
    pub ai_extracted_data: serde_json::Value,
    #[serde(default)]
    pub sync_status: SyncStatus,
    /// Extension worker who captured the entry.
    #[serde(default)]
    pub collected_by: Option<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl NewActivityPayload {
    /// Whether this entry goes through the extension route.
    pub fn is_collected(&self) -> bool {
        self.collected_by.is_some()
    }
}
