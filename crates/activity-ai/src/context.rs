//! Summarization inputs and outputs.

use serde::{Deserialize, Serialize};

/// What the capture flow knows about an activity when it asks for a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContext {
    pub activity_type: String,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Typed notes added at the evidence step.
    #[serde(default)]
    pub text_notes: Option<String>,
    #[serde(default)]
    pub inputs_used: Option<String>,
    #[serde(default)]
    pub photo_count: u32,
    #[serde(default)]
    pub video_count: u32,
    #[serde(default)]
    pub audio_count: u32,
}

impl ActivityContext {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            ..Default::default()
        }
    }

    /// The user prompt sent to the gateway.
    pub fn prompt(&self) -> String {
        fn or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        }

        format!(
            "You are an AI assistant helping farmers document their agricultural activities. \
Based on the following farm activity context, generate:
1. A concise summary (2-3 sentences) describing the activity
2. Extracted structured data

Context:
- Activity Type: {}
- Crop: {}
- Notes: {}
- Additional Notes: {}
- Inputs Used: {}
- Photos attached: {}
- Videos attached: {}
- Audio notes: {}

Respond with a JSON object containing:
- summary: string (the activity summary)
- extractedData: object with fields like crop, activityType, inputsUsed, estimatedImpact",
            self.activity_type,
            or(&self.crop, "Not specified"),
            or(&self.notes, "None"),
            or(&self.text_notes, "None"),
            or(&self.inputs_used, "None"),
            self.photo_count,
            self.video_count,
            self.audio_count,
        )
    }
}

/// A short description plus whatever structured data the model extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub summary: String,
    #[serde(default = "empty_object", alias = "extractedData")]
    pub extracted_data: serde_json::Value,
}

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ActivitySummary {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            extracted_data: empty_object(),
        }
    }
}
