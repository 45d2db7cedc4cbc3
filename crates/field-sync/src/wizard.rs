//! The multi-step activity capture flow.
//!
//! Farmers walk `Type → Details → Evidence → Location → Preview`. Extension
//! workers start one step earlier at `SelectFarmer` unless a farmer was
//! chosen up front. Entering `Preview` is the point where the caller must
//! run summarization and feed the result back through
//! [`ActivityWizard::apply_summary`].

use activity_ai::{fallback_summary, ActivityContext, ActivitySummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::SyncError;
use crate::payload::{NewActivityPayload, SyncStatus};

/// Appended to every summary captured by an extension worker.
pub const VERIFIED_SOURCE_SUFFIX: &str = " — Collected by Extension Worker (Verified Source)";

/// Activity types offered at the `Type` step.
pub const ACTIVITY_TYPES: [&str; 6] = [
    "Planting",
    "Fertilizer",
    "Pest",
    "Irrigation",
    "Harvest",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    SelectFarmer,
    Type,
    Details,
    Evidence,
    Location,
    Preview,
}

const FARMER_STEPS: &[WizardStep] = &[
    WizardStep::Type,
    WizardStep::Details,
    WizardStep::Evidence,
    WizardStep::Location,
    WizardStep::Preview,
];

const EXTENSION_STEPS: &[WizardStep] = &[
    WizardStep::SelectFarmer,
    WizardStep::Type,
    WizardStep::Details,
    WizardStep::Evidence,
    WizardStep::Location,
    WizardStep::Preview,
];

/// Who is capturing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardMode {
    /// A farmer logging their own activity.
    Farmer { user_id: String },
    /// An extension worker logging on a farmer's behalf.
    Extension {
        worker_id: String,
        worker_name: Option<String>,
    },
}

/// Outcome of [`ActivityWizard::next`] and [`ActivityWizard::back`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved(WizardStep),
    /// Moved into `Preview`; summarization must run now.
    NeedsSummary,
    /// Already at the last step.
    Stayed,
    /// `back` from the first step; the caller should close the flow.
    Closed,
}

/// Free-form details entered at the `Details` step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetails {
    pub field_id: Option<String>,
    pub crop: Option<String>,
    pub notes: Option<String>,
    pub inputs_used: Option<String>,
    pub yield_estimate: Option<String>,
    /// Defaults to the time the entry is built.
    pub activity_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Photo,
    Video,
    Audio,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Photo => "photo",
            EvidenceKind::Video => "video",
            EvidenceKind::Audio => "audio",
        }
    }
}

/// State of one capture session.
#[derive(Debug, Clone)]
pub struct ActivityWizard {
    mode: WizardMode,
    step: WizardStep,
    farmer_id: Option<String>,
    activity_type: Option<String>,
    details: ActivityDetails,
    evidence: Vec<EvidenceKind>,
    text_notes: Option<String>,
    location: Option<(f64, f64)>,
    summary: Option<ActivitySummary>,
}

impl ActivityWizard {
    pub fn for_farmer(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self::with_mode(
            WizardMode::Farmer {
                user_id: user_id.clone(),
            },
            Some(user_id),
        )
    }

    /// Starts at `SelectFarmer`, or at `Type` when `farmer_id` is given.
    pub fn for_extension(
        worker_id: impl Into<String>,
        worker_name: Option<String>,
        farmer_id: Option<String>,
    ) -> Self {
        Self::with_mode(
            WizardMode::Extension {
                worker_id: worker_id.into(),
                worker_name,
            },
            farmer_id,
        )
    }

    fn with_mode(mode: WizardMode, farmer_id: Option<String>) -> Self {
        let step = match (&mode, &farmer_id) {
            (WizardMode::Extension { .. }, None) => WizardStep::SelectFarmer,
            _ => WizardStep::Type,
        };
        Self {
            mode,
            step,
            farmer_id,
            activity_type: None,
            details: ActivityDetails::default(),
            evidence: Vec::new(),
            text_notes: None,
            location: None,
            summary: None,
        }
    }

    pub fn mode(&self) -> &WizardMode {
        &self.mode
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    fn steps(&self) -> &'static [WizardStep] {
        match self.mode {
            WizardMode::Farmer { .. } => FARMER_STEPS,
            WizardMode::Extension { .. } => EXTENSION_STEPS,
        }
    }

    fn position(&self) -> usize {
        self.steps()
            .iter()
            .position(|s| *s == self.step)
            .unwrap_or(0)
    }

    /// Choose the farmer an extension worker is logging for.
    pub fn select_farmer(&mut self, farmer_id: impl Into<String>) -> Result<(), SyncError> {
        if !matches!(self.mode, WizardMode::Extension { .. }) {
            return Err(SyncError::Incomplete(
                "only extension workers select a farmer".to_string(),
            ));
        }
        self.farmer_id = Some(farmer_id.into());
        if self.step == WizardStep::SelectFarmer {
            self.step = WizardStep::Type;
        }
        Ok(())
    }

    /// Set the activity type and advance to `Details`.
    pub fn select_type(&mut self, activity_type: &str) -> Result<(), SyncError> {
        let known = ACTIVITY_TYPES
            .iter()
            .find(|t| t.eq_ignore_ascii_case(activity_type.trim()))
            .ok_or_else(|| SyncError::Incomplete(format!("unknown activity type: {activity_type}")))?;
        self.activity_type = Some(known.to_string());
        self.step = WizardStep::Details;
        Ok(())
    }

    pub fn set_details(&mut self, details: ActivityDetails) {
        self.details = details;
    }

    pub fn add_evidence(&mut self, kind: EvidenceKind) {
        self.evidence.push(kind);
    }

    pub fn set_text_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.text_notes = (!notes.trim().is_empty()).then_some(notes);
    }

    pub fn set_location(&mut self, lat: f64, lng: f64) -> Result<(), SyncError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(SyncError::InvalidLocation { lat, lng });
        }
        self.location = Some((lat, lng));
        Ok(())
    }

    pub fn evidence_count(&self, kind: EvidenceKind) -> u32 {
        self.evidence.iter().filter(|k| **k == kind).count() as u32
    }

    /// Advance one step. A step cannot be left until its required input is set.
    pub fn next(&mut self) -> Result<Transition, SyncError> {
        match self.step {
            WizardStep::SelectFarmer if self.farmer_id.is_none() => {
                return Err(SyncError::Incomplete("select a farmer first".to_string()));
            }
            WizardStep::Type if self.activity_type.is_none() => {
                return Err(SyncError::Incomplete("select an activity type first".to_string()));
            }
            _ => {}
        }

        let steps = self.steps();
        let Some(next) = steps.get(self.position() + 1).copied() else {
            return Ok(Transition::Stayed);
        };

        self.step = next;
        if next == WizardStep::Preview {
            self.summary = None;
            return Ok(Transition::NeedsSummary);
        }
        Ok(Transition::Moved(next))
    }

    /// Go back one step, or report `Closed` from the first step.
    pub fn back(&mut self) -> Transition {
        let position = self.position();
        if position == 0 {
            return Transition::Closed;
        }
        self.step = self.steps()[position - 1];
        Transition::Moved(self.step)
    }

    /// What the summarizer should see.
    pub fn context(&self) -> ActivityContext {
        ActivityContext {
            activity_type: self.activity_type.clone().unwrap_or_default(),
            crop: self.details.crop.clone(),
            notes: self.details.notes.clone(),
            text_notes: self.text_notes.clone(),
            inputs_used: self.details.inputs_used.clone(),
            photo_count: self.evidence_count(EvidenceKind::Photo),
            video_count: self.evidence_count(EvidenceKind::Video),
            audio_count: self.evidence_count(EvidenceKind::Audio),
        }
    }

    pub fn apply_summary(&mut self, summary: ActivitySummary) {
        self.summary = Some(summary);
    }

    pub fn summary(&self) -> Option<&ActivitySummary> {
        self.summary.as_ref()
    }

    /// Produce the write for this capture.
    ///
    /// The entry is `synced` only when saving now and online; otherwise it is
    /// `pending` and belongs in the offline queue.
    pub fn build(&self, sync_now: bool, online: bool) -> Result<NewActivityPayload, SyncError> {
        let activity_type = self
            .activity_type
            .clone()
            .ok_or_else(|| SyncError::Incomplete("activity type not selected".to_string()))?;
        let user_id = self
            .farmer_id
            .clone()
            .ok_or_else(|| SyncError::Incomplete("farmer not selected".to_string()))?;

        let summary = self
            .summary
            .clone()
            .unwrap_or_else(|| ActivitySummary::new(fallback_summary(&self.context())));

        let (ai_summary, extracted, collected_by) = match &self.mode {
            WizardMode::Farmer { .. } => (summary.summary, summary.extracted_data, None),
            WizardMode::Extension {
                worker_id,
                worker_name,
            } => {
                let mut extracted = match summary.extracted_data {
                    Value::Object(map) => Value::Object(map),
                    _ => json!({}),
                };
                extracted["collected_by"] = json!(worker_id);
                extracted["collector_name"] = json!(worker_name);
                extracted["verification_level"] = json!("extension_worker");
                extracted["evidence_types"] = json!(self
                    .evidence
                    .iter()
                    .map(EvidenceKind::as_str)
                    .collect::<Vec<_>>());
                (
                    format!("{}{}", summary.summary, VERIFIED_SOURCE_SUFFIX),
                    extracted,
                    Some(worker_id.clone()),
                )
            }
        };

        let sync_status = if sync_now && online {
            SyncStatus::Synced
        } else {
            SyncStatus::Pending
        };

        Ok(NewActivityPayload {
            id: Uuid::new_v4().to_string(),
            user_id,
            activity_type,
            activity_date: self
                .details
                .activity_date
                .unwrap_or_else(Utc::now)
                .to_rfc3339(),
            field_id: self.details.field_id.clone(),
            crop: non_empty(&self.details.crop),
            notes: non_empty(&self.details.notes),
            inputs_used: non_empty(&self.details.inputs_used),
            yield_estimate: non_empty(&self.details.yield_estimate),
            location_lat: self.location.map(|(lat, _)| lat),
            location_lng: self.location.map(|(_, lng)| lng),
            ai_summary: Some(ai_summary),
            ai_extracted_data: extracted,
            sync_status,
            collected_by,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farmer_walkthrough() {
        let mut wizard = ActivityWizard::for_farmer("farmer-1");
        assert_eq!(wizard.step(), WizardStep::Type);
        assert!(matches!(wizard.next(), Err(SyncError::Incomplete(_))));

        wizard.select_type("planting").unwrap();
        assert_eq!(wizard.step(), WizardStep::Details);

        wizard.set_details(ActivityDetails {
            crop: Some("Maize".to_string()),
            notes: Some("Rows by the river".to_string()),
            ..Default::default()
        });
        assert_eq!(wizard.next().unwrap(), Transition::Moved(WizardStep::Evidence));
        wizard.add_evidence(EvidenceKind::Photo);
        wizard.add_evidence(EvidenceKind::Photo);
        wizard.add_evidence(EvidenceKind::Audio);
        assert_eq!(wizard.next().unwrap(), Transition::Moved(WizardStep::Location));
        wizard.set_location(-0.09, 34.76).unwrap();
        assert_eq!(wizard.next().unwrap(), Transition::NeedsSummary);
        assert_eq!(wizard.step(), WizardStep::Preview);
        assert_eq!(wizard.next().unwrap(), Transition::Stayed);

        let ctx = wizard.context();
        assert_eq!(ctx.activity_type, "Planting");
        assert_eq!(ctx.photo_count, 2);
        assert_eq!(ctx.audio_count, 1);

        wizard.apply_summary(ActivitySummary::new("Maize planted."));
        let payload = wizard.build(true, true).unwrap();
        assert_eq!(payload.user_id, "farmer-1");
        assert_eq!(payload.ai_summary.as_deref(), Some("Maize planted."));
        assert_eq!(payload.sync_status, SyncStatus::Synced);
        assert_eq!(payload.location_lat, Some(-0.09));
        assert!(payload.collected_by.is_none());
    }

    #[test]
    fn test_back_closes_at_first_step() {
        let mut wizard = ActivityWizard::for_farmer("farmer-1");
        assert_eq!(wizard.back(), Transition::Closed);

        wizard.select_type("Harvest").unwrap();
        assert_eq!(wizard.back(), Transition::Moved(WizardStep::Type));
        assert_eq!(wizard.back(), Transition::Closed);
    }

    #[test]
    fn test_sync_status_requires_both_flags() {
        let mut wizard = ActivityWizard::for_farmer("farmer-1");
        wizard.select_type("Irrigation").unwrap();

        assert_eq!(wizard.build(true, false).unwrap().sync_status, SyncStatus::Pending);
        assert_eq!(wizard.build(false, true).unwrap().sync_status, SyncStatus::Pending);
        assert_eq!(wizard.build(true, true).unwrap().sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_missing_summary_uses_fallback() {
        let mut wizard = ActivityWizard::for_farmer("farmer-1");
        wizard.select_type("Harvest").unwrap();

        let payload = wizard.build(true, true).unwrap();
        assert_eq!(
            payload.ai_summary.as_deref(),
            Some("Harvest activity recorded for crops.")
        );
    }

    #[test]
    fn test_extension_marks_verified_source() {
        let mut wizard =
            ActivityWizard::for_extension("worker-9", Some("Wanjiru".to_string()), None);
        assert_eq!(wizard.step(), WizardStep::SelectFarmer);
        assert!(matches!(wizard.next(), Err(SyncError::Incomplete(_))));
        assert_eq!(wizard.back(), Transition::Closed);

        wizard.select_farmer("farmer-1").unwrap();
        assert_eq!(wizard.step(), WizardStep::Type);
        wizard.select_type("Pest").unwrap();
        wizard.add_evidence(EvidenceKind::Video);
        wizard.apply_summary(ActivitySummary {
            summary: "Aphids sprayed.".to_string(),
            extracted_data: json!({"pest": "aphids"}),
        });

        let payload = wizard.build(false, true).unwrap();
        assert_eq!(payload.user_id, "farmer-1");
        assert_eq!(payload.collected_by.as_deref(), Some("worker-9"));
        assert_eq!(
            payload.ai_summary.as_deref(),
            Some("Aphids sprayed. — Collected by Extension Worker (Verified Source)")
        );
        assert_eq!(payload.ai_extracted_data["pest"], "aphids");
        assert_eq!(payload.ai_extracted_data["verification_level"], "extension_worker");
        assert_eq!(payload.ai_extracted_data["evidence_types"], json!(["video"]));
        assert_eq!(payload.sync_status, SyncStatus::Pending);
    }

    #[test]
    fn test_preselected_farmer_skips_selection() {
        let wizard = ActivityWizard::for_extension("worker-9", None, Some("farmer-1".to_string()));
        assert_eq!(wizard.step(), WizardStep::Type);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut wizard = ActivityWizard::for_farmer("farmer-1");
        assert!(wizard.select_type("Dancing").is_err());
        assert!(matches!(
            wizard.set_location(91.0, 0.0),
            Err(SyncError::InvalidLocation { .. })
        ));
        assert!(wizard.select_farmer("someone").is_err());
    }
}
