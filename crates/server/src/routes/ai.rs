//! AI summary endpoint and the summary fill shared by activity writes.

use activity_ai::{summarize_or_fallback, ActivityContext, ActivitySummary};
use axum::extract::State;
use axum::Json;
use database::farm_activity::NewActivity;

use crate::auth::AuthUser;
use crate::state::AppState;

/// Summarize an activity for any signed-in user. Gateway failures come back
/// as the templated fallback, never as an error.
pub async fn summarize(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(ctx): Json<ActivityContext>,
) -> Json<ActivitySummary> {
    Json(summarize_or_fallback(state.summarizer.as_ref(), &ctx).await)
}

/// Give `new` a summary if the client sent none.
pub(crate) async fn fill_summary(state: &AppState, new: &mut NewActivity) {
    if new
        .ai_summary
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty())
    {
        return;
    }

    let ctx = ActivityContext {
        crop: new.crop.clone(),
        notes: new.notes.clone(),
        inputs_used: new.inputs_used.clone(),
        ..ActivityContext::new(new.activity_type.as_str())
    };
    let summary = summarize_or_fallback(state.summarizer.as_ref(), &ctx).await;

    new.ai_summary = Some(summary.summary);
    if new.ai_extracted_data.as_object().map_or(true, |o| o.is_empty()) {
        new.ai_extracted_data = summary.extracted_data;
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::tests::{send, signup, test_app};

    #[tokio::test]
    async fn test_summarize_falls_back() {
        let app = test_app().await;
        let (token, _) = signup(&app, "worker@example.com", "enumerator").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/ai/summarize",
            Some(&token),
            Some(json!({"activityType": "Irrigation", "crop": "Tomatoes", "notes": "Drip lines."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["summary"],
            "Irrigation activity recorded for Tomatoes. Drip lines."
        );
        assert_eq!(body["extracted_data"], json!({}));
    }
}
