//! CSV export of farm activities.

use database::models::FarmActivity;

const HEADER: [&str; 7] = [
    "Date",
    "Activity Type",
    "Crop",
    "Notes",
    "Inputs Used",
    "Yield Estimate",
    "AI Summary",
];

/// Every cell is quoted; embedded quotes are doubled.
fn cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn row<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells.into_iter().map(cell).collect::<Vec<_>>().join(",")
}

/// Render activities as CSV, one row per activity, header first.
pub fn activities_to_csv(activities: &[FarmActivity]) -> String {
    let mut out = row(HEADER);
    out.push('\n');

    for a in activities {
        let date = a.activity_date.get(..10).unwrap_or(&a.activity_date);
        out.push_str(&row([
            date,
            a.activity_type.as_str(),
            a.crop.as_deref().unwrap_or(""),
            a.notes.as_deref().unwrap_or(""),
            a.inputs_used.as_deref().unwrap_or(""),
            a.yield_estimate.as_deref().unwrap_or(""),
            a.ai_summary.as_deref().unwrap_or(""),
        ]));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::{ActivityType, SyncStatus, VerificationStatus};

    fn activity(notes: &str) -> FarmActivity {
        FarmActivity {
            id: "a1".to_string(),
            user_id: "f1".to_string(),
            activity_type: ActivityType::Harvest,
            activity_date: "2025-06-30T10:00:00Z".to_string(),
            field_id: None,
            crop: Some("Maize".to_string()),
            notes: Some(notes.to_string()),
            inputs_used: None,
            yield_estimate: Some("12 bags".to_string()),
            location_lat: None,
            location_lng: None,
            ai_summary: None,
            ai_extracted_data: serde_json::from_value(serde_json::json!({})).unwrap(),
            sync_status: SyncStatus::Synced,
            collected_by: None,
            verification_status: VerificationStatus::SelfReported,
            created_at: "2025-06-30 10:00:00".to_string(),
            updated_at: "2025-06-30 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(
            activities_to_csv(&[]),
            "\"Date\",\"Activity Type\",\"Crop\",\"Notes\",\"Inputs Used\",\"Yield Estimate\",\"AI Summary\"\n"
        );
    }

    #[test]
    fn test_quotes_are_doubled() {
        let csv = activities_to_csv(&[activity("said \"good\", mostly")]);
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "\"2025-06-30\",\"Harvest\",\"Maize\",\"said \"\"good\"\", mostly\",\"\",\"12 bags\",\"\""
        );
    }
}
