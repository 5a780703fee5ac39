use serde::Serialize;
use serde_json::Value;

use brigade::application::error::AppError;
use brigade::cache::{LoadOutcome, SnapshotCounts};
use brigade::domain::RestaurantId;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::unexpected(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub restaurant_id: RestaurantId,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: time::OffsetDateTime,
    pub counts: SnapshotCounts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSummary {
    pub record: Option<Value>,
    pub resync: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resync_error: Option<String>,
}

impl MutationSummary {
    pub fn new(record: Option<Value>, outcome: &LoadOutcome) -> Self {
        let resync_error = match outcome {
            LoadOutcome::Failed { message, .. } => Some(message.clone()),
            _ => None,
        };
        Self {
            record,
            resync: outcome_label(outcome),
            resync_error,
        }
    }
}

pub fn outcome_label(outcome: &LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Committed { .. } => "committed",
        LoadOutcome::Failed { .. } => "failed",
        LoadOutcome::Discarded { .. } => "discarded",
        LoadOutcome::SkippedInFlight => "skipped_in_flight",
        LoadOutcome::SkippedNoRestaurant => "skipped_no_restaurant",
    }
}
