use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result body of a reminder run. `candidates` counts device-level dispatch
/// jobs that survived the dedup check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReminderRunSummary {
    pub candidates: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Result body of a rollover run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RolloverSummary {
    pub message: String,
}
