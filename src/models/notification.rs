use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const REMINDER_TITLE: &str = "Subscription Reminder";

/// Outcome of a single send decision recorded in the audit log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum NotificationStatus {
    #[serde(rename = "sent")]
    Sent,
    #[serde(rename = "failed")]
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Three-way dedup verdict for a (subscription, offset, local day) key.
/// Everything except `NotRecorded` means: skip, do not duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// No audit row yet; this run owns the send decision.
    NotRecorded,
    /// An audit row already covers today, whether it succeeded or failed.
    AlreadyRecorded,
    /// A concurrent run inserted the row first; the uniqueness constraint
    /// rejected ours.
    RaceLost,
}

/// Gateway-level classification of one push attempt. Transport failures are
/// not represented here; those abort the whole run.
#[derive(Debug, Clone)]
pub enum PushOutcome {
    Delivered,
    Rejected { error: String },
}

/// Notification body shown on the device, singular when due tomorrow.
pub fn reminder_body(name: &str, days_until: i64) -> String {
    if days_until == 1 {
        format!("{name} is due in 1 day")
    } else {
        format!("{name} is due in {days_until} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_body_singular() {
        assert_eq!(reminder_body("Netflix", 1), "Netflix is due in 1 day");
    }

    #[test]
    fn test_reminder_body_plural() {
        assert_eq!(reminder_body("Netflix", 3), "Netflix is due in 3 days");
        assert_eq!(reminder_body("Spotify", 0), "Spotify is due in 0 days");
        assert_eq!(reminder_body("iCloud", 7), "iCloud is due in 7 days");
    }
}
