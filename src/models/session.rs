use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    Ongoing,
    Completed,
    Cancelled,
    Rescheduled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Ongoing => "ongoing",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Rescheduled => "rescheduled",
        }
    }

    /// Committed time: only these statuses contribute to workload hours.
    pub fn counts_toward_hours(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Confirmed)
    }

    /// Bookings that still occupy the tutor's calendar.
    pub fn blocks_calendar(&self) -> bool {
        matches!(
            self,
            SessionStatus::Pending | SessionStatus::Confirmed | SessionStatus::Ongoing
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub tutor_id: String,
    #[serde(default)]
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    pub subject: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub status: SessionStatus,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub location: Option<String>,
}

impl Session {
    pub fn is_individual(&self) -> bool {
        self.class_id.is_none()
    }
}
