use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::availability::Weekday;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Active,
    Inactive,
    Full,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Active => "active",
            ClassStatus::Inactive => "inactive",
            ClassStatus::Full => "full",
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring weekly class. `current_enrollment` may transiently exceed
/// `max_students`; the analyzer reports that as high severity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub tutor_id: String,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub semester_start: String,
    pub semester_end: String,
    pub max_students: u32,
    #[serde(default)]
    pub current_enrollment: u32,
    pub status: ClassStatus,
}

impl ClassRecord {
    /// Full classes still meet every week; only inactive ones are off the calendar.
    pub fn is_scheduled(&self) -> bool {
        self.status != ClassStatus::Inactive
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Dropped,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub status: EnrollmentStatus,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}
