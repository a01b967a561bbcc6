use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InefficiencyKind {
    OverloadedTutor,
    UnderutilizedTutor,
    UnbalancedGroup,
    ResourceConflict,
}

impl InefficiencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InefficiencyKind::OverloadedTutor => "overloaded_tutor",
            InefficiencyKind::UnderutilizedTutor => "underutilized_tutor",
            InefficiencyKind::UnbalancedGroup => "unbalanced_group",
            InefficiencyKind::ResourceConflict => "resource_conflict",
        }
    }
}

impl fmt::Display for InefficiencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a finding is about, carrying what the planner needs to act on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InefficiencySubject {
    Tutor {
        tutor_id: String,
        session_ids: Vec<String>,
        total_hours: f64,
        student_count: usize,
    },
    Class {
        class_id: String,
        tutor_id: String,
        enrollment_count: u32,
        max_students: u32,
    },
    SessionPair {
        tutor_id: String,
        first_session_id: String,
        second_session_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInefficiency {
    pub id: String,
    pub kind: InefficiencyKind,
    pub severity: Severity,
    pub description: String,
    pub affected_ids: Vec<String>,
    pub subject: InefficiencySubject,
    pub suggested_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InefficiencyReport {
    pub generated_at: String,
    pub findings: Vec<ResourceInefficiency>,
    /// Skip events across all passes; a record skipped by two passes counts twice.
    pub skipped_records: usize,
}
