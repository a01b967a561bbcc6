use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered from lightest to heaviest so tiers compare naturally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadTier {
    Low,
    Medium,
    High,
    Overloaded,
}

impl WorkloadTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadTier::Low => "low",
            WorkloadTier::Medium => "medium",
            WorkloadTier::High => "high",
            WorkloadTier::Overloaded => "overloaded",
        }
    }
}

impl fmt::Display for WorkloadTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time projection of a tutor's committed load. Recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAllocation {
    pub tutor_id: String,
    pub session_ids: Vec<String>,
    pub class_ids: Vec<String>,
    pub total_hours: f64,
    pub student_count: usize,
    pub tier: WorkloadTier,
    pub computed_at: String,
}
