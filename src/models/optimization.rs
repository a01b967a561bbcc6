use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::inefficiency::InefficiencyKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
    Pending,
    Applied,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Pending => "pending",
            PlanStatus::Applied => "applied",
        }
    }

    pub fn can_apply(&self) -> bool {
        matches!(self, PlanStatus::Draft | PlanStatus::Pending)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing filter tags, one per inefficiency kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    Workload,
    GroupBalance,
    ResourceConflicts,
    Utilization,
}

impl FocusArea {
    pub fn kind(&self) -> InefficiencyKind {
        match self {
            FocusArea::Workload => InefficiencyKind::OverloadedTutor,
            FocusArea::GroupBalance => InefficiencyKind::UnbalancedGroup,
            FocusArea::ResourceConflicts => InefficiencyKind::ResourceConflict,
            FocusArea::Utilization => InefficiencyKind::UnderutilizedTutor,
        }
    }
}

/// Reserved for future heuristics; accepted and stored on the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlanConstraints {
    #[serde(default)]
    pub max_hours_per_tutor: Option<f64>,
    #[serde(default)]
    pub max_students_per_class: Option<u32>,
    #[serde(default)]
    pub min_class_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedImpact {
    pub workload_reduction: f64,
    pub balance_improvement: f64,
    pub resource_utilization: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChangeAction {
    ReallocateSession {
        session_id: String,
        from_tutor_id: String,
        to_tutor_id: String,
    },
    ReallocateStudent {
        student_id: String,
        from_class_id: String,
        to_class_id: String,
    },
    AdjustGroupSize {
        class_id: String,
    },
    ModifySchedule {
        session_id: String,
        conflicting_session_id: String,
    },
}

impl ChangeAction {
    pub fn type_name(&self) -> &'static str {
        match self {
            ChangeAction::ReallocateSession { .. } => "reallocate_session",
            ChangeAction::ReallocateStudent { .. } => "reallocate_student",
            ChangeAction::AdjustGroupSize { .. } => "adjust_group_size",
            ChangeAction::ModifySchedule { .. } => "modify_schedule",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationChange {
    /// Identifier callers use to select this change when applying.
    pub resource_id: String,
    pub reason: String,
    #[serde(flatten)]
    pub action: ChangeAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationPlan {
    pub id: String,
    pub status: PlanStatus,
    #[serde(default)]
    pub focus_areas: Vec<FocusArea>,
    #[serde(default)]
    pub constraints: PlanConstraints,
    pub changes: Vec<OptimizationChange>,
    pub estimated_impact: EstimatedImpact,
    pub created_at: String,
    #[serde(default)]
    pub applied_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlanInput {
    #[serde(default)]
    pub focus_areas: Option<Vec<FocusArea>>,
    #[serde(default)]
    pub constraints: Option<PlanConstraints>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPlanInput {
    pub plan_id: String,
    pub change_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRef {
    pub resource_id: String,
    pub change_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedChange {
    pub resource_id: String,
    pub change_type: String,
    pub reason: String,
}

/// Outcome of one apply batch. The plan is marked applied even when
/// `failed` is non-empty; callers decide whether that is acceptable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub plan: OptimizationPlan,
    pub applied: Vec<ChangeRef>,
    /// Changes accepted but needing input the change record does not carry.
    pub deferred: Vec<ChangeRef>,
    pub failed: Vec<FailedChange>,
}

impl ApplyResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
