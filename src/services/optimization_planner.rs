use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::error::{AppError, AppResult};
use crate::models::inefficiency::{InefficiencyKind, InefficiencySubject, ResourceInefficiency};
use crate::models::optimization::{
    BuildPlanInput, ChangeAction, EstimatedImpact, FocusArea, OptimizationChange,
    OptimizationPlan, PlanConstraints, PlanStatus,
};
use crate::models::settings::EngineSettings;
use crate::models::tutor::Tutor;
use crate::services::inefficiency_analyzer::InefficiencyAnalyzer;
use crate::services::settings_service::SettingsService;

/// Turns current findings into a draft plan of corrective changes.
pub struct OptimizationPlanner {
    repository: SchedulingRepository,
    analyzer: Arc<InefficiencyAnalyzer>,
    settings: Arc<SettingsService>,
}

impl OptimizationPlanner {
    pub fn new(
        repository: SchedulingRepository,
        analyzer: Arc<InefficiencyAnalyzer>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            repository,
            analyzer,
            settings,
        }
    }

    pub fn build_plan(&self, input: BuildPlanInput) -> AppResult<OptimizationPlan> {
        let settings = self.settings.get()?;
        let report = self.analyzer.find_inefficiencies()?;
        let tutors = self.repository.tutors()?.items;

        let focus_areas = input.focus_areas.unwrap_or_default();
        let constraints = input.constraints.unwrap_or_default();
        let plan = synthesize_plan(&report.findings, &focus_areas, constraints, &tutors, &settings);

        self.repository.insert_plan(&plan)?;
        info!(
            target: "engine::planner",
            plan_id = %plan.id,
            changes = plan.changes.len(),
            findings = report.findings.len(),
            "optimization plan drafted"
        );
        Ok(plan)
    }

    /// Moves a draft into the approval queue.
    pub fn submit_plan(&self, plan_id: &str) -> AppResult<OptimizationPlan> {
        let mut plan = self.get_plan(plan_id)?;
        if plan.status != PlanStatus::Draft {
            return Err(AppError::invalid_state(format!(
                "plan {plan_id} is {} and cannot be submitted",
                plan.status
            )));
        }
        plan.status = PlanStatus::Pending;
        self.repository.update_plan(&plan)?;
        info!(target: "engine::planner", %plan_id, "optimization plan submitted for approval");
        Ok(plan)
    }

    pub fn get_plan(&self, plan_id: &str) -> AppResult<OptimizationPlan> {
        self.repository
            .plan(plan_id)?
            .ok_or_else(|| AppError::not_found("optimization plan", plan_id))
    }

    pub fn list_plans(&self) -> AppResult<Vec<OptimizationPlan>> {
        Ok(self.repository.plans()?.items)
    }
}

/// Builds a draft plan from findings. No focus areas means every kind is included.
pub fn synthesize_plan(
    findings: &[ResourceInefficiency],
    focus_areas: &[FocusArea],
    constraints: PlanConstraints,
    tutors: &[Tutor],
    settings: &EngineSettings,
) -> OptimizationPlan {
    let kinds: HashSet<InefficiencyKind> = focus_areas.iter().map(FocusArea::kind).collect();
    let included: Vec<&ResourceInefficiency> = findings
        .iter()
        .filter(|finding| kinds.is_empty() || kinds.contains(&finding.kind))
        .collect();

    let changes = included
        .iter()
        .filter_map(|finding| change_for(finding, tutors))
        .collect();

    let count = |kind: InefficiencyKind| included.iter().filter(|f| f.kind == kind).count() as f64;
    let estimated_impact = EstimatedImpact {
        workload_reduction: (settings.workload_reduction_per_finding
            * count(InefficiencyKind::OverloadedTutor))
        .min(100.0),
        balance_improvement: (settings.balance_improvement_per_finding
            * count(InefficiencyKind::UnbalancedGroup))
        .min(100.0),
        resource_utilization: ((1.0
            - count(InefficiencyKind::UnderutilizedTutor) / settings.utilization_divisor)
            * 100.0)
            .max(0.0),
    };

    let mut unique_focus = Vec::new();
    for area in focus_areas {
        if !unique_focus.contains(area) {
            unique_focus.push(*area);
        }
    }

    OptimizationPlan {
        id: Uuid::new_v4().to_string(),
        status: PlanStatus::Draft,
        focus_areas: unique_focus,
        constraints,
        changes,
        estimated_impact,
        created_at: Utc::now().to_rfc3339(),
        applied_at: None,
    }
}

/// Placeholder destination heuristic: the first active tutor other than `exclude_tutor_id`.
pub fn first_available_candidate<'a>(tutors: &'a [Tutor], exclude_tutor_id: &str) -> Option<&'a Tutor> {
    tutors
        .iter()
        .find(|tutor| tutor.is_active() && tutor.id != exclude_tutor_id)
}

fn change_for(finding: &ResourceInefficiency, tutors: &[Tutor]) -> Option<OptimizationChange> {
    match (&finding.kind, &finding.subject) {
        (
            InefficiencyKind::OverloadedTutor,
            InefficiencySubject::Tutor {
                tutor_id,
                session_ids,
                ..
            },
        ) => {
            let Some(session_id) = session_ids.first() else {
                debug!(target: "engine::planner", %tutor_id, "overloaded tutor has no movable session");
                return None;
            };
            let Some(destination) = first_available_candidate(tutors, tutor_id) else {
                debug!(target: "engine::planner", %tutor_id, "no other active tutor to take a session");
                return None;
            };
            Some(OptimizationChange {
                resource_id: session_id.clone(),
                reason: format!(
                    "Tutor {tutor_id} is overloaded; move session {session_id} to {}",
                    destination.id
                ),
                action: ChangeAction::ReallocateSession {
                    session_id: session_id.clone(),
                    from_tutor_id: tutor_id.clone(),
                    to_tutor_id: destination.id.clone(),
                },
            })
        }
        (InefficiencyKind::UnbalancedGroup, InefficiencySubject::Class { class_id, .. }) => {
            Some(OptimizationChange {
                resource_id: class_id.clone(),
                reason: finding.description.clone(),
                action: ChangeAction::AdjustGroupSize {
                    class_id: class_id.clone(),
                },
            })
        }
        (
            InefficiencyKind::ResourceConflict,
            InefficiencySubject::SessionPair {
                first_session_id,
                second_session_id,
                ..
            },
        ) => Some(OptimizationChange {
            resource_id: second_session_id.clone(),
            reason: format!(
                "Session {second_session_id} overlaps {first_session_id}; pick a new time"
            ),
            action: ChangeAction::ModifySchedule {
                session_id: second_session_id.clone(),
                conflicting_session_id: first_session_id.clone(),
            },
        }),
        _ => None,
    }
}
