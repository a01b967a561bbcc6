use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::error::{AppError, AppResult};
use crate::models::optimization::{
    ApplyResult, ChangeAction, ChangeRef, FailedChange, OptimizationChange, PlanStatus,
};

/// Extra seats added above current enrollment when a group is resized.
const GROUP_SIZE_HEADROOM: u32 = 2;

enum ChangeOutcome {
    Applied,
    Deferred,
}

/// Executes the selected changes of an approved plan against the store.
pub struct ChangeApplier {
    repository: SchedulingRepository,
}

impl ChangeApplier {
    pub fn new(repository: SchedulingRepository) -> Self {
        Self { repository }
    }

    /// Applies the changes whose `resource_id` is listed in `change_ids`, in
    /// plan order. Individual failures are collected rather than aborting the
    /// batch, and the plan ends up applied either way.
    pub fn apply_plan(&self, plan_id: &str, change_ids: &[String]) -> AppResult<ApplyResult> {
        let mut plan = self
            .repository
            .plan(plan_id)?
            .ok_or_else(|| AppError::not_found("optimization plan", plan_id))?;

        if !plan.status.can_apply() {
            return Err(AppError::invalid_state(format!(
                "plan {plan_id} is {} and cannot be applied again",
                plan.status
            )));
        }

        let selected: HashSet<&str> = change_ids.iter().map(String::as_str).collect();
        let known: HashSet<&str> = plan.changes.iter().map(|c| c.resource_id.as_str()).collect();
        for id in selected.difference(&known) {
            debug!(target: "engine::applier", %plan_id, change_id = %id, "selected id matches no change");
        }

        let mut applied = Vec::new();
        let mut deferred = Vec::new();
        let mut failed = Vec::new();

        for change in plan
            .changes
            .iter()
            .filter(|change| selected.contains(change.resource_id.as_str()))
        {
            let change_ref = ChangeRef {
                resource_id: change.resource_id.clone(),
                change_type: change.action.type_name().to_string(),
            };
            match self.apply_change(change) {
                Ok(ChangeOutcome::Applied) => applied.push(change_ref),
                Ok(ChangeOutcome::Deferred) => {
                    debug!(
                        target: "engine::applier",
                        resource_id = %change.resource_id,
                        "schedule change needs a new time and was deferred"
                    );
                    deferred.push(change_ref);
                }
                Err(err) => {
                    warn!(
                        target: "engine::applier",
                        %plan_id,
                        resource_id = %change.resource_id,
                        change_type = change.action.type_name(),
                        error = %err,
                        "change failed to apply"
                    );
                    failed.push(FailedChange {
                        resource_id: change_ref.resource_id,
                        change_type: change_ref.change_type,
                        reason: err.to_string(),
                    });
                }
            }
        }

        plan.status = PlanStatus::Applied;
        plan.applied_at = Some(Utc::now().to_rfc3339());
        self.repository.update_plan(&plan)?;

        info!(
            target: "engine::applier",
            %plan_id,
            applied = applied.len(),
            deferred = deferred.len(),
            failed = failed.len(),
            "optimization plan applied"
        );

        Ok(ApplyResult {
            plan,
            applied,
            deferred,
            failed,
        })
    }

    fn apply_change(&self, change: &OptimizationChange) -> AppResult<ChangeOutcome> {
        match &change.action {
            ChangeAction::ReallocateSession {
                session_id,
                to_tutor_id,
                ..
            } => self.reallocate_session(session_id, to_tutor_id),
            ChangeAction::ReallocateStudent {
                student_id,
                to_class_id,
                ..
            } => self.reallocate_student(student_id, to_class_id),
            ChangeAction::AdjustGroupSize { class_id } => self.adjust_group_size(class_id),
            ChangeAction::ModifySchedule { .. } => Ok(ChangeOutcome::Deferred),
        }
    }

    fn reallocate_session(&self, session_id: &str, to_tutor_id: &str) -> AppResult<ChangeOutcome> {
        if self.repository.session(session_id)?.is_none() {
            return Err(AppError::not_found("session", session_id));
        }
        if self.repository.tutor(to_tutor_id)?.is_none() {
            return Err(AppError::not_found("tutor", to_tutor_id));
        }
        self.repository.assign_session_tutor(session_id, to_tutor_id)?;
        Ok(ChangeOutcome::Applied)
    }

    fn reallocate_student(&self, student_id: &str, to_class_id: &str) -> AppResult<ChangeOutcome> {
        let enrollment = self
            .repository
            .active_enrollments_for_student(student_id)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("active enrollment", student_id))?;
        if self.repository.class(to_class_id)?.is_none() {
            return Err(AppError::not_found("class", to_class_id));
        }
        self.repository.move_enrollment(&enrollment.id, to_class_id)?;
        Ok(ChangeOutcome::Applied)
    }

    fn adjust_group_size(&self, class_id: &str) -> AppResult<ChangeOutcome> {
        let class = self
            .repository
            .class(class_id)?
            .ok_or_else(|| AppError::not_found("class", class_id))?;
        let enrolled = self.repository.active_enrollments_for_class(class_id)?.len() as u32;
        let max_students = class.max_students.max(enrolled + GROUP_SIZE_HEADROOM);
        self.repository
            .set_class_capacity(class_id, max_students, enrolled)?;
        Ok(ChangeOutcome::Applied)
    }
}
