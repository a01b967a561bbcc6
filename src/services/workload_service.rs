use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::error::{AppError, AppResult};
use crate::models::class::Enrollment;
use crate::models::session::SessionStatus;
use crate::models::settings::{EngineSettings, TierThresholds};
use crate::models::workload::{ResourceAllocation, WorkloadTier};
use crate::services::schedule_utils;
use crate::services::settings_service::SettingsService;

/// Allocations for a whole tutor population plus the rows that were left out.
#[derive(Debug, Clone)]
pub struct WorkloadSnapshot {
    pub allocations: Vec<ResourceAllocation>,
    pub skipped: usize,
}

/// Aggregates committed sessions and semester-long classes into a workload tier.
pub struct WorkloadService {
    repository: SchedulingRepository,
    settings: Arc<SettingsService>,
}

impl WorkloadService {
    pub fn new(repository: SchedulingRepository, settings: Arc<SettingsService>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn compute_workload(&self, tutor_id: &str) -> AppResult<ResourceAllocation> {
        if self.repository.tutor(tutor_id)?.is_none() {
            return Err(AppError::not_found("tutor", tutor_id));
        }

        let settings = self.settings.get()?;
        let enrollments = self.repository.enrollments()?;
        let class_students = students_by_class(&enrollments.items);
        let (allocation, skipped) = self.compute_for(tutor_id, &class_students, &settings)?;

        if skipped > 0 {
            warn!(target: "engine::workload", %tutor_id, skipped, "ignored malformed records while computing workload");
        }
        Ok(allocation)
    }

    /// Computes an allocation for every tutor, reading enrollments only once.
    pub fn compute_all(&self) -> AppResult<WorkloadSnapshot> {
        let settings = self.settings.get()?;
        let tutors = self.repository.tutors()?;
        let enrollments = self.repository.enrollments()?;
        let class_students = students_by_class(&enrollments.items);

        let mut skipped = tutors.skipped + enrollments.skipped;
        let mut allocations = Vec::with_capacity(tutors.items.len());
        for tutor in &tutors.items {
            let (allocation, tutor_skipped) =
                self.compute_for(&tutor.id, &class_students, &settings)?;
            skipped += tutor_skipped;
            allocations.push(allocation);
        }

        info!(
            target: "engine::workload",
            tutors = allocations.len(),
            skipped,
            "computed workload for tutor population"
        );
        Ok(WorkloadSnapshot {
            allocations,
            skipped,
        })
    }

    fn compute_for(
        &self,
        tutor_id: &str,
        class_students: &HashMap<String, Vec<String>>,
        settings: &EngineSettings,
    ) -> AppResult<(ResourceAllocation, usize)> {
        let sessions = self.repository.sessions_for_tutor(tutor_id)?;
        let classes = self.repository.classes_for_tutor(tutor_id)?;
        let mut skipped = sessions.skipped + classes.skipped;

        let mut students = BTreeSet::new();
        let mut session_ids = Vec::new();
        let mut session_hours = 0.0;

        for session in sessions
            .items
            .iter()
            .filter(|session| session.status != SessionStatus::Cancelled)
        {
            session_ids.push(session.id.clone());
            students.extend(session.student_ids.iter().cloned());
            if session.status.counts_toward_hours() {
                session_hours += session.duration_minutes.max(0) as f64 / 60.0;
            }
        }

        let mut class_ids = Vec::new();
        let mut class_hours = 0.0;

        for class in classes.items.iter().filter(|class| class.is_scheduled()) {
            let semester = schedule_utils::parse_date(&class.semester_start).and_then(|start| {
                schedule_utils::parse_date(&class.semester_end).map(|end| (start, end))
            });
            let (start, end) = match semester {
                Ok(range) => range,
                Err(err) => {
                    skipped += 1;
                    warn!(target: "engine::workload", class_id = %class.id, error = %err, "skipping class with unreadable semester");
                    continue;
                }
            };

            let weeks = schedule_utils::weeks_between(start, end);
            class_hours += class.duration_minutes.max(0) as f64 / 60.0 * weeks as f64;
            class_ids.push(class.id.clone());

            if let Some(enrolled) = class_students.get(&class.id) {
                students.extend(enrolled.iter().cloned());
            }
        }

        let total_hours = session_hours + class_hours;
        let student_count = students.len();
        let tier = classify_tier(total_hours, student_count, settings);

        debug!(
            target: "engine::workload",
            %tutor_id,
            session_hours,
            class_hours,
            student_count,
            tier = %tier,
            "workload computed"
        );

        Ok((
            ResourceAllocation {
                tutor_id: tutor_id.to_string(),
                session_ids,
                class_ids,
                total_hours,
                student_count,
                tier,
                computed_at: Utc::now().to_rfc3339(),
            },
            skipped,
        ))
    }
}

/// First matching rule wins, evaluated from the heaviest tier down.
pub fn classify_tier(total_hours: f64, student_count: usize, settings: &EngineSettings) -> WorkloadTier {
    let exceeds = |thresholds: &TierThresholds| {
        total_hours > thresholds.hours || student_count > thresholds.students
    };

    if exceeds(&settings.overloaded) {
        WorkloadTier::Overloaded
    } else if exceeds(&settings.high) {
        WorkloadTier::High
    } else if exceeds(&settings.medium) {
        WorkloadTier::Medium
    } else {
        WorkloadTier::Low
    }
}

fn students_by_class(enrollments: &[Enrollment]) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for enrollment in enrollments.iter().filter(|e| e.is_active()) {
        map.entry(enrollment.class_id.clone())
            .or_default()
            .push(enrollment.student_id.clone());
    }
    map
}
