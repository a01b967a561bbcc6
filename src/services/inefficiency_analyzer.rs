use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::error::AppResult;
use crate::models::inefficiency::{
    InefficiencyKind, InefficiencyReport, InefficiencySubject, ResourceInefficiency, Severity,
};
use crate::models::settings::EngineSettings;
use crate::models::workload::{ResourceAllocation, WorkloadTier};
use crate::services::conflict_detector::{self, SessionConflict};
use crate::services::settings_service::SettingsService;
use crate::services::workload_service::WorkloadService;

/// Scans tutors, classes and active sessions for systemic scheduling problems.
///
/// The passes read the whole population without a transaction, so a record
/// written mid-scan may or may not be reflected in the report.
pub struct InefficiencyAnalyzer {
    repository: SchedulingRepository,
    workload: Arc<WorkloadService>,
    settings: Arc<SettingsService>,
}

impl InefficiencyAnalyzer {
    pub fn new(
        repository: SchedulingRepository,
        workload: Arc<WorkloadService>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            repository,
            workload,
            settings,
        }
    }

    pub fn find_inefficiencies(&self) -> AppResult<InefficiencyReport> {
        let settings = self.settings.get()?;
        let mut findings = Vec::new();
        let mut skipped = 0;

        let snapshot = self.workload.compute_all()?;
        skipped += snapshot.skipped;
        findings.extend(
            snapshot
                .allocations
                .iter()
                .filter_map(|allocation| evaluate_tutor_load(allocation, &settings)),
        );

        let classes = self.repository.classes()?;
        let enrollments = self.repository.enrollments()?;
        skipped += classes.skipped + enrollments.skipped;

        let mut enrollment_counts: HashMap<&str, u32> = HashMap::new();
        for enrollment in enrollments.items.iter().filter(|e| e.is_active()) {
            *enrollment_counts.entry(enrollment.class_id.as_str()).or_default() += 1;
        }

        for class in classes.items.iter().filter(|class| class.is_scheduled()) {
            let enrolled = enrollment_counts.get(class.id.as_str()).copied().unwrap_or(0);
            if let Some(finding) =
                evaluate_class_balance(&class.id, &class.tutor_id, enrolled, class.max_students, &settings)
            {
                findings.push(finding);
            }
        }

        let sessions = self.repository.sessions()?;
        let scan = conflict_detector::scan_session_conflicts(&sessions.items);
        skipped += sessions.skipped + scan.skipped;
        findings.extend(scan.conflicts.iter().map(conflict_finding));

        info!(
            target: "engine::analyzer",
            findings = findings.len(),
            skipped,
            "inefficiency analysis completed"
        );

        Ok(InefficiencyReport {
            generated_at: Utc::now().to_rfc3339(),
            findings,
            skipped_records: skipped,
        })
    }
}

pub fn evaluate_tutor_load(
    allocation: &ResourceAllocation,
    settings: &EngineSettings,
) -> Option<ResourceInefficiency> {
    let subject = InefficiencySubject::Tutor {
        tutor_id: allocation.tutor_id.clone(),
        session_ids: allocation.session_ids.clone(),
        total_hours: allocation.total_hours,
        student_count: allocation.student_count,
    };

    let (kind, severity, description, actions) = match allocation.tier {
        WorkloadTier::Overloaded | WorkloadTier::High => (
            InefficiencyKind::OverloadedTutor,
            if allocation.tier == WorkloadTier::Overloaded {
                Severity::High
            } else {
                Severity::Medium
            },
            format!(
                "Tutor {} carries {:.1} hours and {} students ({} workload)",
                allocation.tutor_id, allocation.total_hours, allocation.student_count, allocation.tier
            ),
            vec![
                "Move some sessions to a tutor with spare capacity".to_string(),
                "Pause new bookings for this tutor".to_string(),
            ],
        ),
        WorkloadTier::Low if allocation.total_hours < settings.underutilized_hours => (
            InefficiencyKind::UnderutilizedTutor,
            Severity::Low,
            format!(
                "Tutor {} has only {:.1} committed hours",
                allocation.tutor_id, allocation.total_hours
            ),
            vec![
                "Route new bookings to this tutor".to_string(),
                "Offer this tutor an additional class".to_string(),
            ],
        ),
        _ => return None,
    };

    Some(ResourceInefficiency {
        id: Uuid::new_v4().to_string(),
        kind,
        severity,
        description,
        affected_ids: vec![allocation.tutor_id.clone()],
        subject,
        suggested_actions: actions,
    })
}

/// Flags classes that are nearly empty (but not empty) or at/over capacity.
pub fn evaluate_class_balance(
    class_id: &str,
    tutor_id: &str,
    enrollment_count: u32,
    max_students: u32,
    settings: &EngineSettings,
) -> Option<ResourceInefficiency> {
    // a zero-capacity class with any roster, or none, counts as over capacity
    let (severity, description, actions) = if enrollment_count >= max_students {
        (
            Severity::High,
            format!("Class {class_id} is at or over capacity ({enrollment_count}/{max_students})"),
            vec![
                "Raise the class capacity".to_string(),
                "Open a parallel class for the overflow".to_string(),
            ],
        )
    } else {
        let ratio = enrollment_count as f64 / max_students as f64;
        if ratio >= settings.low_enrollment_ratio || enrollment_count == 0 {
            return None;
        }
        let severity = if ratio < settings.critical_enrollment_ratio {
            Severity::High
        } else {
            Severity::Medium
        };
        (
            severity,
            format!(
                "Class {class_id} is only {:.0}% full ({enrollment_count}/{max_students})",
                ratio * 100.0
            ),
            vec![
                "Merge with another section of the same subject".to_string(),
                "Promote the class to waiting students".to_string(),
            ],
        )
    };

    Some(ResourceInefficiency {
        id: Uuid::new_v4().to_string(),
        kind: InefficiencyKind::UnbalancedGroup,
        severity,
        description,
        affected_ids: vec![class_id.to_string(), tutor_id.to_string()],
        subject: InefficiencySubject::Class {
            class_id: class_id.to_string(),
            tutor_id: tutor_id.to_string(),
            enrollment_count,
            max_students,
        },
        suggested_actions: actions,
    })
}

fn conflict_finding(conflict: &SessionConflict) -> ResourceInefficiency {
    ResourceInefficiency {
        id: Uuid::new_v4().to_string(),
        kind: InefficiencyKind::ResourceConflict,
        severity: Severity::High,
        description: format!(
            "Tutor {} is double-booked on {}: {} ({}) overlaps {} ({})",
            conflict.tutor_id,
            conflict.date,
            conflict.first_session_id,
            conflict.first_subject,
            conflict.second_session_id,
            conflict.second_subject
        ),
        affected_ids: vec![
            conflict.tutor_id.clone(),
            conflict.first_session_id.clone(),
            conflict.second_session_id.clone(),
        ],
        subject: InefficiencySubject::SessionPair {
            tutor_id: conflict.tutor_id.clone(),
            first_session_id: conflict.first_session_id.clone(),
            second_session_id: conflict.second_session_id.clone(),
        },
        suggested_actions: vec![
            "Reschedule one of the sessions".to_string(),
            "Reassign one session to another tutor".to_string(),
        ],
    }
}
