mod support;

use chrono::Utc;
use support::{Fixture, MONDAY};
use tutorhub_engine::models::inefficiency::{InefficiencyKind, Severity};
use tutorhub_engine::models::optimization::{
    BuildPlanInput, ChangeAction, EstimatedImpact, FocusArea, OptimizationChange,
    OptimizationPlan, PlanConstraints, PlanStatus,
};
use tutorhub_engine::AppError;

/// One overloaded tutor, one idle tutor with a double booking, and a nearly
/// empty class owned by an inactive tutor.
fn seeded() -> Fixture {
    let fx = Fixture::new();
    fx.tutor("t-busy", "active")
        .tutor("t-idle", "active")
        .tutor("t-off", "inactive");

    for n in 0..7 {
        fx.session(
            &format!("busy-{n}"),
            "t-busy",
            &format!("2025-02-0{}", n + 3),
            "08:00",
            "13:00",
            300,
            "completed",
            &["learner"],
        );
    }

    fx.session("i-1", "t-idle", MONDAY, "09:00", "10:00", 60, "confirmed", &["x"])
        .session("i-2", "t-idle", MONDAY, "09:30", "10:30", 60, "confirmed", &["y"]);

    fx.class("c-small", "t-off", "monday", "15:00", "16:00", 60, 20, "active")
        .enroll_many("c-small", 3);
    fx
}

fn manual_plan(changes: Vec<OptimizationChange>) -> OptimizationPlan {
    OptimizationPlan {
        id: format!("plan-{}", changes.len()),
        status: PlanStatus::Draft,
        focus_areas: vec![],
        constraints: PlanConstraints::default(),
        changes,
        estimated_impact: EstimatedImpact {
            workload_reduction: 0.0,
            balance_improvement: 0.0,
            resource_utilization: 100.0,
        },
        created_at: Utc::now().to_rfc3339(),
        applied_at: None,
    }
}

#[test]
fn test_analysis_reports_every_kind() {
    let fx = seeded();
    let report = fx.state.analyzer().find_inefficiencies().unwrap();

    let summary: Vec<_> = report
        .findings
        .iter()
        .map(|f| (f.kind, f.severity, f.affected_ids.clone()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (InefficiencyKind::OverloadedTutor, Severity::High, vec!["t-busy".to_string()]),
            (InefficiencyKind::UnderutilizedTutor, Severity::Low, vec!["t-idle".to_string()]),
            (
                InefficiencyKind::UnbalancedGroup,
                Severity::High,
                vec!["c-small".to_string(), "t-off".to_string()]
            ),
            (
                InefficiencyKind::ResourceConflict,
                Severity::High,
                vec!["t-idle".to_string(), "i-1".to_string(), "i-2".to_string()]
            ),
        ]
    );
    assert_eq!(report.skipped_records, 0);
}

#[test]
fn test_unbalanced_class_thresholds() {
    for (enrolled, expected) in [(3, Some(Severity::High)), (5, Some(Severity::Medium)), (7, None)] {
        let fx = Fixture::new();
        fx.tutor("t-1", "active")
            .class("c-1", "t-1", "friday", "10:00", "11:00", 60, 20, "active")
            .enroll_many("c-1", enrolled);

        let report = fx.state.analyzer().find_inefficiencies().unwrap();
        let severity = report
            .findings
            .iter()
            .find(|f| f.kind == InefficiencyKind::UnbalancedGroup)
            .map(|f| f.severity);
        assert_eq!(severity, expected, "{enrolled} of 20 enrolled");
    }
}

#[test]
fn test_zero_capacity_and_full_classes_are_flagged() {
    let fx = Fixture::new();
    fx.tutor("t-1", "active")
        .class("c-zero", "t-1", "friday", "10:00", "11:00", 60, 0, "active")
        .enroll_many("c-zero", 3)
        .class("c-full", "t-1", "friday", "12:00", "13:00", 60, 2, "full")
        .enroll_many("c-full", 2);

    let report = fx.state.analyzer().find_inefficiencies().unwrap();
    assert_eq!(report.skipped_records, 0);

    let unbalanced: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.kind == InefficiencyKind::UnbalancedGroup)
        .collect();
    assert_eq!(unbalanced.len(), 2);
    assert!(unbalanced.iter().all(|f| f.severity == Severity::High));
    assert!(unbalanced
        .iter()
        .any(|f| f.affected_ids.first().map(String::as_str) == Some("c-zero")));
}

#[test]
fn test_analysis_is_idempotent() {
    let fx = seeded();
    let analyzer = fx.state.analyzer();

    let strip = |report: tutorhub_engine::models::inefficiency::InefficiencyReport| {
        report
            .findings
            .into_iter()
            .map(|f| (f.kind, f.severity, f.affected_ids, f.subject))
            .collect::<Vec<_>>()
    };

    let first = strip(analyzer.find_inefficiencies().unwrap());
    let second = strip(analyzer.find_inefficiencies().unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_malformed_records_do_not_abort_analysis() {
    let fx = seeded();
    fx.store
        .upsert(
            tutorhub_engine::db::repositories::record_store::Collection::Sessions,
            serde_json::json!({ "id": "broken", "tutorId": 42 }),
        )
        .unwrap();

    let report = fx.state.analyzer().find_inefficiencies().unwrap();
    assert_eq!(report.findings.len(), 4);
    assert!(report.skipped_records >= 1);
}

#[test]
fn test_build_and_apply_full_plan() {
    let fx = seeded();
    let plan = fx.state.planner().build_plan(BuildPlanInput::default()).unwrap();

    assert_eq!(plan.status, PlanStatus::Draft);
    let types: Vec<_> = plan.changes.iter().map(|c| c.action.type_name()).collect();
    assert_eq!(types, vec!["reallocate_session", "adjust_group_size", "modify_schedule"]);
    assert_eq!(
        plan.changes[0].action,
        ChangeAction::ReallocateSession {
            session_id: "busy-0".to_string(),
            from_tutor_id: "t-busy".to_string(),
            to_tutor_id: "t-idle".to_string(),
        }
    );
    assert_eq!(plan.estimated_impact.workload_reduction, 15.0);
    assert_eq!(plan.estimated_impact.balance_improvement, 20.0);
    assert!((plan.estimated_impact.resource_utilization - 90.0).abs() < 1e-9);

    // the draft is persisted
    assert_eq!(fx.state.planner().get_plan(&plan.id).unwrap(), plan);

    let change_ids: Vec<_> = plan.changes.iter().map(|c| c.resource_id.clone()).collect();
    let result = fx.state.applier().apply_plan(&plan.id, &change_ids).unwrap();

    assert_eq!(result.applied.len(), 2);
    assert_eq!(result.deferred.len(), 1);
    assert_eq!(result.deferred[0].resource_id, "i-2");
    assert!(result.is_complete());
    assert_eq!(result.plan.status, PlanStatus::Applied);
    assert!(result.plan.applied_at.is_some());

    let repository = fx.state.repository();
    let moved = repository.session("busy-0").unwrap().unwrap();
    assert_eq!(moved.tutor_id, "t-idle");
    let class = repository.class("c-small").unwrap().unwrap();
    assert_eq!(class.current_enrollment, 3);
    assert_eq!(class.max_students, 20);

    let stored = fx.state.planner().get_plan(&plan.id).unwrap();
    assert_eq!(stored.status, PlanStatus::Applied);
}

#[test]
fn test_applied_plan_cannot_be_applied_again() {
    let fx = seeded();
    let plan = fx.state.planner().build_plan(BuildPlanInput::default()).unwrap();
    fx.state.applier().apply_plan(&plan.id, &[]).unwrap();

    let again = fx.state.applier().apply_plan(&plan.id, &[]);
    assert!(matches!(again, Err(AppError::InvalidState { .. })));
}

#[test]
fn test_first_failure_does_not_stop_the_batch() {
    let fx = seeded();
    let plan = manual_plan(vec![
        OptimizationChange {
            resource_id: "ghost".to_string(),
            reason: "missing session".to_string(),
            action: ChangeAction::ReallocateSession {
                session_id: "ghost".to_string(),
                from_tutor_id: "t-busy".to_string(),
                to_tutor_id: "t-idle".to_string(),
            },
        },
        OptimizationChange {
            resource_id: "c-small".to_string(),
            reason: "resize".to_string(),
            action: ChangeAction::AdjustGroupSize {
                class_id: "c-small".to_string(),
            },
        },
    ]);
    fx.state.repository().insert_plan(&plan).unwrap();

    let result = fx
        .state
        .applier()
        .apply_plan(&plan.id, &["ghost".to_string(), "c-small".to_string()])
        .unwrap();

    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].resource_id, "ghost");
    assert_eq!(result.failed[0].change_type, "reallocate_session");
    assert_eq!(result.applied.len(), 1);
    assert_eq!(result.applied[0].resource_id, "c-small");
    assert!(!result.is_complete());
    assert_eq!(result.plan.status, PlanStatus::Applied);
    assert_eq!(
        fx.state.planner().get_plan(&plan.id).unwrap().status,
        PlanStatus::Applied
    );
}

#[test]
fn test_only_selected_changes_are_applied() {
    let fx = seeded();
    let plan = fx.state.planner().build_plan(BuildPlanInput::default()).unwrap();

    let result = fx
        .state
        .applier()
        .apply_plan(&plan.id, &["c-small".to_string(), "not-in-plan".to_string()])
        .unwrap();

    assert_eq!(result.applied.len(), 1);
    assert!(result.deferred.is_empty());
    let untouched = fx.state.repository().session("busy-0").unwrap().unwrap();
    assert_eq!(untouched.tutor_id, "t-busy");
}

#[test]
fn test_student_reallocation_moves_first_active_enrollment() {
    let fx = seeded();
    fx.class("c-big", "t-off", "tuesday", "15:00", "16:00", 60, 30, "active");
    let plan = manual_plan(vec![OptimizationChange {
        resource_id: "c-small-student-0".to_string(),
        reason: "move".to_string(),
        action: ChangeAction::ReallocateStudent {
            student_id: "c-small-student-0".to_string(),
            from_class_id: "c-small".to_string(),
            to_class_id: "c-big".to_string(),
        },
    }]);
    fx.state.repository().insert_plan(&plan).unwrap();

    let result = fx
        .state
        .applier()
        .apply_plan(&plan.id, &["c-small-student-0".to_string()])
        .unwrap();
    assert!(result.is_complete());

    let repository = fx.state.repository();
    assert_eq!(repository.active_enrollments_for_class("c-big").unwrap().len(), 1);
    assert_eq!(repository.active_enrollments_for_class("c-small").unwrap().len(), 2);
}

#[test]
fn test_focus_areas_limit_the_plan() {
    let fx = seeded();
    let plan = fx
        .state
        .planner()
        .build_plan(BuildPlanInput {
            focus_areas: Some(vec![FocusArea::Workload]),
            constraints: None,
        })
        .unwrap();

    assert_eq!(plan.changes.len(), 1);
    assert_eq!(plan.focus_areas, vec![FocusArea::Workload]);
    assert_eq!(plan.estimated_impact.workload_reduction, 15.0);
    assert_eq!(plan.estimated_impact.balance_improvement, 0.0);
    assert_eq!(plan.estimated_impact.resource_utilization, 100.0);
}

#[test]
fn test_submitted_plan_moves_to_pending_and_still_applies() {
    let fx = seeded();
    let planner = fx.state.planner();
    let plan = planner.build_plan(BuildPlanInput::default()).unwrap();

    let pending = planner.submit_plan(&plan.id).unwrap();
    assert_eq!(pending.status, PlanStatus::Pending);
    assert!(matches!(
        planner.submit_plan(&plan.id),
        Err(AppError::InvalidState { .. })
    ));

    let result = fx.state.applier().apply_plan(&plan.id, &[]).unwrap();
    assert_eq!(result.plan.status, PlanStatus::Applied);
    assert_eq!(planner.list_plans().unwrap().len(), 1);
}

#[test]
fn test_missing_plan_is_not_found() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.state.applier().apply_plan("nope", &[]),
        Err(AppError::NotFound { .. })
    ));
    assert!(matches!(
        fx.state.planner().get_plan("nope"),
        Err(AppError::NotFound { .. })
    ));
}
