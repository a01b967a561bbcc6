mod support;

use support::{ts, Fixture, MONDAY};
use tutorhub_engine::commands::scheduling::{self, ValidateWindowPayload};
use tutorhub_engine::models::optimization::{ApplyPlanInput, BuildPlanInput, PlanStatus};
use tutorhub_engine::models::settings::SettingsUpdateInput;
use tutorhub_engine::models::workload::WorkloadTier;

fn seeded() -> Fixture {
    let fx = Fixture::new();
    fx.tutor("t-1", "active")
        .tutor("t-2", "active")
        .availability("av-1", "t-1", &[("monday", "08:00", "17:00")])
        .session("s-1", "t-1", MONDAY, "09:00", "10:00", 60, "confirmed", &["a"])
        .class("c-1", "t-2", "friday", "10:00", "11:00", 60, 4, "active")
        .enroll_many("c-1", 4);
    fx
}

#[tokio::test]
async fn test_compute_workload_command() {
    let fx = seeded();
    let allocation = scheduling::scheduling_compute_workload(&fx.state, "t-1".to_string())
        .await
        .unwrap();
    assert_eq!(allocation.tier, WorkloadTier::Low);

    let missing = scheduling::scheduling_compute_workload(&fx.state, "ghost".to_string())
        .await
        .unwrap_err();
    assert_eq!(missing.code, "NOT_FOUND");
}

#[tokio::test]
async fn test_validate_window_command_reports_reason() {
    let fx = seeded();
    let payload = |start: &str, end: &str| ValidateWindowPayload {
        tutor_id: "t-1".to_string(),
        start_time: ts(MONDAY, start),
        end_time: ts(MONDAY, end),
        exclude_session_id: None,
    };

    scheduling::scheduling_validate_window(&fx.state, payload("11:00", "12:00"))
        .await
        .unwrap();

    let rejected = scheduling::scheduling_validate_window(&fx.state, payload("10:15", "11:00"))
        .await
        .unwrap_err();
    assert_eq!(rejected.code, "VALIDATION_ERROR");
    let details = rejected.details.unwrap();
    assert_eq!(details["reason"], "SESSION_OVERLAP");

    let malformed = scheduling::scheduling_validate_window(
        &fx.state,
        ValidateWindowPayload {
            tutor_id: "t-1".to_string(),
            start_time: "9am".to_string(),
            end_time: ts(MONDAY, "10:00"),
            exclude_session_id: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(malformed.code, "INVALID_FORMAT");
}

#[tokio::test]
async fn test_plan_lifecycle_commands() {
    let fx = seeded();

    let report = scheduling::scheduling_find_inefficiencies(&fx.state).await.unwrap();
    assert!(!report.findings.is_empty());

    let plan = scheduling::scheduling_build_plan(&fx.state, BuildPlanInput::default())
        .await
        .unwrap();
    let submitted = scheduling::scheduling_submit_plan(&fx.state, plan.id.clone())
        .await
        .unwrap();
    assert_eq!(submitted.status, PlanStatus::Pending);

    let input = ApplyPlanInput {
        plan_id: plan.id.clone(),
        change_ids: plan.changes.iter().map(|c| c.resource_id.clone()).collect(),
    };
    let result = scheduling::scheduling_apply_plan(&fx.state, input.clone())
        .await
        .unwrap();
    assert_eq!(result.plan.status, PlanStatus::Applied);

    let again = scheduling::scheduling_apply_plan(&fx.state, input)
        .await
        .unwrap_err();
    assert_eq!(again.code, "INVALID_STATE");
}

#[tokio::test]
async fn test_settings_commands() {
    let fx = seeded();
    let defaults = scheduling::scheduling_settings_get(&fx.state).await.unwrap();
    assert_eq!(defaults.buffer_minutes, 30);

    let updated = scheduling::scheduling_settings_update(
        &fx.state,
        SettingsUpdateInput {
            buffer_minutes: Some(0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.buffer_minutes, 0);

    let rejected = scheduling::scheduling_settings_update(
        &fx.state,
        SettingsUpdateInput {
            buffer_minutes: Some(-5),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(rejected.code, "VALIDATION_ERROR");
    assert_eq!(rejected.details.unwrap()["reason"], "INVALID_SETTINGS");
}
