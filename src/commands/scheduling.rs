use serde::Deserialize;
use tracing::info;

use crate::models::inefficiency::InefficiencyReport;
use crate::models::optimization::{ApplyPlanInput, ApplyResult, BuildPlanInput, OptimizationPlan};
use crate::models::settings::{EngineSettings, SettingsUpdateInput};
use crate::models::workload::ResourceAllocation;

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateWindowPayload {
    pub tutor_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub exclude_session_id: Option<String>,
}

pub async fn scheduling_compute_workload(
    state: &AppState,
    tutor_id: String,
) -> CommandResult<ResourceAllocation> {
    let service = state.workload();
    run_blocking(move || service.compute_workload(&tutor_id)).await
}

pub async fn scheduling_validate_window(
    state: &AppState,
    payload: ValidateWindowPayload,
) -> CommandResult<()> {
    let detector = state.conflicts();
    run_blocking(move || {
        detector.validate_proposed_window(
            &payload.tutor_id,
            &payload.start_time,
            &payload.end_time,
            payload.exclude_session_id.as_deref(),
        )
    })
    .await
}

pub async fn scheduling_find_inefficiencies(state: &AppState) -> CommandResult<InefficiencyReport> {
    let analyzer = state.analyzer();
    run_blocking(move || analyzer.find_inefficiencies()).await
}

pub async fn scheduling_build_plan(
    state: &AppState,
    payload: BuildPlanInput,
) -> CommandResult<OptimizationPlan> {
    let planner = state.planner();
    let plan = run_blocking(move || planner.build_plan(payload)).await?;
    info!(target: "engine::command", plan_id = %plan.id, "plan built via command");
    Ok(plan)
}

pub async fn scheduling_submit_plan(
    state: &AppState,
    plan_id: String,
) -> CommandResult<OptimizationPlan> {
    let planner = state.planner();
    run_blocking(move || planner.submit_plan(&plan_id)).await
}

pub async fn scheduling_apply_plan(
    state: &AppState,
    payload: ApplyPlanInput,
) -> CommandResult<ApplyResult> {
    let applier = state.applier();
    let result =
        run_blocking(move || applier.apply_plan(&payload.plan_id, &payload.change_ids)).await?;
    info!(
        target: "engine::command",
        plan_id = %result.plan.id,
        complete = result.is_complete(),
        "plan applied via command"
    );
    Ok(result)
}

pub async fn scheduling_settings_get(state: &AppState) -> CommandResult<EngineSettings> {
    let settings = state.settings();
    run_blocking(move || settings.get()).await
}

pub async fn scheduling_settings_update(
    state: &AppState,
    payload: SettingsUpdateInput,
) -> CommandResult<EngineSettings> {
    let settings = state.settings();
    run_blocking(move || settings.update(payload)).await
}
