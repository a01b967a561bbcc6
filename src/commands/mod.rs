pub mod scheduling;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{error, warn};

use crate::db::repositories::record_store::RecordStore;
use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::db::repositories::sqlite_store::SqliteRecordStore;
use crate::db::DbPool;
use crate::error::AppError;
use crate::services::change_applier::ChangeApplier;
use crate::services::conflict_detector::ConflictDetector;
use crate::services::inefficiency_analyzer::InefficiencyAnalyzer;
use crate::services::optimization_planner::OptimizationPlanner;
use crate::services::settings_service::SettingsService;
use crate::services::workload_service::WorkloadService;

/// Service graph shared by every command. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    repository: SchedulingRepository,
    settings_service: Arc<SettingsService>,
    workload_service: Arc<WorkloadService>,
    conflict_detector: Arc<ConflictDetector>,
    inefficiency_analyzer: Arc<InefficiencyAnalyzer>,
    optimization_planner: Arc<OptimizationPlanner>,
    change_applier: Arc<ChangeApplier>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let repository = SchedulingRepository::new(store);
        let settings_service = Arc::new(SettingsService::new(repository.clone()));
        let workload_service = Arc::new(WorkloadService::new(
            repository.clone(),
            Arc::clone(&settings_service),
        ));
        let conflict_detector = Arc::new(ConflictDetector::new(
            repository.clone(),
            Arc::clone(&settings_service),
        ));
        let inefficiency_analyzer = Arc::new(InefficiencyAnalyzer::new(
            repository.clone(),
            Arc::clone(&workload_service),
            Arc::clone(&settings_service),
        ));
        let optimization_planner = Arc::new(OptimizationPlanner::new(
            repository.clone(),
            Arc::clone(&inefficiency_analyzer),
            Arc::clone(&settings_service),
        ));
        let change_applier = Arc::new(ChangeApplier::new(repository.clone()));

        Self {
            repository,
            settings_service,
            workload_service,
            conflict_detector,
            inefficiency_analyzer,
            optimization_planner,
            change_applier,
        }
    }

    /// State backed by the SQLite record store at `pool`.
    pub fn from_db_pool(pool: DbPool) -> Self {
        Self::new(Arc::new(SqliteRecordStore::new(pool)))
    }

    pub fn repository(&self) -> SchedulingRepository {
        self.repository.clone()
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn workload(&self) -> Arc<WorkloadService> {
        Arc::clone(&self.workload_service)
    }

    pub fn conflicts(&self) -> Arc<ConflictDetector> {
        Arc::clone(&self.conflict_detector)
    }

    pub fn analyzer(&self) -> Arc<InefficiencyAnalyzer> {
        Arc::clone(&self.inefficiency_analyzer)
    }

    pub fn planner(&self) -> Arc<OptimizationPlanner> {
        Arc::clone(&self.optimization_planner)
    }

    pub fn applier(&self) -> Arc<ChangeApplier> {
        Arc::clone(&self.change_applier)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                code,
                message,
                details,
            } => {
                let details = match details {
                    Some(JsonValue::Object(mut map)) => {
                        map.insert("reason".to_string(), json!(code));
                        JsonValue::Object(map)
                    }
                    Some(other) => json!({ "reason": code, "info": other }),
                    None => json!({ "reason": code }),
                };
                CommandError::new("VALIDATION_ERROR", message, Some(details))
            }
            AppError::NotFound { entity, id } => CommandError::new(
                "NOT_FOUND",
                format!("{entity} not found: {id}"),
                Some(json!({ "entity": entity, "id": id })),
            ),
            AppError::InvalidFormat { message } => {
                CommandError::new("INVALID_FORMAT", message, None)
            }
            AppError::InvalidState { message } => {
                warn!(target: "engine::command", %message, "invalid state in command");
                CommandError::new("INVALID_STATE", message, None)
            }
            AppError::Database { message } => {
                error!(target: "engine::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "engine::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "engine::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "filesystem access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "engine::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("task failed to run: {err}"), None))?
        .map_err(CommandError::from)
}
