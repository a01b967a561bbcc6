use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

/// Holds the file writer's guard once a subscriber is installed; its presence
/// marks logging as initialized.
static LOGGER_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

const DEFAULT_LOG_DIRECTIVES: &str =
    "info,engine::planner=debug,engine::applier=debug,engine::db=info";
const LOG_FILE_PREFIX: &str = "scheduling-engine.log";

/// Installs the global subscriber: a daily rolling file under `log_dir` plus
/// stderr. Repeated calls are no-ops. `RUST_LOG` overrides the default filter.
pub fn init_logging(log_dir: &Path) -> AppResult<()> {
    init_into(&LOGGER_GUARD, log_dir)
}

fn init_into(slot: &OnceCell<WorkerGuard>, log_dir: &Path) -> AppResult<()> {
    slot.get_or_try_init(|| {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))
            .map_err(|err| AppError::other(format!("failed to parse log filter: {err}")))?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339()),
            )
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_timer(UtcTime::rfc_3339()),
            )
            .try_init()
            .map_err(|err| AppError::other(format!("failed to install subscriber: {err}")))?;

        // only kept once the subscriber owning the writer is live
        Ok(guard)
    })
    .map(|_| ())
}
