use chrono::Utc;
use tracing::{info, warn};

use crate::db::repositories::scheduling_repository::SchedulingRepository;
use crate::error::{AppError, AppResult, ValidationCode};
use crate::models::settings::{EngineSettings, SettingsUpdateInput, TierThresholds};

const MAX_BUFFER_MINUTES: i64 = 240;

/// Engine tunables. Every read goes to the store so updates made through
/// another service instance or process are seen on the next call.
pub struct SettingsService {
    repository: SchedulingRepository,
}

impl SettingsService {
    pub fn new(repository: SchedulingRepository) -> Self {
        Self { repository }
    }

    pub fn get(&self) -> AppResult<EngineSettings> {
        match self.repository.load_settings() {
            Ok(Some(settings)) => Ok(settings),
            Ok(None) => Ok(EngineSettings::default()),
            Err(AppError::InvalidFormat { message }) => {
                warn!(target: "engine::settings", %message, "stored settings unreadable, using defaults");
                Ok(EngineSettings::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<EngineSettings> {
        let mut current = self.get()?;

        if let Some(buffer) = input.buffer_minutes {
            if !(0..=MAX_BUFFER_MINUTES).contains(&buffer) {
                return Err(AppError::validation(
                    ValidationCode::InvalidSettings,
                    format!("buffer minutes must be between 0 and {MAX_BUFFER_MINUTES}"),
                ));
            }
            current.buffer_minutes = buffer;
        }

        if let Some(thresholds) = input.overloaded {
            current.overloaded = thresholds;
        }
        if let Some(thresholds) = input.high {
            current.high = thresholds;
        }
        if let Some(thresholds) = input.medium {
            current.medium = thresholds;
        }
        ensure_tiers_descend(&current.overloaded, &current.high, &current.medium)?;

        if let Some(hours) = input.underutilized_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(AppError::validation(
                    ValidationCode::InvalidSettings,
                    "underutilized hours must be a non-negative number",
                ));
            }
            current.underutilized_hours = hours;
        }

        if let Some(ratio) = input.low_enrollment_ratio {
            current.low_enrollment_ratio = ratio;
        }
        if let Some(ratio) = input.critical_enrollment_ratio {
            current.critical_enrollment_ratio = ratio;
        }
        ensure_ratios(current.low_enrollment_ratio, current.critical_enrollment_ratio)?;

        current.updated_at = Some(Utc::now().to_rfc3339());
        self.repository.save_settings(&current)?;

        info!(target: "engine::settings", buffer_minutes = current.buffer_minutes, "engine settings updated");
        Ok(current)
    }
}

fn ensure_tiers_descend(
    overloaded: &TierThresholds,
    high: &TierThresholds,
    medium: &TierThresholds,
) -> AppResult<()> {
    let hours_ok = overloaded.hours > high.hours && high.hours > medium.hours && medium.hours >= 0.0;
    let students_ok = overloaded.students > high.students && high.students > medium.students;
    if hours_ok && students_ok {
        Ok(())
    } else {
        Err(AppError::validation(
            ValidationCode::InvalidSettings,
            "tier thresholds must strictly decrease from overloaded to medium",
        ))
    }
}

fn ensure_ratios(low: f64, critical: f64) -> AppResult<()> {
    let in_range = |ratio: f64| ratio > 0.0 && ratio <= 1.0;
    if in_range(low) && in_range(critical) && critical <= low {
        Ok(())
    } else {
        Err(AppError::validation(
            ValidationCode::InvalidSettings,
            "enrollment ratios must be in (0, 1] with critical <= low",
        ))
    }
}
