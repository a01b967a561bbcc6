use std::fmt;

use rusqlite;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Distinguishes which proactive check rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    NoAvailability,
    NoSlotForWeekday,
    OutsideAvailability,
    SessionOverlap,
    ClassOverlap,
    InvalidWindow,
    InvalidSettings,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::NoAvailability => "NO_AVAILABILITY",
            ValidationCode::NoSlotForWeekday => "NO_SLOT_FOR_WEEKDAY",
            ValidationCode::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            ValidationCode::SessionOverlap => "SESSION_OVERLAP",
            ValidationCode::ClassOverlap => "CLASS_OVERLAP",
            ValidationCode::InvalidWindow => "INVALID_WINDOW",
            ValidationCode::InvalidSettings => "INVALID_SETTINGS",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("invalid state: {message}")]
    InvalidState { message: String },

    #[error("validation failed ({code}): {message}")]
    Validation {
        code: ValidationCode,
        message: String,
        details: Option<JsonValue>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(code: ValidationCode, message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "engine::validation", %code, %message, "validation error");
        AppError::Validation {
            code,
            message,
            details: None,
        }
    }

    pub fn validation_with_details(
        code: ValidationCode,
        message: impl Into<String>,
        details: JsonValue,
    ) -> Self {
        let message = message.into();
        warn!(target: "engine::validation", %code, %message, details = %details, "validation error with details");
        AppError::Validation {
            code,
            message,
            details: Some(details),
        }
    }

    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            AppError::Validation { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        let id = id.into();
        warn!(target: "engine::db", entity, %id, "record not found");
        AppError::NotFound { entity, id }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "engine::validation", %message, "invalid format");
        AppError::InvalidFormat { message }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "engine::state", %message, "invalid state transition");
        AppError::InvalidState { message }
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "engine::db", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "engine::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::QueryReturnedNoRows;

        match &error {
            QueryReturnedNoRows => AppError::not_found("record", "<query>"),
            _ => {
                error!(target: "engine::db", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
