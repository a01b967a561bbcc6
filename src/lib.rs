pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use commands::AppState;
pub use error::{AppError, AppResult};
