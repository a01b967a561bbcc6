pub mod change_applier;
pub mod conflict_detector;
pub mod inefficiency_analyzer;
pub mod optimization_planner;
pub mod schedule_utils;
pub mod settings_service;
pub mod workload_service;
