pub mod availability;
pub mod class;
pub mod inefficiency;
pub mod optimization;
pub mod session;
pub mod settings;
pub mod tutor;
pub mod workload;
