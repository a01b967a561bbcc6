pub mod memory_store;
pub mod record_store;
pub mod scheduling_repository;
pub mod sqlite_store;
