//! Core logic for the daily routine tracker.
//! This crate owns every routine invariant; front ends only call into it.

pub mod config;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{resolve_log_level, StorageConfig};
pub use export::{
    default_export_file_name, export_json, export_routines, export_text, render_json, render_text,
    ExportError, ExportFormat, TEXT_HEADER,
};
pub use logging::{default_log_level, error_chain, init_logging, logging_status, LoggingError};
pub use model::routine::{normalize_activity, RoutineId, RoutineItem, RoutineValidationError};
pub use repo::routine_repo::{
    InMemoryRoutineRepository, JsonFileRoutineRepository, RepoError, RepoResult,
    RoutineRepository,
};
pub use service::routine_store::{NewRoutine, RoutineStore, RoutineStoreError};
