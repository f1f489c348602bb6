//! Quarry Core Library
//!
//! This crate provides the core domain models, error types, configuration,
//! and integration traits shared across all Quarry components.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::AppError;
pub use telemetry::init_telemetry;
pub use hooks::{
    CostFactorOverrideSource, NoOverrides, ProjectLookup, QuotaLedgerReader, QuotaLedgerWriter,
    RunnerDirectory,
};
