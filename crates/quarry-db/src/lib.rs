//! Quarry database layer
//!
//! PostgreSQL repositories backing the admission subsystem: project and
//! namespace lookup, the compute-minutes ledger, the online-runner-matcher
//! directory, and the pending-build queue with its set-based filters.

pub mod db;

pub use db::{
    MinutesRepository, PendingBuildQueue, PendingBuildRepository, ProjectRepository,
    RunnerRepository,
};
