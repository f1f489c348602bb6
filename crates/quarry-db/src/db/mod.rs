//! Database repositories for the admission subsystem
//!
//! Each repository owns one domain area and holds a cloned `PgPool`. All
//! decision-path methods are reads; the only write is the atomic
//! consumption debit in [`MinutesRepository`].

pub mod minutes;
pub mod pending_builds;
pub mod project;
pub mod runner;

pub use minutes::MinutesRepository;
pub use pending_builds::{PendingBuildQueue, PendingBuildRepository};
pub use project::ProjectRepository;
pub use runner::RunnerRepository;
