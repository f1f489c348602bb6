//! Data models for the admission subsystem
//!
//! Organized by domain: projects and their owning namespaces, compute-minutes
//! accounting, runner matching configuration, and pending builds.

mod build;
mod minutes;
mod project;
mod runner;

pub use build::*;
pub use minutes::*;
pub use project::*;
pub use runner::*;
