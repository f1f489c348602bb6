//! Quarry admission layer
//!
//! Decides, for a pending build and the runner matchers online for its
//! project, whether a runner may claim the build. The decision path is
//! entirely read-only: quota and plan state are read through the trait seams
//! in `quarry-core`, and the only ledger write in the system is the
//! post-completion consumption debit recorded by [`ConsumptionTracker`].
//!
//! Typical wiring at the poll boundary:
//!
//! ```ignore
//! let services = AdmissionServices::new(projects, ledger, runners, resolver);
//! let mut cache = CheckerCache::new(services, Period::containing(Utc::now()));
//! for build in batch {
//!     let checker = cache.checker_for(build.project_id).await?;
//!     match checker.check(&build.to_matcher()).await? { ... }
//! }
//! ```
//!
//! The cache and every checker in it are scoped to one poll request; runner
//! liveness and quota state may change between requests, so neither is ever
//! reused across them.

pub mod checker;
pub mod consumption;
pub mod cost_factor;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use checker::{
    AdmissionServices, AvailabilityChecker, AvailabilityResult, CheckerCache, DropReason,
};
pub use consumption::compute_consumption;
pub use cost_factor::CostFactorResolver;
pub use tracker::ConsumptionTracker;
