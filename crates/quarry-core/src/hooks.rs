//! Trait seams between the decision core and durable state
//!
//! The admission logic never talks to storage directly; it reads project,
//! ledger, and runner state through these traits. The database layer
//! implements them; tests substitute in-memory fakes. All reads are
//! bounded-latency single-request lookups, and a lookup failure propagates
//! as an error rather than degrading into an eligibility verdict.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{MinutesUsage, Period, Project, RunnerMatcher, RunnerScope};

/// Resolves a project together with its owning namespace and current plan.
#[async_trait]
pub trait ProjectLookup: Send + Sync {
    /// None when the project does not exist.
    async fn project(&self, project_id: Uuid) -> Result<Option<Project>, AppError>;
}

/// Read-only view of the compute-minutes ledger.
///
/// The decision path only ever reads; debits are applied elsewhere through
/// [`QuotaLedgerWriter`] after a run completes.
#[async_trait]
pub trait QuotaLedgerReader: Send + Sync {
    /// Usage for (namespace, period). None when the namespace is unknown.
    /// A namespace with no ledger row for the period reports zero usage.
    async fn usage_for(
        &self,
        namespace_id: Uuid,
        period: &Period,
    ) -> Result<Option<MinutesUsage>, AppError>;
}

/// Applies consumption debits to the ledger. The single writer path; the
/// implementation must increment atomically so concurrent debits from many
/// finished runs never lose updates.
#[async_trait]
pub trait QuotaLedgerWriter: Send + Sync {
    async fn apply_consumption(
        &self,
        namespace_id: Uuid,
        period: &Period,
        amount: Decimal,
    ) -> Result<(), AppError>;
}

/// Dedicated/negotiated cost rates for runner classes billed outside the
/// visibility-based factors. Consulted before the matcher's own factors.
#[async_trait]
pub trait CostFactorOverrideSource: Send + Sync {
    /// None when no override is negotiated for the scope.
    async fn override_for(&self, scope: RunnerScope) -> Result<Option<Decimal>, AppError>;
}

/// Override source for deployments with no dedicated rates.
pub struct NoOverrides;

#[async_trait]
impl CostFactorOverrideSource for NoOverrides {
    async fn override_for(&self, _scope: RunnerScope) -> Result<Option<Decimal>, AppError> {
        Ok(None)
    }
}

/// Directory of runner matchers currently online for a project, already
/// filtered by heartbeat liveness and grouped by identical configuration.
#[async_trait]
pub trait RunnerDirectory: Send + Sync {
    async fn online_matchers(&self, project_id: Uuid) -> Result<Vec<RunnerMatcher>, AppError>;
}
