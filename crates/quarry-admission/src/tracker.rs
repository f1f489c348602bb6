//! Records compute-minutes consumption for finished builds.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use quarry_core::models::{Period, RunnerMatcher};
use quarry_core::{AppError, ProjectLookup, QuotaLedgerWriter};

use crate::consumption::compute_consumption;
use crate::cost_factor::CostFactorResolver;

/// Applies the quota debit for a completed run.
///
/// This is the only path that writes to the minutes ledger, and it runs
/// strictly after completion; nothing in the matching/availability path
/// mutates ledger state. Quota-exempt pairings produce a zero amount and
/// skip the write entirely.
#[derive(Clone)]
pub struct ConsumptionTracker {
    projects: Arc<dyn ProjectLookup>,
    ledger: Arc<dyn QuotaLedgerWriter>,
    cost_factors: CostFactorResolver,
}

impl ConsumptionTracker {
    pub fn new(
        projects: Arc<dyn ProjectLookup>,
        ledger: Arc<dyn QuotaLedgerWriter>,
        cost_factors: CostFactorResolver,
    ) -> Self {
        Self {
            projects,
            ledger,
            cost_factors,
        }
    }

    /// Computes the debit for a finished run and applies it to the owning
    /// namespace's ledger for the given period. Returns the amount debited.
    #[tracing::instrument(skip(self, matcher))]
    pub async fn record(
        &self,
        matcher: &RunnerMatcher,
        project_id: Uuid,
        duration: Duration,
        period: &Period,
    ) -> Result<Decimal, AppError> {
        let project = self
            .projects
            .project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

        let cost_factor = self.cost_factors.resolve(matcher, &project).await?;
        let amount = compute_consumption(duration, cost_factor);

        if amount > Decimal::ZERO {
            self.ledger
                .apply_consumption(project.namespace_id, period, amount)
                .await?;
            tracing::info!(
                project_id = %project_id,
                namespace_id = %project.namespace_id,
                period = %period,
                amount = %amount,
                "Recorded build consumption"
            );
        } else {
            tracing::debug!(
                project_id = %project_id,
                namespace_id = %project.namespace_id,
                "Build consumed no metered minutes"
            );
        }

        Ok(amount)
    }
}
