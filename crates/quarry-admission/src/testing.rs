//! In-memory fakes for exercising the decision path without a database.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

use quarry_core::models::{
    MinutesUsage, Period, Project, RunnerAccessLevel, RunnerMatcher, RunnerScope, Visibility,
};
use quarry_core::{
    AppError, ProjectLookup, QuotaLedgerReader, QuotaLedgerWriter, RunnerDirectory,
};

pub(crate) fn project(visibility: Visibility, plan_id: &str) -> Project {
    Project {
        id: Uuid::new_v4(),
        namespace_id: Uuid::new_v4(),
        path: "group/app".to_string(),
        visibility,
        plan_id: plan_id.to_string(),
    }
}

pub(crate) fn matcher_with_factors(public: &str, private: &str) -> RunnerMatcher {
    RunnerMatcher::new(
        vec![Uuid::new_v4()],
        RunnerScope::Instance,
        BTreeSet::new(),
        true,
        RunnerAccessLevel::NotProtected,
        public.parse().unwrap(),
        private.parse().unwrap(),
        BTreeSet::new(),
    )
    .unwrap()
}

pub(crate) fn usage(namespace_id: Uuid, limit: i64, used: &str) -> MinutesUsage {
    MinutesUsage {
        namespace_id,
        period: "2026-08".to_string(),
        minutes_limit: limit,
        minutes_used: used.parse().unwrap(),
    }
}

pub(crate) struct FakeProjects(pub HashMap<Uuid, Project>);

#[async_trait]
impl ProjectLookup for FakeProjects {
    async fn project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.0.get(&project_id).cloned())
    }
}

/// Keyed by namespace; the period is echoed back as requested.
pub(crate) struct FakeLedger(pub HashMap<Uuid, MinutesUsage>);

#[async_trait]
impl QuotaLedgerReader for FakeLedger {
    async fn usage_for(
        &self,
        namespace_id: Uuid,
        period: &Period,
    ) -> Result<Option<MinutesUsage>, AppError> {
        Ok(self.0.get(&namespace_id).cloned().map(|mut u| {
            u.period = period.as_str().to_string();
            u
        }))
    }
}

pub(crate) struct FakeRunners(pub Vec<RunnerMatcher>);

#[async_trait]
impl RunnerDirectory for FakeRunners {
    async fn online_matchers(&self, _project_id: Uuid) -> Result<Vec<RunnerMatcher>, AppError> {
        Ok(self.0.clone())
    }
}

/// Records every debit it receives, for asserting the write path.
#[derive(Default)]
pub(crate) struct RecordingLedger {
    pub debits: Mutex<Vec<(Uuid, String, Decimal)>>,
}

#[async_trait]
impl QuotaLedgerWriter for RecordingLedger {
    async fn apply_consumption(
        &self,
        namespace_id: Uuid,
        period: &Period,
        amount: Decimal,
    ) -> Result<(), AppError> {
        self.debits
            .lock()
            .unwrap()
            .push((namespace_id, period.as_str().to_string(), amount));
        Ok(())
    }
}
