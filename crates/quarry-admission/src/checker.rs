//! Ordered availability checks for one (project, build) decision.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use quarry_core::models::{BuildMatcher, Period, Project, RunnerMatcher};
use quarry_core::{AppError, ProjectLookup, QuotaLedgerReader, RunnerDirectory};

use crate::cost_factor::CostFactorResolver;

/// Why a build was dropped: the first failing check in evaluation order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    QuotaExceeded,
    NoMatchingRunner,
}

/// Outcome of an availability decision. `drop_reason` is present exactly
/// when the build is unavailable, and names the first failing check, not
/// every failing one.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AvailabilityResult {
    available: bool,
    drop_reason: Option<DropReason>,
}

impl AvailabilityResult {
    fn pass() -> Self {
        Self {
            available: true,
            drop_reason: None,
        }
    }

    fn rejected(reason: DropReason) -> Self {
        Self {
            available: false,
            drop_reason: Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn drop_reason(&self) -> Option<DropReason> {
        self.drop_reason
    }
}

#[derive(Debug, Clone, Copy)]
enum CheckKind {
    Quota,
    AllowedPlans,
}

/// The fixed evaluation order. Quota is checked before the plan allow-list
/// so that when both fail, the reported reason is the more urgent,
/// time-bounded one.
const CHECK_ORDER: [(CheckKind, DropReason); 2] = [
    (CheckKind::Quota, DropReason::QuotaExceeded),
    (CheckKind::AllowedPlans, DropReason::NoMatchingRunner),
];

/// The external state the decision path reads through. Cheap to clone; all
/// members are shared handles.
#[derive(Clone)]
pub struct AdmissionServices {
    pub projects: Arc<dyn ProjectLookup>,
    pub ledger: Arc<dyn QuotaLedgerReader>,
    pub runners: Arc<dyn RunnerDirectory>,
    pub cost_factors: CostFactorResolver,
}

impl AdmissionServices {
    pub fn new(
        projects: Arc<dyn ProjectLookup>,
        ledger: Arc<dyn QuotaLedgerReader>,
        runners: Arc<dyn RunnerDirectory>,
        cost_factors: CostFactorResolver,
    ) -> Self {
        Self {
            projects,
            ledger,
            runners,
            cost_factors,
        }
    }
}

/// Evaluates the ordered check list for builds of one project against a
/// snapshot of the runner matchers online for it.
///
/// A checker is scoped to a single poll request: runner liveness and quota
/// state can change between requests, so a checker must never outlive the
/// request it was built for. Within one request it is safe to reuse across
/// any number of builds of its project.
pub struct AvailabilityChecker {
    services: AdmissionServices,
    project: Project,
    period: Period,
    matchers: Vec<RunnerMatcher>,
}

impl std::fmt::Debug for AvailabilityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityChecker")
            .field("project", &self.project)
            .field("period", &self.period)
            .field("matchers", &self.matchers)
            .finish_non_exhaustive()
    }
}

impl AvailabilityChecker {
    /// Snapshots the project (with its namespace and plan) and the online
    /// matcher set. A missing project is a data-integrity fault and
    /// propagates; it is never reported as "unavailable".
    pub async fn build(
        services: AdmissionServices,
        project_id: Uuid,
        period: Period,
    ) -> Result<Self, AppError> {
        let project = services
            .projects
            .project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

        let matchers = services.runners.online_matchers(project_id).await?;

        Ok(Self {
            services,
            project,
            period,
            matchers,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn matchers(&self) -> &[RunnerMatcher] {
        &self.matchers
    }

    /// Runs the ordered checks for one build of this checker's project and
    /// short-circuits on the first failure. Lookup faults propagate; they
    /// are never converted into a drop reason.
    pub async fn check(&self, build: &BuildMatcher) -> Result<AvailabilityResult, AppError> {
        if build.project_id != self.project.id {
            return Err(AppError::Internal(format!(
                "Checker for project {} asked about build of project {}",
                self.project.id, build.project_id
            )));
        }

        for (kind, reason) in CHECK_ORDER {
            if !self.check_passes(kind).await? {
                tracing::debug!(
                    project_id = %self.project.id,
                    drop_reason = ?reason,
                    "Build dropped by availability check"
                );
                return Ok(AvailabilityResult::rejected(reason));
            }
        }

        Ok(AvailabilityResult::pass())
    }

    /// A check passes when any matcher in the online set satisfies its
    /// predicate.
    async fn check_passes(&self, kind: CheckKind) -> Result<bool, AppError> {
        match kind {
            CheckKind::Quota => {
                for matcher in &self.matchers {
                    if self.matches_quota(matcher).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CheckKind::AllowedPlans => Ok(self
                .matchers
                .iter()
                .any(|matcher| self.matches_allowed_plans(matcher))),
        }
    }

    /// Quota predicate for one matcher against this checker's project.
    ///
    /// A quota-exempt pairing (resolved cost factor of exactly 0) passes
    /// without touching the ledger; the exemption must be decided before
    /// any ledger read. Non-exempt pairings pass while the namespace still
    /// has minutes left.
    pub async fn matches_quota(&self, matcher: &RunnerMatcher) -> Result<bool, AppError> {
        let cost_factor = self
            .services
            .cost_factors
            .resolve(matcher, &self.project)
            .await?;

        if cost_factor.is_zero() {
            return Ok(true);
        }

        let usage = self
            .services
            .ledger
            .usage_for(self.project.namespace_id, &self.period)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Namespace {} missing from minutes ledger",
                    self.project.namespace_id
                ))
            })?;

        Ok(!usage.exhausted())
    }

    /// Plan allow-list predicate for one matcher against this checker's
    /// project.
    pub fn matches_allowed_plans(&self, matcher: &RunnerMatcher) -> bool {
        matcher.allows_plan(&self.project.plan_id)
    }
}

/// Request-scoped store of checkers keyed by project id.
///
/// Owned by the poll-handling boundary and dropped with the request; never a
/// process-wide singleton, so stale matcher or quota snapshots cannot leak
/// across requests.
pub struct CheckerCache {
    services: AdmissionServices,
    period: Period,
    checkers: HashMap<Uuid, Arc<AvailabilityChecker>>,
}

impl CheckerCache {
    pub fn new(services: AdmissionServices, period: Period) -> Self {
        Self {
            services,
            period,
            checkers: HashMap::new(),
        }
    }

    /// The checker for a project, built on first use within this request.
    pub async fn checker_for(
        &mut self,
        project_id: Uuid,
    ) -> Result<Arc<AvailabilityChecker>, AppError> {
        if let Some(checker) = self.checkers.get(&project_id) {
            return Ok(checker.clone());
        }

        let checker = Arc::new(
            AvailabilityChecker::build(self.services.clone(), project_id, self.period.clone())
                .await?,
        );
        self.checkers.insert(project_id, checker.clone());
        Ok(checker)
    }
}
