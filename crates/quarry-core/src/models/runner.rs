use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::build::BuildMatcher;
use crate::models::project::Visibility;

/// Scope at which a group of runners is registered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "runner_scope", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum RunnerScope {
    /// Shared across the whole instance.
    Instance,
    /// Registered on a namespace; serves that namespace's projects.
    Group,
    /// Registered on a single project.
    Project,
}

impl Display for RunnerScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RunnerScope::Instance => write!(f, "instance"),
            RunnerScope::Group => write!(f, "group"),
            RunnerScope::Project => write!(f, "project"),
        }
    }
}

impl FromStr for RunnerScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(RunnerScope::Instance),
            "group" => Ok(RunnerScope::Group),
            "project" => Ok(RunnerScope::Project),
            _ => Err(anyhow::anyhow!("Invalid runner scope: {}", s)),
        }
    }
}

/// Ref-protection level a runner group is willing to serve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "runner_access_level", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RunnerAccessLevel {
    /// Runs builds from any ref.
    NotProtected,
    /// Only runs builds from protected refs.
    RefProtected,
}

/// The aggregate matching configuration of a group of interchangeable
/// runners. Not an individual runner: every runner sharing an identical
/// configuration collapses into one matcher, and a matching decision made
/// for the matcher holds for each of them.
///
/// Matchers are derived views, rebuilt per matching request from durable
/// runner records; they are never persisted and stay immutable for the
/// duration of one decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerMatcher {
    /// Ids of the runners sharing this configuration.
    pub runner_ids: Vec<Uuid>,
    pub scope: RunnerScope,
    pub tag_list: BTreeSet<String>,
    /// Whether these runners also pick up builds with no tags.
    pub run_untagged: bool,
    pub access_level: RunnerAccessLevel,
    /// Rate converting execution time on public projects into compute
    /// minutes. Exactly 0 means quota-exempt.
    pub public_cost_factor: Decimal,
    /// Rate converting execution time on private projects into compute
    /// minutes. Exactly 0 means quota-exempt.
    pub private_cost_factor: Decimal,
    /// Plans whose namespaces may use these runners. Empty = unrestricted.
    pub allowed_plan_ids: BTreeSet<String>,
}

impl RunnerMatcher {
    /// Builds a matcher, rejecting negative cost factors. A factor is either
    /// exactly 0 (quota-exempt) or positive.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner_ids: Vec<Uuid>,
        scope: RunnerScope,
        tag_list: BTreeSet<String>,
        run_untagged: bool,
        access_level: RunnerAccessLevel,
        public_cost_factor: Decimal,
        private_cost_factor: Decimal,
        allowed_plan_ids: BTreeSet<String>,
    ) -> Result<Self, AppError> {
        if public_cost_factor.is_sign_negative() || private_cost_factor.is_sign_negative() {
            return Err(AppError::InvalidConfiguration(format!(
                "Runner cost factors must be non-negative (public: {}, private: {})",
                public_cost_factor, private_cost_factor
            )));
        }

        Ok(RunnerMatcher {
            runner_ids,
            scope,
            tag_list,
            run_untagged,
            access_level,
            public_cost_factor,
            private_cost_factor,
            allowed_plan_ids,
        })
    }

    /// The visibility-based cost factor for a project. Dedicated-rate
    /// overrides are resolved upstream and take precedence over this value.
    pub fn cost_factor_for(&self, visibility: Visibility) -> Decimal {
        match visibility {
            Visibility::Public => self.public_cost_factor,
            Visibility::Private => self.private_cost_factor,
        }
    }

    /// Plan allow-list membership. An empty allow-list accepts every plan;
    /// otherwise membership is exact and case-sensitive.
    pub fn allows_plan(&self, plan_id: &str) -> bool {
        self.allowed_plan_ids.is_empty() || self.allowed_plan_ids.contains(plan_id)
    }

    /// Structural match between this matcher and a build: tag coverage,
    /// ref-protection access, and runner-scope compatibility. Quota and plan
    /// policy are evaluated separately by the availability checks.
    pub fn matches(&self, build: &BuildMatcher) -> bool {
        self.matches_scope(build) && self.matches_protected(build) && self.matches_tags(build)
    }

    fn matches_scope(&self, build: &BuildMatcher) -> bool {
        match build.required_scope {
            Some(required) => self.scope == required,
            None => true,
        }
    }

    fn matches_protected(&self, build: &BuildMatcher) -> bool {
        match self.access_level {
            RunnerAccessLevel::NotProtected => true,
            RunnerAccessLevel::RefProtected => build.protected,
        }
    }

    fn matches_tags(&self, build: &BuildMatcher) -> bool {
        if build.tag_list.is_empty() {
            return self.run_untagged;
        }
        build
            .tag_list
            .iter()
            .all(|tag| self.tag_list.contains(tag.as_str()))
    }
}
