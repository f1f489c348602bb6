use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::runner::RunnerScope;

/// The matching-relevant view of one pending build: its owning project, the
/// tags it requires, its ref-protection state, and an optional runner-scope
/// requirement. Constructed from a queued build at poll time; read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildMatcher {
    pub project_id: Uuid,
    pub tag_list: Vec<String>,
    pub protected: bool,
    /// When set, only runners registered at this scope may take the build.
    pub required_scope: Option<RunnerScope>,
}

/// A persisted row in the pending-build queue. Carries the denormalized
/// namespace id so queue-level filters can join ledger and plan state
/// without touching the project record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PendingBuild {
    pub id: Uuid,
    pub build_id: Uuid,
    pub project_id: Uuid,
    pub namespace_id: Uuid,
    pub protected: bool,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingBuild {
    /// The matcher view used for fine-grained eligibility decisions.
    pub fn to_matcher(&self) -> BuildMatcher {
        BuildMatcher {
            project_id: self.project_id,
            tag_list: self.tag_list.clone(),
            protected: self.protected,
            required_scope: None,
        }
    }
}
