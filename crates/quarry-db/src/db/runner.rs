use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use quarry_core::models::{RunnerAccessLevel, RunnerMatcher, RunnerScope};
use quarry_core::{AppError, RunnerDirectory};

/// One durable runner record as selected for matching.
#[derive(Debug, sqlx::FromRow)]
struct RunnerRow {
    id: Uuid,
    scope: RunnerScope,
    tag_list: Vec<String>,
    run_untagged: bool,
    access_level: RunnerAccessLevel,
    public_cost_factor: Decimal,
    private_cost_factor: Decimal,
    allowed_plan_ids: Vec<String>,
}

/// Key grouping runners that share an identical matching configuration.
#[derive(PartialEq, Eq, Hash)]
struct MatcherKey {
    scope: RunnerScope,
    tag_list: BTreeSet<String>,
    run_untagged: bool,
    access_level: RunnerAccessLevel,
    public_cost_factor: Decimal,
    private_cost_factor: Decimal,
    allowed_plan_ids: BTreeSet<String>,
}

/// Directory of runners eligible for a project, collapsed into
/// [`RunnerMatcher`] aggregates. Liveness is decided in SQL against the
/// heartbeat timestamp; the window comes from configuration.
#[derive(Clone)]
pub struct RunnerRepository {
    pool: PgPool,
    online_window_secs: i64,
}

impl RunnerRepository {
    pub fn new(pool: PgPool, online_window_secs: i64) -> Self {
        Self {
            pool,
            online_window_secs,
        }
    }

    /// Online runners eligible for a project: instance runners, group
    /// runners of the owning namespace, and the project's own runners,
    /// grouped by identical matching configuration.
    #[tracing::instrument(skip(self))]
    pub async fn online_matchers_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<RunnerMatcher>, AppError> {
        let rows = sqlx::query_as::<_, RunnerRow>(
            r#"
            SELECT
                r.id,
                r.scope,
                r.tag_list,
                r.run_untagged,
                r.access_level,
                r.public_cost_factor,
                r.private_cost_factor,
                r.allowed_plan_ids
            FROM runners r
            WHERE r.contacted_at >= NOW() - make_interval(secs => $2)
              AND (
                r.scope = 'instance'
                OR (r.scope = 'group' AND r.namespace_id = (
                    SELECT namespace_id FROM projects WHERE id = $1
                ))
                OR (r.scope = 'project' AND r.project_id = $1)
              )
            "#,
        )
        .bind(project_id)
        .bind(self.online_window_secs as f64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, project_id = %project_id, "Failed to fetch online runners");
            AppError::Database(e)
        })?;

        let matchers = group_into_matchers(rows)?;

        tracing::debug!(
            project_id = %project_id,
            matchers = matchers.len(),
            "Resolved online runner matchers"
        );

        Ok(matchers)
    }
}

/// Collapses runner rows into one matcher per distinct configuration.
fn group_into_matchers(rows: Vec<RunnerRow>) -> Result<Vec<RunnerMatcher>, AppError> {
    let mut groups: HashMap<MatcherKey, Vec<Uuid>> = HashMap::new();

    for row in rows {
        let key = MatcherKey {
            scope: row.scope,
            tag_list: row.tag_list.into_iter().collect(),
            run_untagged: row.run_untagged,
            access_level: row.access_level,
            public_cost_factor: row.public_cost_factor,
            private_cost_factor: row.private_cost_factor,
            allowed_plan_ids: row.allowed_plan_ids.into_iter().collect(),
        };
        groups.entry(key).or_default().push(row.id);
    }

    groups
        .into_iter()
        .map(|(key, runner_ids)| {
            RunnerMatcher::new(
                runner_ids,
                key.scope,
                key.tag_list,
                key.run_untagged,
                key.access_level,
                key.public_cost_factor,
                key.private_cost_factor,
                key.allowed_plan_ids,
            )
        })
        .collect()
}

#[async_trait]
impl RunnerDirectory for RunnerRepository {
    async fn online_matchers(&self, project_id: Uuid) -> Result<Vec<RunnerMatcher>, AppError> {
        self.online_matchers_for_project(project_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(scope: RunnerScope, tags: &[&str], public: &str) -> RunnerRow {
        RunnerRow {
            id: Uuid::new_v4(),
            scope,
            tag_list: tags.iter().map(|s| s.to_string()).collect(),
            run_untagged: true,
            access_level: RunnerAccessLevel::NotProtected,
            public_cost_factor: public.parse().unwrap(),
            private_cost_factor: "1".parse().unwrap(),
            allowed_plan_ids: vec![],
        }
    }

    #[test]
    fn identical_configurations_collapse_into_one_matcher() {
        let a = row(RunnerScope::Instance, &["docker", "linux"], "0.5");
        let b = row(RunnerScope::Instance, &["linux", "docker"], "0.5");
        let ids = vec![a.id, b.id];

        let matchers = group_into_matchers(vec![a, b]).unwrap();
        assert_eq!(matchers.len(), 1);
        assert_eq!(matchers[0].runner_ids.len(), 2);
        for id in ids {
            assert!(matchers[0].runner_ids.contains(&id));
        }
    }

    #[test]
    fn differing_cost_factors_stay_separate() {
        let a = row(RunnerScope::Instance, &["docker"], "0.5");
        let b = row(RunnerScope::Instance, &["docker"], "1");

        let matchers = group_into_matchers(vec![a, b]).unwrap();
        assert_eq!(matchers.len(), 2);
    }

    #[test]
    fn negative_factor_rows_surface_as_configuration_errors() {
        let mut bad = row(RunnerScope::Instance, &[], "0.5");
        bad.private_cost_factor = "-1".parse().unwrap();

        let err = group_into_matchers(vec![bad]).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }
}
