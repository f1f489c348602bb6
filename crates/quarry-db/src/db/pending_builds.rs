use sqlx::PgPool;

use quarry_core::models::{PendingBuild, Period};
use quarry_core::AppError;

/// Set-based predicates pushed down to the pending-build queue query.
#[derive(Debug, Clone, PartialEq)]
enum QueueFilter {
    /// Drop builds whose namespace has exhausted its minutes for the period.
    MinutesLimit { period: String },
    /// Keep only builds whose namespace is on one of the given plans.
    AllowedPlanIds { plan_ids: Vec<String> },
}

impl QueueFilter {
    fn kind(&self) -> &'static str {
        match self {
            QueueFilter::MinutesLimit { .. } => "minutes_limit",
            QueueFilter::AllowedPlanIds { .. } => "allowed_plan_ids",
        }
    }

    /// The WHERE predicate for this filter, parameterized on one bind slot.
    fn condition_sql(&self, bind: usize) -> String {
        match self {
            QueueFilter::MinutesLimit { .. } => format!(
                "NOT EXISTS (\
                 SELECT 1 FROM namespaces n \
                 JOIN namespace_minutes m \
                   ON m.namespace_id = n.id AND m.period = ${} \
                 WHERE n.id = q.namespace_id \
                   AND n.minutes_limit > 0 \
                   AND m.minutes_used >= n.minutes_limit)",
                bind
            ),
            QueueFilter::AllowedPlanIds { .. } => format!(
                "EXISTS (\
                 SELECT 1 FROM namespaces n \
                 WHERE n.id = q.namespace_id \
                   AND n.plan_id = ANY(${}))",
                bind
            ),
        }
    }
}

/// A composable, read-only narrowing of the pending-build queue.
///
/// Filters accumulate as SQL predicates and are rendered into one SELECT at
/// load time; no per-row application code runs. Both filters are pure and
/// commute: applying them in either order yields the same item set. Applying
/// the same filter twice is a no-op. Nothing here mutates queue or ledger
/// state, so many workers can poll through this concurrently.
#[derive(Debug, Clone, Default)]
pub struct PendingBuildQueue {
    filters: Vec<QueueFilter>,
}

impl PendingBuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to builds whose owning namespace still has minutes left in
    /// the given period. Namespaces with metering disabled (zero limit)
    /// always pass.
    pub fn enforce_minutes_limit(self, period: &Period) -> Self {
        self.push(QueueFilter::MinutesLimit {
            period: period.as_str().to_string(),
        })
    }

    /// Restrict to builds whose owning namespace is on one of the given
    /// plans.
    pub fn enforce_allowed_plan_ids(self, plan_ids: &[String]) -> Self {
        self.push(QueueFilter::AllowedPlanIds {
            plan_ids: plan_ids.to_vec(),
        })
    }

    fn push(mut self, filter: QueueFilter) -> Self {
        if !self.filters.iter().any(|f| f.kind() == filter.kind()) {
            self.filters.push(filter);
        }
        self
    }

    /// Renders the SELECT with positional binds in filter order; the final
    /// bind is the batch limit.
    fn sql(&self) -> String {
        let mut sql = String::from(
            r#"
            SELECT
                q.id,
                q.build_id,
                q.project_id,
                q.namespace_id,
                q.protected,
                q.tag_list,
                q.created_at
            FROM pending_builds q
            "#,
        );

        let mut conditions = Vec::new();
        let mut bind_count = 1;

        for filter in &self.filters {
            conditions.push(filter.condition_sql(bind_count));
            bind_count += 1;
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(&format!(
            " ORDER BY q.created_at ASC LIMIT ${}",
            bind_count
        ));

        sql
    }
}

/// Access to the persisted pending-build queue. Selection only: claiming a
/// build for a worker is a separate, exclusive operation outside this layer.
#[derive(Clone)]
pub struct PendingBuildRepository {
    pool: PgPool,
    batch_size: i64,
}

impl PendingBuildRepository {
    pub fn new(pool: PgPool, batch_size: i64) -> Self {
        Self { pool, batch_size }
    }

    /// Loads the oldest pending builds passing the queue's filters, capped
    /// at the configured batch size.
    #[tracing::instrument(skip(self, queue))]
    pub async fn load(&self, queue: &PendingBuildQueue) -> Result<Vec<PendingBuild>, AppError> {
        let sql = queue.sql();

        let mut query = sqlx::query_as::<_, PendingBuild>(&sql);
        for filter in &queue.filters {
            match filter {
                QueueFilter::MinutesLimit { period } => {
                    query = query.bind(period.as_str());
                }
                QueueFilter::AllowedPlanIds { plan_ids } => {
                    query = query.bind(plan_ids.as_slice());
                }
            }
        }
        query = query.bind(self.batch_size);

        let builds = query.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load pending builds");
            AppError::Database(e)
        })?;

        tracing::debug!(loaded = builds.len(), "Loaded pending build batch");

        Ok(builds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn period() -> Period {
        Period::containing(chrono::Utc::now())
    }

    fn plans() -> Vec<String> {
        vec!["premium".to_string(), "ultimate".to_string()]
    }

    /// The queue's predicates with bind positions blanked, as an
    /// order-insensitive set.
    fn normalized_conditions(queue: &PendingBuildQueue) -> BTreeSet<String> {
        queue
            .filters
            .iter()
            .map(|f| f.condition_sql(0))
            .collect()
    }

    #[test]
    fn unfiltered_queue_selects_everything_oldest_first() {
        let sql = PendingBuildQueue::new().sql();
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("ORDER BY q.created_at ASC LIMIT $1"));
    }

    #[test]
    fn minutes_filter_is_a_ledger_anti_join() {
        let sql = PendingBuildQueue::new().enforce_minutes_limit(&period()).sql();
        assert!(sql.contains("NOT EXISTS"));
        assert!(sql.contains("m.minutes_used >= n.minutes_limit"));
        assert!(sql.contains("n.minutes_limit > 0"));
    }

    #[test]
    fn plan_filter_checks_namespace_plan_membership() {
        let sql = PendingBuildQueue::new()
            .enforce_allowed_plan_ids(&plans())
            .sql();
        assert!(sql.contains("n.plan_id = ANY($1)"));
    }

    #[test]
    fn filters_commute() {
        let a = PendingBuildQueue::new()
            .enforce_minutes_limit(&period())
            .enforce_allowed_plan_ids(&plans());
        let b = PendingBuildQueue::new()
            .enforce_allowed_plan_ids(&plans())
            .enforce_minutes_limit(&period());

        assert_eq!(normalized_conditions(&a), normalized_conditions(&b));
        assert_eq!(a.filters.len(), 2);
        assert_eq!(b.filters.len(), 2);
    }

    #[test]
    fn reapplying_a_filter_is_a_no_op() {
        let queue = PendingBuildQueue::new()
            .enforce_minutes_limit(&period())
            .enforce_minutes_limit(&period());
        assert_eq!(queue.filters.len(), 1);
    }

    #[test]
    fn bind_positions_stay_sequential() {
        let sql = PendingBuildQueue::new()
            .enforce_minutes_limit(&period())
            .enforce_allowed_plan_ids(&plans())
            .sql();
        assert!(sql.contains("m.period = $1"));
        assert!(sql.contains("ANY($2)"));
        assert!(sql.contains("LIMIT $3"));
    }
}
