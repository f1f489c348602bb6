//! Resolves the cost factor for a (runner matcher, project) pairing.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use quarry_core::models::{Project, RunnerMatcher};
use quarry_core::{AppError, CostFactorOverrideSource, NoOverrides};

/// Resolves the rate at which execution time converts into compute minutes
/// for one (matcher, project) pairing.
///
/// Dedicated/negotiated rates from the override source take precedence; the
/// matcher's visibility-based factor applies only when no override exists.
/// Every resolution is logged with the resolved value, the project path, and
/// an opaque decision id so quota disputes can be traced; the logging is
/// advisory and can never fail the resolution itself.
#[derive(Clone)]
pub struct CostFactorResolver {
    overrides: Arc<dyn CostFactorOverrideSource>,
}

impl CostFactorResolver {
    pub fn new(overrides: Arc<dyn CostFactorOverrideSource>) -> Self {
        Self { overrides }
    }

    /// A resolver for deployments with no dedicated runner rates.
    pub fn without_overrides() -> Self {
        Self::new(Arc::new(NoOverrides))
    }

    pub async fn resolve(
        &self,
        matcher: &RunnerMatcher,
        project: &Project,
    ) -> Result<Decimal, AppError> {
        let (cost_factor, source) = match self.overrides.override_for(matcher.scope).await? {
            Some(factor) => (factor, "override"),
            None => (matcher.cost_factor_for(project.visibility), "visibility"),
        };

        if cost_factor.is_sign_negative() {
            return Err(AppError::InvalidConfiguration(format!(
                "Resolved cost factor for scope {} is negative: {}",
                matcher.scope, cost_factor
            )));
        }

        let decision_id = Uuid::new_v4();
        tracing::debug!(
            decision_id = %decision_id,
            project_path = %project.path,
            runner_scope = %matcher.scope,
            source,
            cost_factor = %cost_factor,
            "Resolved cost factor"
        );

        Ok(cost_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quarry_core::models::{RunnerScope, Visibility};
    use crate::testing::{matcher_with_factors, project};

    struct FixedOverride(Decimal);

    #[async_trait]
    impl CostFactorOverrideSource for FixedOverride {
        async fn override_for(&self, _scope: RunnerScope) -> Result<Option<Decimal>, AppError> {
            Ok(Some(self.0))
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn falls_back_to_visibility_factor() {
        let resolver = CostFactorResolver::without_overrides();
        let matcher = matcher_with_factors("0.5", "1.0");

        let public = resolver
            .resolve(&matcher, &project(Visibility::Public, "free"))
            .await
            .unwrap();
        assert_eq!(public, dec("0.5"));

        let private = resolver
            .resolve(&matcher, &project(Visibility::Private, "free"))
            .await
            .unwrap();
        assert_eq!(private, dec("1.0"));
    }

    #[tokio::test]
    async fn override_takes_precedence_over_visibility() {
        let resolver = CostFactorResolver::new(Arc::new(FixedOverride(dec("0.25"))));
        let matcher = matcher_with_factors("0.5", "1.0");

        let factor = resolver
            .resolve(&matcher, &project(Visibility::Private, "free"))
            .await
            .unwrap();
        assert_eq!(factor, dec("0.25"));
    }

    #[tokio::test]
    async fn negative_override_is_rejected() {
        let resolver = CostFactorResolver::new(Arc::new(FixedOverride(dec("-1"))));
        let matcher = matcher_with_factors("0.5", "1.0");

        let err = resolver
            .resolve(&matcher, &project(Visibility::Public, "free"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }
}
