use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use quarry_core::models::{MinutesUsage, Period};
use quarry_core::{AppError, QuotaLedgerReader, QuotaLedgerWriter};

/// Compute-minutes ledger access. The decision path reads through
/// [`QuotaLedgerReader`]; the post-completion debit writes through
/// [`QuotaLedgerWriter`] as an atomic increment.
#[derive(Clone)]
pub struct MinutesRepository {
    pool: PgPool,
}

impl MinutesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Usage for a namespace in one period. The namespace's limit lives on
    /// the namespace record; the per-period row is created lazily on first
    /// debit, so a missing row reads as zero consumption.
    #[tracing::instrument(skip(self))]
    pub async fn get_usage(
        &self,
        namespace_id: Uuid,
        period: &Period,
    ) -> Result<Option<MinutesUsage>, AppError> {
        let usage = sqlx::query_as::<_, MinutesUsage>(
            r#"
            SELECT
                n.id AS namespace_id,
                $2 AS period,
                n.minutes_limit,
                COALESCE(m.minutes_used, 0) AS minutes_used
            FROM namespaces n
            LEFT JOIN namespace_minutes m
                ON m.namespace_id = n.id AND m.period = $2
            WHERE n.id = $1
            "#,
        )
        .bind(namespace_id)
        .bind(period.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                namespace_id = %namespace_id,
                period = %period,
                "Failed to fetch minutes usage"
            );
            AppError::Database(e)
        })?;

        Ok(usage)
    }

    /// Applies a consumption debit as a single atomic increment. Upserts the
    /// period row so the first debit of a period creates it; concurrent
    /// debits from many finished runs serialize on the row without losing
    /// updates.
    #[tracing::instrument(skip(self))]
    pub async fn add_consumption(
        &self,
        namespace_id: Uuid,
        period: &Period,
        amount: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO namespace_minutes (namespace_id, period, minutes_used)
            VALUES ($1, $2, $3)
            ON CONFLICT (namespace_id, period)
            DO UPDATE SET minutes_used = namespace_minutes.minutes_used + EXCLUDED.minutes_used
            "#,
        )
        .bind(namespace_id)
        .bind(period.as_str())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                namespace_id = %namespace_id,
                period = %period,
                amount = %amount,
                "Failed to apply consumption debit"
            );
            AppError::Database(e)
        })?;

        tracing::info!(
            namespace_id = %namespace_id,
            period = %period,
            amount = %amount,
            "Applied consumption debit"
        );

        Ok(())
    }
}

#[async_trait]
impl QuotaLedgerReader for MinutesRepository {
    async fn usage_for(
        &self,
        namespace_id: Uuid,
        period: &Period,
    ) -> Result<Option<MinutesUsage>, AppError> {
        self.get_usage(namespace_id, period).await
    }
}

#[async_trait]
impl QuotaLedgerWriter for MinutesRepository {
    async fn apply_consumption(
        &self,
        namespace_id: Uuid,
        period: &Period,
        amount: Decimal,
    ) -> Result<(), AppError> {
        self.add_consumption(namespace_id, period, amount).await
    }
}
