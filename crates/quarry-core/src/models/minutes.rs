use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Monthly accounting period, keyed as "YYYY-MM".
///
/// Ledger rows are keyed by (namespace, period). Rollover and reset are
/// external concerns; the decision core only ever reads the period it is
/// given, so callers (and tests) control time explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Period(String);

impl Period {
    /// The period containing the given instant.
    pub fn containing(at: DateTime<Utc>) -> Self {
        Period(format!("{:04}-{:02}", at.year(), at.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Compute-minutes usage for a namespace in one accounting period.
///
/// `minutes_used` only ever grows within a period; the single writer path is
/// the post-completion consumption debit, applied as an atomic increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MinutesUsage {
    pub namespace_id: Uuid,
    pub period: String,
    /// Allotted minutes for the period. A limit of 0 means the namespace is
    /// not metered at all.
    pub minutes_limit: i64,
    pub minutes_used: Decimal,
}

impl MinutesUsage {
    /// Whether metering applies to this namespace at all.
    pub fn quota_enabled(&self) -> bool {
        self.minutes_limit > 0
    }

    /// Whether the namespace has used up its allotted minutes. Never true for
    /// an unmetered namespace.
    pub fn exhausted(&self) -> bool {
        self.quota_enabled() && self.minutes_used >= Decimal::from(self.minutes_limit)
    }

    /// Minutes remaining in the period; None when the namespace is unmetered.
    pub fn remaining(&self) -> Option<Decimal> {
        if !self.quota_enabled() {
            return None;
        }
        let remaining = Decimal::from(self.minutes_limit) - self.minutes_used;
        Some(remaining.max(Decimal::ZERO))
    }
}
