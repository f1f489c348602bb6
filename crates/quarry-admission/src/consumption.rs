//! Converts a completed run's wall-clock duration into a quota debit.

use rust_decimal::{Decimal, RoundingStrategy};
use std::time::Duration;

const SECONDS_PER_MINUTE: u64 = 60;

/// Quota debit for a completed run: wall-clock minutes scaled by the
/// resolved cost factor, rounded to two decimal places with half-up
/// (`MidpointAwayFromZero`) rounding.
///
/// A zero duration debits nothing, and a zero (quota-exempt) factor debits
/// nothing regardless of duration.
pub fn compute_consumption(duration: Duration, cost_factor: Decimal) -> Decimal {
    let minutes = Decimal::from(duration.as_secs()) / Decimal::from(SECONDS_PER_MINUTE);
    (minutes * cost_factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn ten_minutes_at_half_rate_is_five() {
        let amount = compute_consumption(Duration::from_secs(600), dec("0.5"));
        assert_eq!(amount, dec("5.0"));
    }

    #[test]
    fn zero_duration_debits_nothing() {
        assert_eq!(
            compute_consumption(Duration::ZERO, dec("1.0")),
            Decimal::ZERO
        );
    }

    #[test]
    fn exempt_factor_debits_nothing() {
        assert_eq!(
            compute_consumption(Duration::from_secs(86_400), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn rounds_half_up_at_two_decimal_places() {
        // 27s * 0.1 / 60 = 0.045 exactly; half-up lands on 0.05.
        assert_eq!(
            compute_consumption(Duration::from_secs(27), dec("0.1")),
            dec("0.05")
        );
        // 101s at factor 1 = 1.6833..., truncating the tail down.
        assert_eq!(
            compute_consumption(Duration::from_secs(101), dec("1")),
            dec("1.68")
        );
    }

    #[test]
    fn consumption_is_monotone_in_duration() {
        let factor = dec("0.75");
        let mut previous = Decimal::ZERO;
        for secs in [0u64, 1, 59, 60, 61, 600, 3600, 86_400] {
            let amount = compute_consumption(Duration::from_secs(secs), factor);
            assert!(
                amount >= previous,
                "consumption decreased between samples: {} -> {}",
                previous,
                amount
            );
            previous = amount;
        }
    }
}
