//! Monetary precision policy
//!
//! Every amount entering or leaving the ledger is held at two decimal places
//! and rounded half-to-even, so totals, balances and aggregates agree no matter
//! which surface computed them.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for all monetary values
pub const MONEY_SCALE: u32 = 2;

/// Exclusive ceiling, in whole currency units, for any single amount.
/// Matches the `NUMERIC(14,2)` money columns.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Exclusive ceiling for any single amount
pub fn max_amount() -> Decimal {
    Decimal::from(MAX_AMOUNT_UNITS)
}

/// Whether `amount` fits a money column
pub fn in_money_range(amount: Decimal) -> bool {
    amount < max_amount()
}

/// Round an amount to the ledger precision using banker's rounding
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Sum a sequence of amounts and round the result once.
/// `None` if the sum leaves `Decimal`'s range.
pub fn sum_money<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a))
        .map(round_money)
}

/// `a - b` at ledger precision, `None` on overflow
pub fn sub_money(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_sub(b).map(round_money)
}

/// Clamp a balance at zero
pub fn floor_zero(amount: Decimal) -> Decimal {
    if amount.is_sign_negative() {
        round_money(Decimal::ZERO)
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_even() {
        assert_eq!(round_money(dec!(10.125)), dec!(10.12));
        assert_eq!(round_money(dec!(10.135)), dec!(10.14));
        assert_eq!(round_money(dec!(10.1251)), dec!(10.13));
    }

    #[test]
    fn test_round_money_keeps_scale() {
        assert_eq!(round_money(dec!(12000)).scale(), 2);
        assert_eq!(round_money(dec!(12000)).to_string(), "12000.00");
    }

    #[test]
    fn test_sum_money() {
        assert_eq!(
            sum_money(vec![dec!(0.10), dec!(0.20), dec!(1000)]),
            Some(dec!(1000.30))
        );
        assert_eq!(sum_money(Vec::new()), Some(Decimal::ZERO));
    }

    #[test]
    fn test_sum_money_overflow_is_none() {
        assert_eq!(sum_money(vec![Decimal::MAX, dec!(1)]), None);
        assert_eq!(sub_money(Decimal::MIN, dec!(1)), None);
        assert_eq!(sub_money(dec!(12000), dec!(2500)), Some(dec!(9500)));
    }

    #[test]
    fn test_money_range() {
        assert!(in_money_range(dec!(999999999999.99)));
        assert!(!in_money_range(dec!(1000000000000)));
        assert!(!in_money_range(dec!(50000000000000000000000000000)));
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(floor_zero(dec!(-5.00)), Decimal::ZERO);
        assert_eq!(floor_zero(dec!(5.00)), dec!(5.00));
    }
}
