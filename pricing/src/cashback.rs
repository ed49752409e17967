//! After-cashback amounts for recurrence buckets
//!
//! Once totals are folded, each recurrence bucket learns what remains of
//! its total after the first cashback pays out. Recurring buckets first
//! normalize the cashback from its payout period to their own billing
//! period; one-off buckets subtract it directly.

use rust_decimal::prelude::*;

use crate::frequency::{self, BillingPeriod};
use crate::models::{CashbackAmount, RecurrenceAmount, PRICE_TYPE_RECURRING};
use crate::money::{self, DECIMAL_PRECISION};

/// Subtract the first cashback from a recurrence total, never below zero
///
/// # Notes
/// - A recurrence without a type is returned unchanged.
/// - Cashback periods that are not recognized billing periods (such as the
///   immediate payout marker "0") are subtracted without normalization.
pub fn compute_recurrence_after_cashback(
    recurrence: &RecurrenceAmount,
    cashbacks: &[CashbackAmount],
) -> RecurrenceAmount {
    let mut result = recurrence.clone();
    let Some(cashback) = cashbacks.first() else {
        return result;
    };
    let Some(recurrence_type) = recurrence.recurrence_type.as_deref() else {
        return result;
    };

    let total = Decimal::new(recurrence.amount_total, 2);
    let cashback_amount = cashback
        .amount_total_decimal
        .trim()
        .parse::<Decimal>()
        .unwrap_or_else(|_| {
            tracing::warn!(
                value = %cashback.amount_total_decimal,
                "Unparseable cashback decimal, falling back to the integer amount"
            );
            Decimal::new(cashback.amount_total, 2)
        });

    let applied = if recurrence_type == PRICE_TYPE_RECURRING {
        let from = BillingPeriod::parse(&cashback.cashback_period);
        let to = recurrence.billing_period.as_deref().and_then(BillingPeriod::parse);
        frequency::normalize_value(cashback_amount, from, to, DECIMAL_PRECISION)
    } else {
        cashback_amount
    };

    let after = (total - applied).max(Decimal::ZERO);
    result.after_cashback_amount_total = Some(money::to_cents(after));
    result.after_cashback_amount_total_decimal = Some(money::to_decimal_string(after));
    result
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_recurrence(recurrence_type: Option<&str>, period: Option<&str>, total: i64) -> RecurrenceAmount {
        RecurrenceAmount {
            recurrence_type: recurrence_type.map(str::to_string),
            billing_period: period.map(str::to_string),
            amount_subtotal: total,
            amount_subtotal_decimal: Decimal::new(total, 2).to_string(),
            amount_total: total,
            amount_total_decimal: Decimal::new(total, 2).to_string(),
            amount_tax: 0,
            after_cashback_amount_total: None,
            after_cashback_amount_total_decimal: None,
        }
    }

    fn make_cashback(period: &str, total: i64) -> CashbackAmount {
        CashbackAmount {
            cashback_period: period.to_string(),
            amount_total: total,
            amount_total_decimal: Decimal::new(total, 2).normalize().to_string(),
        }
    }

    #[test]
    fn test_no_cashbacks_leaves_recurrence_unchanged() {
        let recurrence = make_recurrence(Some("one_time"), None, 10000);
        let result = compute_recurrence_after_cashback(&recurrence, &[]);
        assert_eq!(result, recurrence);
    }

    #[test]
    fn test_missing_type_leaves_recurrence_unchanged() {
        let recurrence = make_recurrence(None, None, 10000);
        let result = compute_recurrence_after_cashback(&recurrence, &[make_cashback("0", 2000)]);
        assert_eq!(result.after_cashback_amount_total, None);
    }

    #[test]
    fn test_one_time_subtracts_directly() {
        let recurrence = make_recurrence(Some("one_time"), None, 10000);
        let result = compute_recurrence_after_cashback(&recurrence, &[make_cashback("0", 2000)]);
        assert_eq!(result.after_cashback_amount_total, Some(8000));
        assert_eq!(result.after_cashback_amount_total_decimal.as_deref(), Some("80"));
        assert_eq!(result.amount_total, 10000, "the original total is untouched");
    }

    #[test]
    fn test_recurring_normalizes_cashback_to_billing_period() {
        // 120/year of cashback on a monthly recurrence: 10 per month
        let recurrence = make_recurrence(Some("recurring"), Some("monthly"), 5000);
        let result =
            compute_recurrence_after_cashback(&recurrence, &[make_cashback("yearly", 12000)]);
        assert_eq!(result.after_cashback_amount_total, Some(4000));
        assert_eq!(result.after_cashback_amount_total_decimal.as_deref(), Some("40"));
    }

    #[test]
    fn test_recurring_with_immediate_cashback_subtracts_as_is() {
        let recurrence = make_recurrence(Some("recurring"), Some("monthly"), 5000);
        let result = compute_recurrence_after_cashback(&recurrence, &[make_cashback("0", 1000)]);
        assert_eq!(result.after_cashback_amount_total, Some(4000));
    }

    #[test]
    fn test_unparseable_cashback_decimal_falls_back_to_integer_amount() {
        let recurrence = make_recurrence(Some("one_time"), None, 10000);
        let cashback = CashbackAmount {
            cashback_period: "0".to_string(),
            amount_total: 2000,
            amount_total_decimal: "broken".to_string(),
        };
        let result = compute_recurrence_after_cashback(&recurrence, &[cashback]);
        assert_eq!(result.after_cashback_amount_total, Some(8000));
    }

    #[test]
    fn test_only_first_cashback_applies() {
        let recurrence = make_recurrence(Some("one_time"), None, 10000);
        let cashbacks = vec![make_cashback("0", 1000), make_cashback("0", 9000)];
        let result = compute_recurrence_after_cashback(&recurrence, &cashbacks);
        assert_eq!(result.after_cashback_amount_total, Some(9000));
    }

    #[test]
    fn test_after_cashback_never_negative() {
        let recurrence = make_recurrence(Some("one_time"), None, 1000);
        let result = compute_recurrence_after_cashback(&recurrence, &[make_cashback("0", 5000)]);
        assert_eq!(result.after_cashback_amount_total, Some(0));
        assert_eq!(result.after_cashback_amount_total_decimal.as_deref(), Some("0"));
    }

    #[test]
    fn test_fractional_normalization_keeps_precision() {
        // 100/year on a monthly recurrence: 8.333333333333 per month
        let recurrence = make_recurrence(Some("recurring"), Some("monthly"), 2000);
        let result =
            compute_recurrence_after_cashback(&recurrence, &[make_cashback("yearly", 10000)]);
        assert_eq!(result.after_cashback_amount_total, Some(1167), "20 - 8.33... rounded half-up");
        assert_eq!(
            result.after_cashback_amount_total_decimal.as_deref(),
            Some("11.666666666667")
        );
    }
}
