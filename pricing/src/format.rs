//! Display helpers for money amounts
//!
//! Presentation only: ISO currency symbol lookup and human-readable amount
//! strings. Nothing here feeds back into computation.

use rust_decimal::prelude::*;
use rusty_money::{iso, Money as DisplayMoney};

use crate::money;

/// Symbol of an ISO currency code, or the code itself when unknown
pub fn get_currency_symbol(code: &str) -> &str {
    match iso::find(code) {
        Some(currency) => currency.symbol,
        None => code,
    }
}

/// Render minor units as a localized amount with its currency symbol
///
/// Unknown currency codes fall back to `"<amount> <CODE>"`.
pub fn format_amount(minor_units: i64, currency: &str) -> String {
    let code = currency.to_uppercase();
    match iso::find(&code) {
        Some(iso_currency) => DisplayMoney::from_minor(minor_units, iso_currency).to_string(),
        None => format!("{} {}", Decimal::new(minor_units, 2), code),
    }
}

/// Render a full-precision decimal string as a display amount
///
/// The value is rounded half-up to minor units first. Unparseable input
/// renders as zero.
pub fn format_amount_from_decimal(decimal: &str, currency: &str) -> String {
    let amount = decimal.trim().parse::<Decimal>().unwrap_or_else(|_| {
        tracing::warn!(value = decimal, "Unparseable decimal amount, formatting as zero");
        Decimal::ZERO
    });
    format_amount(money::to_cents(amount), currency)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_currency_symbols() {
        assert_eq!(get_currency_symbol("EUR"), "€");
        assert_eq!(get_currency_symbol("USD"), "$");
        assert_eq!(get_currency_symbol("GBP"), "£");
    }

    #[test]
    fn test_unknown_currency_symbol_falls_back_to_code() {
        assert_eq!(get_currency_symbol("XYZ"), "XYZ");
    }

    #[test]
    fn test_format_amount_known_currencies() {
        assert_eq!(format_amount(1234, "USD"), "$12.34");
        assert_eq!(format_amount(123456, "EUR"), "€1.234,56");
    }

    #[test]
    fn test_format_amount_accepts_lowercase_codes() {
        assert_eq!(format_amount(1234, "eur"), "€12,34");
    }

    #[test]
    fn test_format_amount_unknown_currency() {
        assert_eq!(format_amount(1234, "XYZ"), "12.34 XYZ");
    }

    #[test]
    fn test_format_amount_from_decimal_rounds_half_up() {
        assert_eq!(format_amount_from_decimal("10.009", "EUR"), "€10,01");
    }

    #[test]
    fn test_format_amount_from_decimal_unparseable_is_zero() {
        assert_eq!(format_amount_from_decimal("not-a-number", "EUR"), "€0,00");
    }
}
