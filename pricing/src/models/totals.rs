//! Order-level totals and their breakdowns

use serde::{Deserialize, Serialize};

use super::item::TaxAmount;

/// Amounts of one recurrence bucket, keyed by type and billing period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceAmount {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub recurrence_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<String>,
    pub amount_subtotal: i64,
    pub amount_subtotal_decimal: String,
    pub amount_total: i64,
    pub amount_total_decimal: String,
    pub amount_tax: i64,
    /// What remains of the total once cashbacks are paid back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_cashback_amount_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_cashback_amount_total_decimal: Option<String>,
}

/// Cashback owed per payout period; period "0" pays out immediately
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashbackAmount {
    pub cashback_period: String,
    pub amount_total: i64,
    pub amount_total_decimal: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalDetailsBreakdown {
    pub taxes: Vec<TaxAmount>,
    pub recurrences: Vec<RecurrenceAmount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cashbacks: Vec<CashbackAmount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalDetails {
    pub amount_tax: i64,
    pub breakdown: TotalDetailsBreakdown,
}

/// Aggregated amounts of a whole set of line items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Net amount in minor units
    pub amount_subtotal: i64,
    /// Gross amount in minor units
    pub amount_total: i64,
    pub currency: String,
    pub total_details: TotalDetails,
}
