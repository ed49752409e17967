//! Order-level aggregation
//!
//! Folds computed line items into order totals with three breakdowns:
//! - taxes, bucketed by rate, with one bucket for untaxed amounts
//! - recurrences, bucketed by type and billing period
//! - cashbacks, bucketed by payout period
//!
//! Components of composite items fold individually; the composite parent
//! itself never enters a bucket. After the fold, every recurrence bucket
//! learns its after-cashback amount. A single bad item fails the whole
//! aggregation.

use crate::cashback;
use crate::error::PricingError;
use crate::models::{
    amount_from_parts, CashbackAmount, PriceItem, RecurrenceAmount, Tax, TaxAmount, TotalDetails,
    TotalDetailsBreakdown, Totals,
};
use crate::money::Money;

// ==================== Fold State ====================

struct TaxBucket {
    tax: Option<Tax>,
    amount: Money,
}

struct RecurrenceBucket {
    recurrence_type: Option<String>,
    billing_period: Option<String>,
    subtotal: Money,
    total: Money,
    tax: Money,
}

struct CashbackBucket {
    period: String,
    amount: Money,
}

struct Aggregation {
    currency: String,
    subtotal: Money,
    total: Money,
    tax_total: Money,
    tax_buckets: Vec<TaxBucket>,
    recurrence_buckets: Vec<RecurrenceBucket>,
    cashback_buckets: Vec<CashbackBucket>,
}

impl Aggregation {
    fn new(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
            subtotal: Money::zero(currency),
            total: Money::zero(currency),
            tax_total: Money::zero(currency),
            tax_buckets: Vec::new(),
            recurrence_buckets: Vec::new(),
            cashback_buckets: Vec::new(),
        }
    }

    fn fold_item(&mut self, item: &PriceItem) -> Result<(), PricingError> {
        let currency = item.currency.clone().unwrap_or_else(|| self.currency.clone());
        let item_subtotal = amount_from_parts(
            item.amount_subtotal,
            item.amount_subtotal_decimal.as_deref(),
            &currency,
        )?;
        let item_total =
            amount_from_parts(item.amount_total, item.amount_total_decimal.as_deref(), &currency)?;
        let item_tax =
            amount_from_parts(item.amount_tax, item.amount_tax_decimal.as_deref(), &currency)?;

        self.subtotal = self.subtotal.checked_add(&item_subtotal)?;
        self.total = self.total.checked_add(&item_total)?;
        self.tax_total = self.tax_total.checked_add(&item_tax)?;

        match item.taxes.as_deref() {
            Some(entries) if !entries.is_empty() => {
                for entry in entries {
                    let amount = Money::from_minor_units(entry.amount, &currency);
                    self.add_tax_amount(entry.tax.clone(), amount)?;
                }
            }
            _ => self.add_tax_amount(None, Money::zero(&currency))?,
        }

        self.add_recurrence_amount(item, &item_subtotal, &item_total, &item_tax)?;

        if item.cashback_amount.is_some() || item.cashback_amount_decimal.is_some() {
            let amount = amount_from_parts(
                item.cashback_amount,
                item.cashback_amount_decimal.as_deref(),
                &currency,
            )?;
            let period = item.cashback_period.clone().unwrap_or_else(|| "0".to_string());
            self.add_cashback_amount(period, amount)?;
        }
        Ok(())
    }

    fn add_tax_amount(&mut self, tax: Option<Tax>, amount: Money) -> Result<(), PricingError> {
        let rate = tax.as_ref().map(|tax| tax.rate);
        match self
            .tax_buckets
            .iter_mut()
            .find(|bucket| bucket.tax.as_ref().map(|tax| tax.rate) == rate)
        {
            Some(bucket) => {
                bucket.amount = bucket.amount.checked_add(&amount)?;
            }
            None => self.tax_buckets.push(TaxBucket { tax, amount }),
        }
        Ok(())
    }

    fn add_recurrence_amount(
        &mut self,
        item: &PriceItem,
        subtotal: &Money,
        total: &Money,
        tax: &Money,
    ) -> Result<(), PricingError> {
        let recurrence_type = item.item_type.clone();
        let billing_period = item.billing_period.clone();
        match self.recurrence_buckets.iter_mut().find(|bucket| {
            bucket.recurrence_type == recurrence_type && bucket.billing_period == billing_period
        }) {
            Some(bucket) => {
                bucket.subtotal = bucket.subtotal.checked_add(subtotal)?;
                bucket.total = bucket.total.checked_add(total)?;
                bucket.tax = bucket.tax.checked_add(tax)?;
            }
            None => self.recurrence_buckets.push(RecurrenceBucket {
                recurrence_type,
                billing_period,
                subtotal: subtotal.clone(),
                total: total.clone(),
                tax: tax.clone(),
            }),
        }
        Ok(())
    }

    fn add_cashback_amount(&mut self, period: String, amount: Money) -> Result<(), PricingError> {
        match self
            .cashback_buckets
            .iter_mut()
            .find(|bucket| bucket.period == period)
        {
            Some(bucket) => {
                bucket.amount = bucket.amount.checked_add(&amount)?;
            }
            None => self.cashback_buckets.push(CashbackBucket { period, amount }),
        }
        Ok(())
    }

    fn into_totals(self) -> Totals {
        let cashbacks: Vec<CashbackAmount> = self
            .cashback_buckets
            .into_iter()
            .map(|bucket| CashbackAmount {
                cashback_period: bucket.period,
                amount_total: bucket.amount.to_cents(),
                amount_total_decimal: bucket.amount.to_decimal_string(),
            })
            .collect();

        let recurrences: Vec<RecurrenceAmount> = self
            .recurrence_buckets
            .into_iter()
            .map(|bucket| {
                let recurrence = RecurrenceAmount {
                    recurrence_type: bucket.recurrence_type,
                    billing_period: bucket.billing_period,
                    amount_subtotal: bucket.subtotal.to_cents(),
                    amount_subtotal_decimal: bucket.subtotal.to_decimal_string(),
                    amount_total: bucket.total.to_cents(),
                    amount_total_decimal: bucket.total.to_decimal_string(),
                    amount_tax: bucket.tax.to_cents(),
                    after_cashback_amount_total: None,
                    after_cashback_amount_total_decimal: None,
                };
                if cashbacks.is_empty() {
                    recurrence
                } else {
                    cashback::compute_recurrence_after_cashback(&recurrence, &cashbacks)
                }
            })
            .collect();

        let taxes: Vec<TaxAmount> = self
            .tax_buckets
            .into_iter()
            .map(|bucket| TaxAmount {
                tax: bucket.tax,
                amount: bucket.amount.to_cents(),
            })
            .collect();

        Totals {
            amount_subtotal: self.subtotal.to_cents(),
            amount_total: self.total.to_cents(),
            currency: self.currency,
            total_details: TotalDetails {
                amount_tax: self.tax_total.to_cents(),
                breakdown: TotalDetailsBreakdown {
                    taxes,
                    recurrences,
                    cashbacks,
                },
            },
        }
    }
}

fn first_currency(items: &[PriceItem]) -> Option<String> {
    items.iter().find_map(|item| match item.item_components.as_deref() {
        Some(components) => components.iter().find_map(|component| component.currency.clone()),
        None => item.currency.clone(),
    })
}

// ==================== Main Entry ====================

/// Aggregate computed line items into order totals
///
/// # Arguments
/// * `items` - Already computed items; composite parents fold per component
/// * `default_currency` - Currency when no item carries one
///
/// # Returns
/// Totals with tax, recurrence, and cashback breakdowns. Fails on the
/// first item with a malformed amount or a mismatched currency.
pub fn compute_aggregated_totals(
    items: &[PriceItem],
    default_currency: &str,
) -> Result<Totals, PricingError> {
    let currency = first_currency(items).unwrap_or_else(|| default_currency.to_uppercase());
    let mut aggregation = Aggregation::new(&currency);
    for item in items {
        match item.item_components.as_deref() {
            Some(components) => {
                for component in components {
                    aggregation.fold_item(component)?;
                }
            }
            None => aggregation.fold_item(item)?,
        }
    }
    Ok(aggregation.into_totals())
}
