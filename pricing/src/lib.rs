//! Pricing computation library
//!
//! Computes exact monetary amounts for billing line items: per-unit and
//! tiered pricing models, coupon discounts and cashbacks, billing-frequency
//! normalization, and aggregation of many items into order totals with tax,
//! recurrence, and cashback breakdowns.
//!
//! All arithmetic runs on fixed-precision decimals; integer amounts in the
//! wire model are 2-decimal minor units rounded half-up at the boundary,
//! each paired with a full-precision decimal string. Everything is pure and
//! deterministic, safe to call concurrently.

pub mod cashback;
pub mod discounts;
pub mod error;
pub mod format;
pub mod frequency;
pub mod item_calculator;
pub mod models;
pub mod money;
pub mod order_calculator;
pub mod relations;
pub mod tiers;

// Re-exports
pub use error::PricingError;
pub use frequency::BillingPeriod;
pub use money::{Money, DECIMAL_PRECISION, DEFAULT_CURRENCY};

// Wire model re-exports
pub use models::{
    CashbackAmount, Coupon, CouponCategory, CouponType, Price, PriceInputMapping, PriceItem,
    PriceTier, PricingModel, RecurrenceAmount, RedeemedPromo, Tax, TaxAmount, TierDetail, Totals,
};

// Calculator entry points
pub use cashback::compute_recurrence_after_cashback;
pub use item_calculator::{compute_composite_price_item, compute_price_item, ComputePriceItemOpts};
pub use order_calculator::compute_aggregated_totals;

// Presentation helpers
pub use format::{format_amount, format_amount_from_decimal, get_currency_symbol};
pub use relations::{extract_product_relations, ProductRelation};
