//! Wire data model shared by the calculators

pub mod coupon;
pub mod item;
pub mod price;
pub mod totals;

// Re-exports
pub use coupon::{Coupon, CouponCategory, CouponType, RedeemedPromo};
pub use item::{PriceItem, Product, TaxAmount, TierDetail};
pub use price::{
    ApplicableTax, ExternalFeeMapping, Price, PriceInputMapping, PriceTier, PricingModel, Tax,
    PRICE_TYPE_ONE_TIME, PRICE_TYPE_RECURRING,
};
pub use totals::{CashbackAmount, RecurrenceAmount, TotalDetails, TotalDetailsBreakdown, Totals};

pub(crate) use price::amount_from_parts;
