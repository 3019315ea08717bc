//! Effective price computation.

use chrono::{DateTime, Utc};

use pricebook_core::Money;

use crate::product::Product;

/// Stateless pricing rules.
///
/// A product always carries a base price, so the calculation is total: there
/// is no "missing price" outcome to handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct PricingCalculator;

impl PricingCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Base price adjusted by the discount valid at `at`, if any.
    ///
    /// `base * (1 - percentage)` in exact rational arithmetic.
    pub fn effective_price(&self, product: &Product, at: DateTime<Utc>) -> Money {
        let base = product.base_price();
        match product.discount() {
            Some(discount) if discount.is_valid_at(at) => discount.discounted(base),
            _ => base.clone(),
        }
    }
}
