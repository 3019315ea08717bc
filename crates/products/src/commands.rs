//! Write-side command inputs.
//!
//! Commands carry raw interchange values (integer fraction pairs, optional
//! strings). Value objects are built from them before any aggregate is touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricebook_core::{DomainResult, Money};

use crate::discount::Discount;
use crate::product::ProductId;

/// Command: CreateProduct.
///
/// `product_id` is optional. When supplied it doubles as an idempotency key: a
/// retried create with the same id conflicts instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub base_price_numerator: i64,
    pub base_price_denominator: i64,
}

impl CreateProduct {
    pub fn base_price(&self) -> DomainResult<Money> {
        Money::from_fraction(self.base_price_numerator, self.base_price_denominator)
    }
}

/// Command: UpdateProduct. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Command: ApplyDiscount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyDiscount {
    pub product_id: ProductId,
    pub percentage_numerator: i64,
    pub percentage_denominator: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl ApplyDiscount {
    pub fn discount(&self) -> DomainResult<Discount> {
        Discount::from_fraction(
            self.percentage_numerator,
            self.percentage_denominator,
            self.start_at,
            self.end_at,
        )
    }
}
