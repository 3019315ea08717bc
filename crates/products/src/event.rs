//! Product domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricebook_events::Event;

use crate::product::{ProductField, ProductId};

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductUpdated (details changed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdated {
    pub product_id: ProductId,
    pub changed_fields: Vec<ProductField>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductActivated {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeactivated {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DiscountApplied (added or replaced).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountApplied {
    pub product_id: ProductId,
    pub percentage_numerator: i64,
    pub percentage_denominator: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DiscountRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRemoved {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductUpdated(ProductUpdated),
    ProductActivated(ProductActivated),
    ProductDeactivated(ProductDeactivated),
    DiscountApplied(DiscountApplied),
    DiscountRemoved(DiscountRemoved),
}

impl ProductEvent {
    pub fn product_id(&self) -> &ProductId {
        match self {
            ProductEvent::ProductCreated(e) => &e.product_id,
            ProductEvent::ProductUpdated(e) => &e.product_id,
            ProductEvent::ProductActivated(e) => &e.product_id,
            ProductEvent::ProductDeactivated(e) => &e.product_id,
            ProductEvent::DiscountApplied(e) => &e.product_id,
            ProductEvent::DiscountRemoved(e) => &e.product_id,
        }
    }
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "product.created",
            ProductEvent::ProductUpdated(_) => "product.updated",
            ProductEvent::ProductActivated(_) => "product.activated",
            ProductEvent::ProductDeactivated(_) => "product.deactivated",
            ProductEvent::DiscountApplied(_) => "discount.applied",
            ProductEvent::DiscountRemoved(_) => "discount.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductUpdated(e) => e.occurred_at,
            ProductEvent::ProductActivated(e) => e.occurred_at,
            ProductEvent::ProductDeactivated(e) => e.occurred_at,
            ProductEvent::DiscountApplied(e) => e.occurred_at,
            ProductEvent::DiscountRemoved(e) => e.occurred_at,
        }
    }
}
