//! Products domain module.
//!
//! This crate contains business rules for the product catalog, implemented
//! purely as deterministic domain logic (no IO, no clock, no storage).

pub mod commands;
pub mod discount;
pub mod event;
pub mod pricing;
pub mod product;

pub use commands::{ApplyDiscount, CreateProduct, UpdateProduct};
pub use discount::{Discount, valid_at};
pub use event::{
    DiscountApplied, DiscountRemoved, ProductActivated, ProductCreated, ProductDeactivated,
    ProductEvent, ProductUpdated,
};
pub use pricing::PricingCalculator;
pub use product::{Product, ProductField, ProductId, ProductSnapshot, ProductStatus};

/// Aggregate type tag used on outbox records.
pub const AGGREGATE_TYPE: &str = "product";
