//! `pricebook-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod change_tracker;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::AggregateRoot;
pub use change_tracker::ChangeTracker;
pub use error::{DomainError, DomainResult};
pub use id::AggregateId;
pub use money::{Money, ratio, to_fraction};
pub use value_object::ValueObject;

/// Re-exported so downstream crates share one rational type.
pub use num_rational::BigRational;
