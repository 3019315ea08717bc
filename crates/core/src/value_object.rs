//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. `Money` and `Discount` are the value objects of this
//! workspace.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new instance and replace the owner's copy. Aggregates copy value
/// objects in and out, so callers never alias an aggregate's internal state.
///
/// ```ignore
/// let a = Money::from_fraction(1999, 100)?;
/// let b = Money::from_fraction(3998, 200)?;
/// assert_eq!(a, b); // equal by value (same reduced rational)
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
