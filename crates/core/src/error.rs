//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, lifecycle rules). Storage and commit failures belong to infra.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A rational was constructed with a zero or negative denominator.
    #[error("invalid denominator: must be > 0")]
    InvalidDenominator,

    /// Discount percentage outside of `[0, 1]` (or otherwise malformed).
    #[error("invalid discount: {0}")]
    InvalidDiscount(String),

    /// Discount window ends before it starts, or is not valid at application time.
    #[error("invalid discount period")]
    InvalidDiscountPeriod,

    /// Operation requires an Active product.
    #[error("product not active")]
    ProductNotActive,

    /// A requested aggregate was not found.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_discount(msg: impl Into<String>) -> Self {
        Self::InvalidDiscount(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Malformed construction arguments (money, discount, required text).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::InvalidDenominator | Self::InvalidDiscount(_)
        )
    }
}
