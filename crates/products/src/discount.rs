//! Percentage discount with a validity window.

use chrono::{DateTime, Utc};

use pricebook_core::{BigRational, DomainError, DomainResult, Money, ValueObject, ratio, to_fraction};

/// Immutable percentage-based discount, e.g. 20% == `20/100`.
///
/// Invariants: `0 <= percentage <= 1` and `start_at <= end_at`.
/// "Changing" a discount means replacing the product's copy with a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discount {
    percentage: BigRational,
    fraction: (i64, i64),
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
}

impl ValueObject for Discount {}

impl Discount {
    pub fn new(
        percentage: BigRational,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let zero = BigRational::from_integer(0.into());
        let one = BigRational::from_integer(1.into());
        if percentage < zero || percentage > one {
            return Err(DomainError::invalid_discount(
                "percentage must be between 0 and 1",
            ));
        }

        if end_at < start_at {
            return Err(DomainError::InvalidDiscountPeriod);
        }

        let fraction = to_fraction(&percentage)
            .map_err(|_| DomainError::invalid_discount("percentage exceeds i64 precision"))?;

        Ok(Self {
            percentage,
            fraction,
            start_at,
            end_at,
        })
    }

    /// Construct from an integer pair (`20, 100` == 20%).
    pub fn from_fraction(
        numerator: i64,
        denominator: i64,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let percentage = ratio(numerator, denominator)
            .map_err(|_| DomainError::invalid_discount("percentage denominator must be > 0"))?;
        Self::new(percentage, start_at, end_at)
    }

    pub fn percentage(&self) -> &BigRational {
        &self.percentage
    }

    /// Reduced `(numerator, denominator)` of the percentage.
    pub fn percentage_fraction(&self) -> (i64, i64) {
        self.fraction
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.end_at
    }

    /// Valid iff `start_at <= at <= end_at` (both ends inclusive).
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.start_at <= at && at <= self.end_at
    }

    /// `base * (1 - percentage)`, exact. Ignores the validity window.
    pub fn discounted(&self, base: &Money) -> Money {
        let one = BigRational::from_integer(1.into());
        base.multiply_by(&(one - &self.percentage))
    }
}

/// Validity of an optional discount; an absent discount is never valid.
pub fn valid_at(discount: Option<&Discount>, at: DateTime<Utc>) -> bool {
    discount.is_some_and(|d| d.is_valid_at(at))
}
