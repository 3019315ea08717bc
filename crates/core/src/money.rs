//! Exact-rational monetary value.
//!
//! Amounts are arbitrary-precision rationals, so multiplying `99.99` by `0.85`
//! yields the exact product `84.9915` (`169983/2000`) instead of a rounded
//! decimal. Numerator/denominator `i64` pairs are the interchange shape at
//! every boundary (storage, events, queries).

use core::cmp::Ordering;
use core::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Build an exact rational from an integer pair (denominator must be > 0).
pub fn ratio(numerator: i64, denominator: i64) -> DomainResult<BigRational> {
    if denominator <= 0 {
        return Err(DomainError::InvalidDenominator);
    }
    Ok(BigRational::new(
        BigInt::from(numerator),
        BigInt::from(denominator),
    ))
}

/// Reduced `(numerator, denominator)` pair of a rational.
///
/// Fails when either side does not fit into an `i64`.
pub fn to_fraction(value: &BigRational) -> DomainResult<(i64, i64)> {
    let numerator = value
        .numer()
        .to_i64()
        .ok_or_else(|| DomainError::invalid_input("numerator exceeds i64 range"))?;
    let denominator = value
        .denom()
        .to_i64()
        .ok_or_else(|| DomainError::invalid_input("denominator exceeds i64 range"))?;
    Ok((numerator, denominator))
}

/// Immutable monetary value backed by an exact rational.
///
/// Every operation returns a new instance. The internal rational is always
/// kept reduced with a strictly positive denominator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Money {
    value: BigRational,
}

impl ValueObject for Money {}

impl Money {
    /// Construct from an integer numerator/denominator (`1999, 100` == 19.99).
    pub fn from_fraction(numerator: i64, denominator: i64) -> DomainResult<Self> {
        Ok(Self {
            value: ratio(numerator, denominator)?,
        })
    }

    /// Multiply by an exact ratio (e.g. `1 - discount`).
    pub fn multiply_by(&self, ratio: &BigRational) -> Self {
        Self {
            value: &self.value * ratio,
        }
    }

    pub fn add(&self, other: &Money) -> Self {
        Self {
            value: &self.value + &other.value,
        }
    }

    pub fn subtract(&self, other: &Money) -> Self {
        Self {
            value: &self.value - &other.value,
        }
    }

    /// Exact three-way comparison.
    pub fn compare(&self, other: &Money) -> Ordering {
        self.value.cmp(&other.value)
    }

    pub fn is_negative(&self) -> bool {
        self.value < BigRational::zero()
    }

    /// Reduced `(numerator, denominator)` pair for persistence and transport.
    pub fn fraction(&self) -> DomainResult<(i64, i64)> {
        to_fraction(&self.value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.denom().is_one() {
            write!(f, "{}", self.value.numer())
        } else {
            write!(f, "{}/{}", self.value.numer(), self.value.denom())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_non_positive_denominator() {
        assert_eq!(
            Money::from_fraction(100, 0).unwrap_err(),
            DomainError::InvalidDenominator
        );
        assert_eq!(
            Money::from_fraction(100, -5).unwrap_err(),
            DomainError::InvalidDenominator
        );
    }

    #[test]
    fn fraction_is_reduced() {
        let m = Money::from_fraction(10000, 100).unwrap();
        assert_eq!(m.fraction().unwrap(), (100, 1));

        let m = Money::from_fraction(1999, 100).unwrap();
        assert_eq!(m.fraction().unwrap(), (1999, 100));
    }

    #[test]
    fn multiplication_is_exact() {
        // 99.99 * 0.85 = 84.9915 exactly
        let price = Money::from_fraction(9999, 100).unwrap();
        let factor = ratio(85, 100).unwrap();

        let product = price.multiply_by(&factor);
        assert_eq!(product, Money::from_fraction(849915, 10000).unwrap());
        assert_eq!(product.fraction().unwrap(), (169983, 2000));
    }

    #[test]
    fn subtraction_and_comparison() {
        let a = Money::from_fraction(1999, 100).unwrap();
        let b = Money::from_fraction(999, 100).unwrap();

        assert_eq!(a.subtract(&b), Money::from_fraction(10, 1).unwrap());
        assert_eq!(a.add(&b), Money::from_fraction(2998, 100).unwrap());
        assert_eq!(a.compare(&b), Ordering::Greater);
        assert_eq!(b.compare(&a), Ordering::Less);
        assert_eq!(a.compare(&Money::from_fraction(3998, 200).unwrap()), Ordering::Equal);
        assert!(b.subtract(&a).is_negative());
    }

    #[test]
    fn operations_do_not_mutate_receiver() {
        let a = Money::from_fraction(5, 1).unwrap();
        let _ = a.multiply_by(&ratio(1, 2).unwrap());
        let _ = a.subtract(&Money::from_fraction(1, 1).unwrap());
        assert_eq!(a.fraction().unwrap(), (5, 1));
    }

    #[test]
    fn display_formats_fraction() {
        assert_eq!(Money::from_fraction(1999, 100).unwrap().to_string(), "1999/100");
        assert_eq!(Money::from_fraction(80, 1).unwrap().to_string(), "80");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: reading back the fraction yields the same rational value.
        #[test]
        fn fraction_round_trips_value(
            n in -1_000_000_000_000i64..1_000_000_000_000i64,
            d in 1i64..1_000_000_000i64,
        ) {
            let money = Money::from_fraction(n, d).unwrap();
            let (rn, rd) = money.fraction().unwrap();

            prop_assert!(rd > 0);
            prop_assert_eq!((rn as i128) * (d as i128), (n as i128) * (rd as i128));
            prop_assert_eq!(Money::from_fraction(rn, rd).unwrap(), money);
        }

        /// Property: multiplying by r and then by 1/r returns the original exactly.
        #[test]
        fn multiply_by_inverse_is_identity(
            n in -1_000_000_000i64..1_000_000_000i64,
            d in 1i64..1_000_000i64,
            rn in 1i64..10_000i64,
            rd in 1i64..10_000i64,
            negate in any::<bool>(),
        ) {
            let money = Money::from_fraction(n, d).unwrap();
            let r = ratio(if negate { -rn } else { rn }, rd).unwrap();
            let inverse = r.recip();

            prop_assert_eq!(money.multiply_by(&r).multiply_by(&inverse), money);
        }
    }
}
