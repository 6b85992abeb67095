use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// 128-bit token quantity in base units.
///
/// Arithmetic operators panic on overflow/underflow; ledger code that
/// can legitimately run out of funds uses the checked variants and
/// surfaces an error instead.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub const fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Floor of `self * numerator / denominator`, widening through a
    /// 256-bit intermediate so the product cannot overflow.
    ///
    /// Returns `None` when `denominator` is zero. The quotient always
    /// fits in 128 bits when `numerator <= denominator`, which holds
    /// for every proportional split in the protocol (a participant's
    /// weight never exceeds the recorded total).
    pub fn checked_mul_div(self, numerator: Amount, denominator: Amount) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        let product = BigUint::from(self.0) * BigUint::from(numerator.0);
        let quotient = product / BigUint::from(denominator.0);
        u128::try_from(quotient).ok().map(Self)
    }

    /// Floor of `self * pct / 100`. `pct` is clamped to 100.
    pub fn percent(self, pct: u8) -> Self {
        let pct = u128::from(pct.min(100));
        let product = BigUint::from(self.0) * BigUint::from(pct);
        let quotient = product / BigUint::from(100u32);
        // quotient <= self with pct clamped
        Self(u128::try_from(quotient).unwrap_or(u128::MAX))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        match self.checked_add(rhs) {
            Some(v) => v,
            None => panic!("amount overflow: {} + {}", self.0, rhs.0),
        }
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        match self.checked_sub(rhs) {
            Some(v) => v,
            None => panic!("amount underflow: {} - {}", self.0, rhs.0),
        }
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Self(v)
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Self(v as u128)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_arithmetic() {
        let a = Amount::new(500);
        let b = Amount::new(300);
        assert_eq!(a + b, Amount::new(800));
        assert_eq!(a - b, Amount::new(200));
        assert_eq!(a.checked_sub(Amount::new(600)), None);
        assert_eq!(Amount::MAX.checked_add(Amount::new(1)), None);
    }

    #[test]
    fn test_mul_div_floor() {
        let pool = Amount::new(1000);
        // 1000 * 500 / 1300 = 384.6... -> 384
        let share = pool
            .checked_mul_div(Amount::new(500), Amount::new(1300))
            .unwrap();
        assert_eq!(share, Amount::new(384));
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        let pool = Amount::new(1000);
        assert_eq!(pool.checked_mul_div(Amount::new(1), Amount::ZERO), None);
    }

    #[test]
    fn test_mul_div_no_overflow_at_scale() {
        // 10^27 * 10^27 overflows u128; widening must handle it.
        let big = Amount::new(10u128.pow(27));
        let share = big.checked_mul_div(big, big).unwrap();
        assert_eq!(share, big);
    }

    #[test]
    fn test_percent() {
        assert_eq!(Amount::new(1000).percent(50), Amount::new(500));
        assert_eq!(Amount::new(1000).percent(0), Amount::ZERO);
        assert_eq!(Amount::new(1000).percent(100), Amount::new(1000));
        // floor
        assert_eq!(Amount::new(99).percent(50), Amount::new(49));
        // clamped
        assert_eq!(Amount::new(10).percent(200), Amount::new(10));
    }

    proptest! {
        /// A proportional share never exceeds the pool when the
        /// participant's weight is bounded by the total.
        #[test]
        fn prop_share_bounded_by_pool(
            pool in 0u128..=u128::MAX / 2,
            weight in 0u128..1_000_000_000u128,
            extra in 0u128..1_000_000_000u128,
        ) {
            let total = weight + extra + 1;
            let share = Amount::new(pool)
                .checked_mul_div(Amount::new(weight), Amount::new(total))
                .unwrap();
            prop_assert!(share <= Amount::new(pool));
        }

        /// Splitting a pool across two participants pays out at most
        /// the pool, and each payout is within 1 of the exact share.
        #[test]
        fn prop_two_way_split_conserves_pool(
            pool in 0u128..=10u128.pow(30),
            w1 in 1u128..10u128.pow(24),
            w2 in 1u128..10u128.pow(24),
        ) {
            let total = Amount::new(w1 + w2);
            let p1 = Amount::new(pool).checked_mul_div(Amount::new(w1), total).unwrap();
            let p2 = Amount::new(pool).checked_mul_div(Amount::new(w2), total).unwrap();
            prop_assert!(p1 + p2 <= Amount::new(pool));
            // the rounding loss across two floors is at most 2 units
            prop_assert!(pool - (p1 + p2).raw() <= 2);
        }
    }
}
