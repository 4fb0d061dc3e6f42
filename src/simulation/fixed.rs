//! Deterministic 48.16 fixed-point numbers used for every economic quantity.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::simulation::PopSize;

const PRECISION: u32 = 16;
const ONE_RAW: i64 = 1 << PRECISION;
const FRAC_MASK: i64 = ONE_RAW - 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct FixedPoint(i64);

impl FixedPoint {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE_RAW);
    pub const TWO: Self = Self(2 * ONE_RAW);
    pub const HALF: Self = Self(ONE_RAW / 2);
    pub const ONE_AND_HALF: Self = Self(ONE_RAW + ONE_RAW / 2);

    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn from_int(value: i64) -> Self {
        Self(value << PRECISION)
    }

    /// Nearest representable value; only used at data-loading boundaries.
    pub fn from_f64(value: f64) -> Self {
        Self((value * ONE_RAW as f64).round() as i64)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    /// Integer part, rounding towards negative infinity.
    pub const fn to_int(self) -> i64 {
        self.0 >> PRECISION
    }

    /// Integer part as a pop count, saturating at the pop size range.
    pub fn to_pop_size(self) -> PopSize {
        self.to_int().clamp(PopSize::MIN as i64, PopSize::MAX as i64) as PopSize
    }

    pub const fn floor(self) -> Self {
        Self(self.0 & !FRAC_MASK)
    }

    pub const fn ceil(self) -> Self {
        let floored = self.0 & !FRAC_MASK;
        if self.0 & FRAC_MASK != 0 {
            Self(floored + ONE_RAW)
        } else {
            Self(floored)
        }
    }

    pub const fn is_integer(self) -> bool {
        self.0 & FRAC_MASK == 0
    }
}

impl From<f64> for FixedPoint {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<FixedPoint> for f64 {
    fn from(value: FixedPoint) -> Self {
        value.to_f64()
    }
}

impl From<PopSize> for FixedPoint {
    fn from(value: PopSize) -> Self {
        Self::from_int(value as i64)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

impl Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for FixedPoint {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for FixedPoint {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i128 * rhs.0 as i128) >> PRECISION) as i64)
    }
}

impl MulAssign for FixedPoint {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// Truncates towards zero, matching integer division on the raw value.
impl Div for FixedPoint {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self((((self.0 as i128) << PRECISION) / rhs.0 as i128) as i64)
    }
}

impl Mul<PopSize> for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: PopSize) -> Self {
        Self(self.0 * rhs as i64)
    }
}

impl Div<PopSize> for FixedPoint {
    type Output = Self;

    fn div(self, rhs: PopSize) -> Self {
        Self(self.0 / rhs as i64)
    }
}

impl std::iter::Sum for FixedPoint {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
