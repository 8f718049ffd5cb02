use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::convert;
use crate::ops;

/// Fixed-Point Arithmetic with 8 fractional bits (Q24.8)
/// Dynamic range: [-8388608.0, 8388608.0)
/// Precision: 2^-8 (~0.0039)
/// Overflow behavior: reported, never wrapped or clamped
pub const FP32_FWL: u32 = 8;
pub const FP32_MAX: i32 = i32::MAX;
pub const FP32_MIN: i32 = i32::MIN + 1;
/// Reserved word marking an overflowed sample in stored buffers.
pub const FP32_NAN: i32 = i32::MIN;
/// 1.0 in Q24.8, also the "true" value of a binary mask pixel.
pub const FP32_ONE: i32 = 1 << FP32_FWL;

/// A valid Q24.8 value. The NaN word can never be held here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fixed(pub(crate) i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FP32_ONE);
    pub const MAX: Fixed = Fixed(FP32_MAX);
    pub const MIN: Fixed = Fixed(FP32_MIN);

    /// Decode a stored word; `None` for the NaN sentinel.
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw != FP32_NAN).then_some(Self(raw))
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Integer to Q24.8 (`value << 8`).
    pub fn from_int(value: i32) -> FixedResult {
        ops::int_to_fixed(value, FP32_FWL)
    }

    /// Truncating conversion from a double.
    pub fn from_f64(value: f64) -> FixedResult {
        convert::double_to_fixed(value, FP32_FWL)
    }

    /// Round-to-nearest conversion from a double.
    pub fn from_f64_rounded(value: f64) -> FixedResult {
        convert::double_to_fixed_rounded(value, FP32_FWL)
    }

    pub fn to_f64(self) -> f64 {
        convert::signed_to_double(self.0 as i64, 32, FP32_FWL)
    }

    /// Integer part, truncated toward zero.
    pub fn trunc_int(self) -> i32 {
        self.0 / FP32_ONE
    }

    /// Never overflows: `|MIN| == MAX`.
    pub fn abs(self) -> Fixed {
        Fixed(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

/// Outcome of every kernel operation that can leave the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedResult {
    Value(Fixed),
    Overflow,
}

impl FixedResult {
    /// Interpret a stored word; the NaN sentinel decodes to `Overflow`.
    pub fn from_raw(raw: i32) -> Self {
        match Fixed::from_raw(raw) {
            Some(v) => FixedResult::Value(v),
            None => FixedResult::Overflow,
        }
    }

    /// Encode for storage; `Overflow` becomes the NaN sentinel.
    pub fn to_raw(self) -> i32 {
        match self {
            FixedResult::Value(v) => v.0,
            FixedResult::Overflow => FP32_NAN,
        }
    }

    /// Range check of a widened intermediate against [MIN, MAX].
    pub(crate) fn from_wide(value: i64) -> Self {
        if value < FP32_MIN as i64 || value > FP32_MAX as i64 {
            FixedResult::Overflow
        } else {
            FixedResult::Value(Fixed(value as i32))
        }
    }

    pub fn is_overflow(self) -> bool {
        matches!(self, FixedResult::Overflow)
    }

    pub fn value(self) -> Option<Fixed> {
        match self {
            FixedResult::Value(v) => Some(v),
            FixedResult::Overflow => None,
        }
    }

    pub fn ok_or<E>(self, err: E) -> Result<Fixed, E> {
        self.value().ok_or(err)
    }

    pub fn ok_or_else<E, F>(self, err: F) -> Result<Fixed, E>
    where
        F: FnOnce() -> E,
    {
        self.value().ok_or_else(err)
    }

    pub fn and_then<F>(self, f: F) -> FixedResult
    where
        F: FnOnce(Fixed) -> FixedResult,
    {
        match self {
            FixedResult::Value(v) => f(v),
            FixedResult::Overflow => FixedResult::Overflow,
        }
    }

    /// Apply a binary op; an overflowed operand poisons the result.
    pub fn zip_with<F>(self, other: FixedResult, f: F) -> FixedResult
    where
        F: FnOnce(Fixed, Fixed) -> FixedResult,
    {
        match (self, other) {
            (FixedResult::Value(a), FixedResult::Value(b)) => f(a, b),
            _ => FixedResult::Overflow,
        }
    }
}

impl From<Fixed> for FixedResult {
    fn from(value: Fixed) -> Self {
        FixedResult::Value(value)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    #[error("Shape mismatch: {0} vs {1}")]
    ShapeMismatch(usize, usize),
    #[error("Fixed-point overflow in {0}")]
    Overflow(&'static str),
}

/// Flat buffer of stored Q24.8 words (the NaN sentinel is allowed here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedBuffer {
    pub data: Vec<i32>,
}

impl FixedBuffer {
    /// Create a new buffer of zeros
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Integer detector samples, shifted into Q24.8. Samples that do not fit
    /// become the NaN sentinel.
    pub fn from_ints(samples: &[i32]) -> Self {
        let data = samples
            .iter()
            .map(|&s| ops::int_to_fixed(s, FP32_FWL).to_raw())
            .collect();
        Self { data }
    }

    /// Round-to-nearest conversion of doubles.
    pub fn from_f64(values: &[f64]) -> Self {
        let data = values
            .iter()
            .map(|&v| Fixed::from_f64_rounded(v).to_raw())
            .collect();
        Self { data }
    }

    /// Convert back to f64; sentinel words become `f64::NAN`.
    pub fn to_f64(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|&w| Fixed::from_raw(w).map_or(f64::NAN, Fixed::to_f64))
            .collect()
    }

    /// Number of sentinel words.
    pub fn overflow_count(&self) -> usize {
        self.data.iter().filter(|&&w| w == FP32_NAN).count()
    }

    /// Element-wise checked addition
    pub fn add(&self, other: &Self) -> Result<Self, FixedPointError> {
        self.zip(other, "add", ops::add)
    }

    /// Element-wise checked subtraction
    pub fn sub(&self, other: &Self) -> Result<Self, FixedPointError> {
        self.zip(other, "subtract", ops::subtract)
    }

    fn zip(
        &self,
        other: &Self,
        op: &'static str,
        f: fn(Fixed, Fixed) -> FixedResult,
    ) -> Result<Self, FixedPointError> {
        if self.len() != other.len() {
            return Err(FixedPointError::ShapeMismatch(self.len(), other.len()));
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| {
                FixedResult::from_raw(a)
                    .zip_with(FixedResult::from_raw(b), f)
                    .ok_or(FixedPointError::Overflow(op))
                    .map(Fixed::raw)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { data })
    }

    /// Returns the number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
