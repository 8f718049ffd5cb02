//! Scalar Q24.8 kernel. Every operation widens to 64 bits and reports
//! [`FixedResult::Overflow`] when the result leaves [MIN, MAX].

use std::cmp::Ordering;

use crate::fixed_point::{Fixed, FixedResult};

/// Shifts at or beyond this width cannot be represented in a 32-bit word.
const MAX_SHIFT: u32 = 31;

pub fn add(a: Fixed, b: Fixed) -> FixedResult {
    FixedResult::from_wide(a.0 as i64 + b.0 as i64)
}

pub fn subtract(a: Fixed, b: Fixed) -> FixedResult {
    FixedResult::from_wide(a.0 as i64 - b.0 as i64)
}

/// `(a * b) >> fraction_bits` with an arithmetic shift.
pub fn multiply(a: Fixed, b: Fixed, fraction_bits: u32) -> FixedResult {
    if fraction_bits >= MAX_SHIFT {
        return FixedResult::Overflow;
    }
    FixedResult::from_wide((a.0 as i64 * b.0 as i64) >> fraction_bits)
}

/// Precision-preserving division.
///
/// The dividend magnitude is shifted left by the number of headroom bits it
/// has below bit 31 (at most `fraction_bits`), divided, then shifted back by
/// whatever headroom was missing. Small dividends therefore keep all their
/// fractional bits; large ones trade low bits for range.
pub fn divide(a: Fixed, b: Fixed, fraction_bits: u32) -> FixedResult {
    if b.0 == 0 || fraction_bits >= MAX_SHIFT {
        return FixedResult::Overflow;
    }
    let magnitude = (a.0 as i64).abs();

    // Highest bit set inside the top `fraction_bits` bits of the magnitude.
    let top = magnitude >> (MAX_SHIFT - fraction_bits);
    let exceeded = (0..fraction_bits)
        .filter(|n| top & (1 << n) != 0)
        .last()
        .map_or(0, |n| n + 1);

    let quotient = ((magnitude << (fraction_bits - exceeded)) / b.0 as i64) << exceeded;
    FixedResult::from_wide(if a.0 < 0 { -quotient } else { quotient })
}

/// Three-way ordering of stored words. The NaN sentinel sorts below every
/// valid value, so windows with a valid lower bound reject it.
pub fn compare(a: i32, b: i32) -> Ordering {
    a.cmp(&b)
}

/// `value << fraction_bits` with the same range check as [`add`].
pub fn int_to_fixed(value: i32, fraction_bits: u32) -> FixedResult {
    if fraction_bits > 32 {
        return FixedResult::Overflow;
    }
    FixedResult::from_wide((value as i64) << fraction_bits)
}
