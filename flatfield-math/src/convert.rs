//! Conversions between fixed-point words of any width and doubles.

use crate::fixed_point::{Fixed, FixedResult, FP32_MAX};

/// Fractional bits a double can carry exactly.
const DOUBLE_FRACTION_BITS: u32 = 52;

/// Two's-complement `value` of width `bits` with `fraction_bits` fractional
/// bits, split into whole and fractional parts. `fraction_bits` is clamped to
/// `bits - 1` and to 52.
pub fn signed_to_double(value: i64, bits: u32, fraction_bits: u32) -> f64 {
    let bits = bits.clamp(1, 64);
    let fraction_bits = fraction_bits.min(bits - 1).min(DOUBLE_FRACTION_BITS);

    let mask_whole = if bits == 64 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };
    let mask_fraction = (1i64 << fraction_bits) - 1;

    // i128 so that i64::MIN does not overflow on the +1.
    let whole = if value < 0 {
        -((((!value & mask_whole) >> fraction_bits) as i128) + 1)
    } else {
        ((value & mask_whole) >> fraction_bits) as i128
    };
    let fraction = value & mask_fraction;

    whole as f64 + fraction as f64 / (mask_fraction + 1) as f64
}

/// Unsigned counterpart of [`signed_to_double`]; all 64 bits of a 64-bit
/// word contribute to the whole part.
pub fn unsigned_to_double(value: u64, bits: u32, fraction_bits: u32) -> f64 {
    let bits = bits.clamp(1, 64);
    let fraction_bits = fraction_bits.min(bits).min(DOUBLE_FRACTION_BITS);

    let mask_all = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let mask_fraction = (1u64 << fraction_bits) - 1;

    let whole = (value & mask_all) >> fraction_bits;
    let fraction = value & mask_fraction;

    whole as f64 + fraction as f64 / (mask_fraction as f64 + 1.0)
}

pub fn i8_to_double(value: i8, fraction_bits: u32) -> f64 {
    signed_to_double(value as i64, 8, fraction_bits)
}

pub fn i32_to_double(value: i32, fraction_bits: u32) -> f64 {
    signed_to_double(value as i64, 32, fraction_bits)
}

pub fn i64_to_double(value: i64, fraction_bits: u32) -> f64 {
    signed_to_double(value, 64, fraction_bits)
}

pub fn u8_to_double(value: u8, fraction_bits: u32) -> f64 {
    unsigned_to_double(value as u64, 8, fraction_bits)
}

pub fn u32_to_double(value: u32, fraction_bits: u32) -> f64 {
    unsigned_to_double(value as u64, 32, fraction_bits)
}

pub fn u64_to_double(value: u64, fraction_bits: u32) -> f64 {
    unsigned_to_double(value, 64, fraction_bits)
}

/// `|value| * 2^fraction_bits`, truncated, sign reapplied afterward.
pub fn double_to_fixed(value: f64, fraction_bits: u32) -> FixedResult {
    scale_magnitude(value, fraction_bits, f64::trunc)
}

/// Same as [`double_to_fixed`] but rounds the scaled magnitude to nearest.
pub fn double_to_fixed_rounded(value: f64, fraction_bits: u32) -> FixedResult {
    scale_magnitude(value, fraction_bits, f64::round)
}

fn scale_magnitude(value: f64, fraction_bits: u32, round: fn(f64) -> f64) -> FixedResult {
    if value.is_nan() || fraction_bits >= 31 {
        return FixedResult::Overflow;
    }
    let magnitude = round(value.abs() * (1u64 << fraction_bits) as f64);
    if magnitude > FP32_MAX as f64 {
        return FixedResult::Overflow;
    }
    let raw = magnitude as i32;
    FixedResult::Value(Fixed(if value < 0.0 { -raw } else { raw }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_point::{FP32_FWL, FP32_MIN};

    #[test]
    fn test_signed_to_double() {
        assert_eq!(signed_to_double(-1, 32, 8), -1.0 / 256.0);
        assert_eq!(signed_to_double(-256, 32, 8), -1.0);
        assert_eq!(signed_to_double(-257, 32, 8), -257.0 / 256.0);
        assert_eq!(signed_to_double(640, 32, 8), 2.5);
        assert_eq!(i8_to_double(-128, 0), -128.0);
        assert_eq!(i64_to_double(i64::MIN + 1, 0), (i64::MIN + 1) as f64);
    }

    #[test]
    fn test_fraction_bits_are_clamped() {
        // 8-bit word with more fractional bits than it has: clamp to 7.
        assert_eq!(i8_to_double(64, 20), 0.5);
        assert_eq!(u8_to_double(128, 20), 0.5);
    }

    #[test]
    fn test_unsigned_uses_full_64_bits() {
        assert_eq!(u64_to_double(1 << 63, 0), 9_223_372_036_854_775_808.0);
        assert_eq!(u32_to_double(u32::MAX, 8), u32::MAX as f64 / 256.0);
    }

    #[test]
    fn test_double_to_fixed_truncates_magnitude() {
        assert_eq!(double_to_fixed(1.999, FP32_FWL).to_raw(), 511);
        assert_eq!(double_to_fixed(-1.999, FP32_FWL).to_raw(), -511);
        assert_eq!(double_to_fixed_rounded(1.999, FP32_FWL).to_raw(), 512);
        assert_eq!(double_to_fixed_rounded(-1.999, FP32_FWL).to_raw(), -512);
    }

    #[test]
    fn test_double_to_fixed_out_of_range() {
        assert_eq!(double_to_fixed(f64::NAN, FP32_FWL), FixedResult::Overflow);
        assert_eq!(double_to_fixed(f64::INFINITY, FP32_FWL), FixedResult::Overflow);
        assert_eq!(double_to_fixed(9.0e6, FP32_FWL), FixedResult::Overflow);
        assert_eq!(double_to_fixed(1.0, 31), FixedResult::Overflow);
        let lowest = signed_to_double(FP32_MIN as i64, 32, FP32_FWL);
        assert_eq!(double_to_fixed(lowest, FP32_FWL).to_raw(), FP32_MIN);
    }
}
