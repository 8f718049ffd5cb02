//! # flatfield-math
//!
//! Deterministic Q24.8 fixed-point arithmetic for flatfield calibration.
//!
//! A stored sample is an `i32` with 8 fractional bits. `i32::MIN` is reserved
//! as the NaN sentinel; inside this crate a valid value is a [`Fixed`] and
//! every operation that can leave [MIN, MAX] returns
//! [`FixedResult::Overflow`] instead of wrapping or clamping.
//!
//! - [`ops`]: add / subtract / multiply / divide / compare / int conversion
//! - [`convert`]: signed and unsigned words of 8/32/64 bits to double, and back
//! - [`FixedBuffer`]: a flat run of stored words with bulk conversions
//!
//! **Zero external dependencies** (besides `thiserror` and `serde` derives).

pub mod convert;
pub mod fixed_point;
pub mod ops;

pub use convert::{double_to_fixed, double_to_fixed_rounded, signed_to_double, unsigned_to_double};
pub use fixed_point::{
    Fixed, FixedBuffer, FixedPointError, FixedResult, FP32_FWL, FP32_MAX, FP32_MIN, FP32_NAN,
    FP32_ONE,
};
pub use ops::{add, compare, divide, int_to_fixed, multiply, subtract};
