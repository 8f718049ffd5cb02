//! # flatfield-ops
//!
//! Pixel and region primitives over buffers registered in a
//! [`flatfield_core::Workspace`].
//!
//! Every operation resolves all of its operands through
//! [`Workspace::region`](flatfield_core::Workspace::region) before touching a
//! pixel, so a bad address or an oversized request fails before anything is
//! written. Per-pixel overflow does not stop an elementwise operation: the
//! sentinel is stored, processing continues, and the operation returns
//! [`InvalidNumber`](flatfield_core::PreprocessingError::InvalidNumber).
//!
//! Operations take `(ws, src.., rows, cols, .., dst)`; `src` and `dst` may be
//! the same address.

pub mod arith;
pub mod fill;
pub mod gain;
mod kernel;
pub mod mask;
pub mod roi;
pub mod stats;
pub mod transfer;

pub use arith::{
    add_images, add_scalar, divide_images, divide_scalar, log10_image, mean_image,
    multiply_images, multiply_scalar, sqrt_image, subtract_images, subtract_scalar, sum_image,
};
pub use fill::{equal_images, zero};
pub use gain::{flatfield, normalize};
pub use mask::{
    equal_thresh, get_mask, mask_images_log10, over_thresh, under_thresh, MAX_MASK_PLANES,
};
pub use roi::{
    add_roi, clear_outside_roi, create_roi, insert_roi, shift_image, subtract_roi, RoiWindow,
};
pub use stats::{fivesigma, mean, MeanStats, OutlierStats};
pub use transfer::{load_image, store_image};
