//! # flatfield
//!
//! Fixed-point flatfield (gain) calibration from N overlapping frames of the
//! same scene.
//!
//! | crate | role |
//! |-------|------|
//! | [`math`] | Q24.8 values, the NaN sentinel and checked kernel arithmetic |
//! | [`core`] | address space, working memory and the bulk store |
//! | [`ops`] | bounds-checked image operations |
//! | [`calib`] | masking, pairwise accumulation and gain refinement |
//! | [`io`] | FITS frames and displacement tables |

pub use flatfield_calib as calib;
pub use flatfield_core as core;
pub use flatfield_io as io;
pub use flatfield_math as math;
pub use flatfield_ops as ops;

pub use flatfield_calib::{Calibration, CalibrationConfig, CalibrationError, CalibrationReport, GainMap};
