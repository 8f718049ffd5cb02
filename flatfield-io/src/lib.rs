//! # flatfield-io
//!
//! File-side collaborators of the calibration: FITS frames, the text
//! displacement table, and filling a [`NandFlash`](flatfield_core::NandFlash)
//! bulk store from them.

use thiserror::Error;

pub mod displacement;
pub mod fits;
pub mod nand;

pub use displacement::DisplacementTable;
pub use fits::{FitsError, FitsImage, HeaderCard};
pub use nand::populate_store;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("FITS error: {0}")]
    Fits(#[from] FitsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bulk store error: {0}")]
    Store(#[from] flatfield_core::PreprocessingError),
    #[error("Displacement table line {line}: {reason}")]
    Displacement { line: usize, reason: String },
    #[error("Displacement table has {rows} rows for {frames} frames")]
    TableLength { rows: usize, frames: usize },
    #[error("{what} is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    Shape {
        what: String,
        rows: u16,
        cols: u16,
        expected_rows: u16,
        expected_cols: u16,
    },
}
