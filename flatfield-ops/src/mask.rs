//! Packed mask planes and threshold masks.
//!
//! A combined mask stores one validity bit per frame above the fractional
//! field: plane `i` is bit `FP32_FWL + i`, so a single plane extracted with
//! [`get_mask`] reads as exactly 1.0 or 0.

use std::cmp::Ordering;

use flatfield_core::{PreprocessingError, Result, Workspace};
use flatfield_math::{compare, Fixed, FP32_FWL, FP32_NAN, FP32_ONE};

use crate::kernel::NumericTally;

/// Planes that fit between the fractional field and the sign bit.
pub const MAX_MASK_PLANES: u16 = (31 - FP32_FWL) as u16;

fn plane_bit(index: u16) -> Result<i32> {
    if index >= MAX_MASK_PLANES {
        return Err(PreprocessingError::InvalidMaskPlane { index });
    }
    Ok(FP32_ONE << index)
}

/// Accept pixels in `(i_min, i_max]`.
///
/// Accepted pixels set plane `index` in `dst` and, when positive, are
/// replaced in place by their base-10 logarithm. Rejected pixels clear the
/// plane and are zeroed.
#[allow(clippy::too_many_arguments)]
pub fn mask_images_log10(
    ws: &mut Workspace,
    src: u32,
    rows: u16,
    cols: u16,
    index: u16,
    i_min: Fixed,
    i_max: Fixed,
    dst: u32,
) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;
    let bit = plane_bit(index)?;

    let mut tally = NumericTally::new("mask_images_log10");
    for p in 0..s.len() {
        let value = ws.read(s, p)?;
        let accepted = compare(value, i_min.raw()) == Ordering::Greater
            && compare(value, i_max.raw()) != Ordering::Greater;

        let replaced = match Fixed::from_raw(value) {
            Some(v) if accepted && v.is_positive() => Fixed::from_f64(v.to_f64().log10()).to_raw(),
            Some(_) if accepted => value,
            _ => 0,
        };
        ws.write(s, p, replaced)?;

        let planes = ws.read(d, p)?;
        let planes = if accepted { planes | bit } else { planes & !bit };
        ws.write(d, p, planes)?;

        tally.record(p, value == FP32_NAN || replaced == FP32_NAN || planes == FP32_NAN);
    }
    tally.finish()
}

/// `dst = (src & (1.0 << index)) >> index`: plane `index` as 1.0 or 0.
pub fn get_mask(ws: &mut Workspace, src: u32, rows: u16, cols: u16, index: u16, dst: u32) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;
    let bit = plane_bit(index)?;

    let mut tally = NumericTally::new("get_mask");
    for p in 0..s.len() {
        let planes = ws.read(s, p)?;
        ws.write(d, p, (planes & bit) >> index)?;
        tally.check(p, planes);
    }
    tally.finish()
}

/// `dst = 1.0` where `compare(src, thresh) == wanted`, else 0.
#[allow(clippy::too_many_arguments)]
fn threshold(
    ws: &mut Workspace,
    op: &'static str,
    src: u32,
    rows: u16,
    cols: u16,
    thresh: Fixed,
    wanted: Ordering,
    dst: u32,
) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;

    let mut tally = NumericTally::new(op);
    for p in 0..s.len() {
        let value = ws.read(s, p)?;
        let hit = compare(value, thresh.raw()) == wanted;
        ws.write(d, p, if hit { FP32_ONE } else { 0 })?;
        tally.check(p, value);
    }
    tally.finish()
}

pub fn over_thresh(ws: &mut Workspace, src: u32, rows: u16, cols: u16, thresh: Fixed, dst: u32) -> Result<()> {
    threshold(ws, "over_thresh", src, rows, cols, thresh, Ordering::Greater, dst)
}

pub fn under_thresh(ws: &mut Workspace, src: u32, rows: u16, cols: u16, thresh: Fixed, dst: u32) -> Result<()> {
    threshold(ws, "under_thresh", src, rows, cols, thresh, Ordering::Less, dst)
}

pub fn equal_thresh(ws: &mut Workspace, src: u32, rows: u16, cols: u16, thresh: Fixed, dst: u32) -> Result<()> {
    threshold(ws, "equal_thresh", src, rows, cols, thresh, Ordering::Equal, dst)
}
