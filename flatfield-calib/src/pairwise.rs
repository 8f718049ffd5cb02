//! Pairwise accumulation of log-differences and overlap counts.

use log::debug;

use flatfield_core::{BulkStore, Result, SlotRole, Workspace};
use flatfield_ops::{
    add_roi, get_mask, load_image, multiply_images, shift_image, store_image, subtract_images,
    subtract_roi, zero,
};

use crate::displacement::FramePair;
use crate::layout::MemoryLayout;

/// Overlap mask of a pair, written to `overlap`; `scratch` is clobbered.
///
/// Plane `iq` is shifted by `-(dx, dy)` and plane `ir` by `+(dx, dy)` so that
/// both land on the common window at the origin; their product is 1.0 where
/// both frames hold a valid sample.
pub fn overlap_mask<S: BulkStore + ?Sized>(
    ws: &mut Workspace,
    store: &S,
    pair: &FramePair,
    rows: u16,
    cols: u16,
    scratch: u32,
    overlap: u32,
) -> Result<()> {
    let (dx, dy) = pair.offset();
    let (ndx, ndy) = pair.inverse();

    load_image(store, SlotRole::CombinedMask, ws, rows, cols, scratch)?;
    get_mask(ws, scratch, rows, cols, pair.ir, overlap)?;
    get_mask(ws, scratch, rows, cols, pair.iq, scratch)?;

    shift_image(ws, scratch, rows, cols, ndx, ndy)?;
    shift_image(ws, overlap, rows, cols, dx, dy)?;
    multiply_images(ws, scratch, overlap, rows, cols, overlap)
}

/// Build the constant and pixel-count accumulators over every pair and
/// persist them to [`SlotRole::Constant`] and [`SlotRole::PixelCount`].
///
/// For each pair the masked log-difference `iq - ir` over the common window
/// is added at `iq`'s position and subtracted at `ir`'s; the overlap mask is
/// counted at both.
pub fn accumulate_pairs<S: BulkStore + ?Sized>(
    ws: &mut Workspace,
    store: &mut S,
    layout: &MemoryLayout,
    pairs: &[FramePair],
    rows: u16,
    cols: u16,
) -> Result<()> {
    let (q, r, overlap) = (layout.tmp1, layout.tmp2, layout.tmp3);
    let (constant, count) = (layout.constant, layout.pixel_count);

    zero(ws, constant, rows, cols)?;
    zero(ws, count, rows, cols)?;

    for pair in pairs {
        let (dx, dy) = pair.offset();
        let (ndx, ndy) = pair.inverse();
        debug!("accumulate: pair ({}, {}) offset ({dx}, {dy})", pair.iq, pair.ir);

        overlap_mask(ws, store, pair, rows, cols, q, overlap)?;

        load_image(store, SlotRole::Frame(pair.iq as usize), ws, rows, cols, q)?;
        load_image(store, SlotRole::Frame(pair.ir as usize), ws, rows, cols, r)?;
        shift_image(ws, q, rows, cols, ndx, ndy)?;
        shift_image(ws, r, rows, cols, dx, dy)?;

        subtract_images(ws, q, r, rows, cols, q)?;
        multiply_images(ws, q, overlap, rows, cols, q)?;

        add_roi(ws, constant, q, rows, cols, ndx, ndy, constant)?;
        subtract_roi(ws, constant, q, rows, cols, dx, dy, constant)?;

        add_roi(ws, count, overlap, rows, cols, ndx, ndy, count)?;
        add_roi(ws, count, overlap, rows, cols, dx, dy, count)?;
    }

    store_image(ws, constant, rows, cols, store, SlotRole::Constant)?;
    store_image(ws, count, rows, cols, store, SlotRole::PixelCount)
}
