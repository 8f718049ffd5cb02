//! Iterative relaxation of the gain estimate and the final flatfield map.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use flatfield_core::{BulkStore, Result, SlotRole, Workspace};
use flatfield_math::Fixed;
use flatfield_ops::{
    add_roi, create_roi, fivesigma, flatfield, load_image, mean, multiply_images, normalize,
    store_image, subtract_scalar, zero,
};

use crate::displacement::FramePair;
use crate::layout::MemoryLayout;
use crate::pairwise::overlap_mask;

/// Statistics of one refinement round, taken after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationStats {
    pub iteration: u16,
    pub mean: Fixed,
    pub five_sigma: Fixed,
    /// Pixels covered by at least one overlap.
    pub pixels: i32,
    /// Pixels rejected by five-sigma clipping.
    pub outliers: i32,
    /// Value subtracted from the estimate to recenter it.
    pub trimmed_average: Fixed,
}

/// One Jacobi step: `T = constant + sum over pairs of the overlap-weighted
/// gain of the partner frame`, normalized by the overlap count and
/// recentered on its trimmed average. The result replaces the estimate.
fn relax<S: BulkStore + ?Sized>(
    ws: &mut Workspace,
    store: &S,
    layout: &MemoryLayout,
    pairs: &[FramePair],
    rows: u16,
    cols: u16,
    iteration: u16,
) -> Result<IterationStats> {
    let (total, partner, overlap) = (layout.tmp1, layout.tmp2, layout.tmp3);
    let gain = layout.gain;

    load_image(store, SlotRole::Constant, ws, rows, cols, total)?;

    for pair in pairs {
        let (dx, dy) = pair.offset();
        let (ndx, ndy) = pair.inverse();
        overlap_mask(ws, store, pair, rows, cols, partner, overlap)?;

        // iq's estimate, carried to ir's pixels.
        zero(ws, partner, rows, cols)?;
        create_roi(ws, gain, rows, cols, ndx, ndy, partner)?;
        multiply_images(ws, partner, overlap, rows, cols, partner)?;
        add_roi(ws, total, partner, rows, cols, dx, dy, total)?;

        // ir's estimate, carried to iq's pixels.
        zero(ws, partner, rows, cols)?;
        create_roi(ws, gain, rows, cols, dx, dy, partner)?;
        multiply_images(ws, partner, overlap, rows, cols, partner)?;
        add_roi(ws, total, partner, rows, cols, ndx, ndy, total)?;
    }

    let count = partner;
    load_image(store, SlotRole::PixelCount, ws, rows, cols, count)?;
    normalize(ws, total, count, rows, cols, total)?;

    let stats = mean(ws, total, count, rows, cols)?;
    let outliers = fivesigma(ws, total, count, rows, cols, stats.mean, stats.five_sigma)?;
    let average = stats.trimmed_average(&outliers)?;
    subtract_scalar(ws, total, rows, cols, average, gain)?;

    Ok(IterationStats {
        iteration,
        mean: stats.mean,
        five_sigma: stats.five_sigma,
        pixels: stats.count.trunc_int(),
        outliers: outliers.count.trunc_int(),
        trimmed_average: average,
    })
}

/// Run `iterations` relaxation rounds starting from a zero estimate.
pub fn refine_gain<S: BulkStore + ?Sized>(
    ws: &mut Workspace,
    store: &S,
    layout: &MemoryLayout,
    pairs: &[FramePair],
    rows: u16,
    cols: u16,
    iterations: u16,
) -> Result<Vec<IterationStats>> {
    zero(ws, layout.gain, rows, cols)?;
    (1..=iterations)
        .map(|i| {
            let stats = relax(ws, store, layout, pairs, rows, cols, i)?;
            info!(
                "iteration {i}/{iterations}: mean {} five-sigma {} pixels {} outliers {} recentered by {}",
                stats.mean, stats.five_sigma, stats.pixels, stats.outliers, stats.trimmed_average
            );
            Ok(stats)
        })
        .collect()
}

/// `10^estimate` wherever any frame contributed a sample, zero elsewhere.
/// The map is left in `tmp2` and written to [`SlotRole::Gain`].
pub fn finalize<S: BulkStore + ?Sized>(
    ws: &mut Workspace,
    store: &mut S,
    layout: &MemoryLayout,
    rows: u16,
    cols: u16,
) -> Result<u32> {
    let (planes, map) = (layout.tmp1, layout.tmp2);
    load_image(store, SlotRole::CombinedMask, ws, rows, cols, planes)?;
    zero(ws, map, rows, cols)?;
    flatfield(ws, layout.gain, planes, rows, cols, map)?;
    store_image(ws, map, rows, cols, store, SlotRole::Gain)?;
    debug!("finalize: flatfield map written to the gain slot");
    Ok(map)
}
