//! Masking and linearization of the frame stack.

use log::debug;

use flatfield_core::{BulkStore, Result, SlotRole, Workspace};
use flatfield_math::Fixed;
use flatfield_ops::{load_image, mask_images_log10, multiply_images, over_thresh, store_image, zero};

use crate::layout::MemoryLayout;

/// Mask every frame against the detector mask and the intensity window
/// `(i_min, i_max]`, replacing accepted samples by their log10 in the store.
///
/// Plane `i` of the combined mask records which pixels of frame `i` were
/// accepted; the combined mask is written to [`SlotRole::CombinedMask`].
#[allow(clippy::too_many_arguments)]
pub fn mask_frames<S: BulkStore + ?Sized>(
    ws: &mut Workspace,
    store: &mut S,
    layout: &MemoryLayout,
    frames: usize,
    rows: u16,
    cols: u16,
    i_min: Fixed,
    i_max: Fixed,
) -> Result<()> {
    let (frame, detector, planes) = (layout.tmp1, layout.tmp2, layout.tmp3);

    zero(ws, planes, rows, cols)?;
    load_image(store, SlotRole::DetectorMask, ws, rows, cols, detector)?;
    over_thresh(ws, detector, rows, cols, Fixed::ZERO, detector)?;

    for i in 0..frames {
        load_image(store, SlotRole::Frame(i), ws, rows, cols, frame)?;
        multiply_images(ws, frame, detector, rows, cols, frame)?;
        mask_images_log10(ws, frame, rows, cols, i as u16, i_min, i_max, planes)?;
        store_image(ws, frame, rows, cols, store, SlotRole::Frame(i))?;
        debug!("masking: frame {i} linearized");
    }

    store_image(ws, planes, rows, cols, store, SlotRole::CombinedMask)
}
