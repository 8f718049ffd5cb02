use log::info;

use flatfield_core::{NandFlash, SlotRole};
use flatfield_math::FixedBuffer;

use crate::displacement::DisplacementTable;
use crate::fits::FitsImage;
use crate::IoError;

/// Build a bulk store from raw frames, a detector mask and the displacement
/// table. Samples are shifted into Q24.8; ones that do not fit become the
/// sentinel and are reported when the calibration loads them.
pub fn populate_store(
    frames: &[FitsImage],
    detector_mask: &FitsImage,
    table: &DisplacementTable,
) -> Result<NandFlash, IoError> {
    let (rows, cols) = (detector_mask.rows, detector_mask.cols);
    for (index, frame) in frames.iter().enumerate() {
        if (frame.rows, frame.cols) != (rows, cols) {
            return Err(IoError::Shape {
                what: format!("frame {index}"),
                rows: frame.rows,
                cols: frame.cols,
                expected_rows: rows,
                expected_cols: cols,
            });
        }
    }
    if table.len() != frames.len() {
        return Err(IoError::TableLength {
            rows: table.len(),
            frames: frames.len(),
        });
    }

    let mut nand = NandFlash::new(frames.len(), rows, cols);
    for (index, frame) in frames.iter().enumerate() {
        nand.write_slot(SlotRole::Frame(index), &FixedBuffer::from_ints(&frame.samples))?;
    }
    nand.write_slot(SlotRole::DetectorMask, &FixedBuffer::from_ints(&detector_mask.samples))?;
    nand.write_slot(SlotRole::Displacement, &table.to_fixed())?;
    info!("bulk store: {} frames of {rows}x{cols}", frames.len());
    Ok(nand)
}
