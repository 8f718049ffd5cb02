use flatfield_math::FixedBuffer;
use serde::{Deserialize, Serialize};

use crate::status::{PreprocessingError, Result};

/// What a bulk-store slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotRole {
    Frame(usize),
    DetectorMask,
    CombinedMask,
    Constant,
    Gain,
    PixelCount,
    Displacement,
}

/// Bulk storage the working set is shuffled to and from.
///
/// Implementations hand out whole slots; callers copy the prefix they need
/// into a registered working buffer.
pub trait BulkStore {
    /// Read-only view of the slot for `role`.
    fn slot(&self, role: SlotRole) -> Result<&[i32]>;

    /// Mutable view of the slot for `role`.
    fn slot_mut(&mut self, role: SlotRole) -> Result<&mut [i32]>;
}

/// In-memory NAND image: `frames` frame slots followed by one slot per
/// auxiliary role, all of the same size.
#[derive(Debug, Clone)]
pub struct NandFlash {
    frames: usize,
    slot_words: usize,
    words: Vec<i32>,
}

const AUXILIARY_SLOTS: usize = 6;

impl NandFlash {
    /// Slots are large enough for a `rows x cols` image and for an
    /// `frames x 2` displacement table.
    pub fn new(frames: usize, rows: u16, cols: u16) -> Self {
        let slot_words = (rows as usize * cols as usize).max(frames * 2);
        Self {
            frames,
            slot_words,
            words: vec![0; slot_words * (frames + AUXILIARY_SLOTS)],
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn slot_words(&self) -> usize {
        self.slot_words
    }

    fn slot_index(&self, role: SlotRole) -> Option<usize> {
        let n = self.frames;
        match role {
            SlotRole::Frame(i) if i < n => Some(i),
            SlotRole::Frame(_) => None,
            SlotRole::DetectorMask => Some(n),
            SlotRole::CombinedMask => Some(n + 1),
            SlotRole::Constant => Some(n + 2),
            SlotRole::Gain => Some(n + 3),
            SlotRole::PixelCount => Some(n + 4),
            SlotRole::Displacement => Some(n + 5),
        }
    }

    fn span(&self, role: SlotRole) -> Result<std::ops::Range<usize>> {
        let index = self
            .slot_index(role)
            .ok_or(PreprocessingError::InvalidSlot(role))?;
        let start = index * self.slot_words;
        Ok(start..start + self.slot_words)
    }

    /// Copy `buffer` into the start of a slot.
    pub fn write_slot(&mut self, role: SlotRole, buffer: &FixedBuffer) -> Result<()> {
        let slot = self.slot_mut(role)?;
        let capacity = slot.len();
        let dst = slot
            .get_mut(..buffer.len())
            .ok_or(PreprocessingError::SlotOverflow {
                role,
                words: buffer.len(),
                capacity,
            })?;
        dst.copy_from_slice(&buffer.data);
        Ok(())
    }

    /// First `len` words of a slot.
    pub fn read_slot(&self, role: SlotRole, len: usize) -> Result<FixedBuffer> {
        let slot = self.slot(role)?;
        let data = slot
            .get(..len)
            .ok_or(PreprocessingError::SlotOverflow {
                role,
                words: len,
                capacity: slot.len(),
            })?
            .to_vec();
        Ok(FixedBuffer { data })
    }
}

impl BulkStore for NandFlash {
    fn slot(&self, role: SlotRole) -> Result<&[i32]> {
        let span = self.span(role)?;
        Ok(&self.words[span])
    }

    fn slot_mut(&mut self, role: SlotRole) -> Result<&mut [i32]> {
        let span = self.span(role)?;
        Ok(&mut self.words[span])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_disjoint() {
        let mut nand = NandFlash::new(3, 2, 2);
        assert_eq!(nand.slot_words(), 6);
        nand.write_slot(SlotRole::Frame(2), &FixedBuffer { data: vec![1, 2, 3, 4] }).unwrap();
        nand.write_slot(SlotRole::DetectorMask, &FixedBuffer { data: vec![9; 6] }).unwrap();

        assert_eq!(nand.read_slot(SlotRole::Frame(2), 4).unwrap().data, vec![1, 2, 3, 4]);
        assert_eq!(nand.slot(SlotRole::Frame(1)).unwrap(), &[0; 6]);
        assert_eq!(nand.slot(SlotRole::DetectorMask).unwrap(), &[9; 6]);
    }

    #[test]
    fn test_unknown_frame_and_oversize() {
        let mut nand = NandFlash::new(2, 2, 2);
        assert_eq!(
            nand.slot(SlotRole::Frame(2)).unwrap_err(),
            PreprocessingError::InvalidSlot(SlotRole::Frame(2))
        );
        let overflow = PreprocessingError::SlotOverflow {
            role: SlotRole::Gain,
            words: 5,
            capacity: 4,
        };
        assert_eq!(nand.write_slot(SlotRole::Gain, &FixedBuffer::new(5)).unwrap_err(), overflow);
        assert_eq!(nand.read_slot(SlotRole::Gain, 5).unwrap_err(), overflow);
        assert_eq!(
            overflow.to_string(),
            "5 words do not fit the 4-word slot for Gain"
        );
    }
}
