//! Pairwise pixel offsets from the fixed-point displacement table.

use serde::{Deserialize, Serialize};

use flatfield_core::{PreprocessingError, Result, Workspace};
use flatfield_math::{subtract, FixedResult};

use crate::config::DisplacementOrder;

/// Two overlapping frames and the offset of `iq` relative to `ir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePair {
    /// The later frame of the pair.
    pub iq: u16,
    /// The earlier frame, `ir < iq`.
    pub ir: u16,
    /// Column offset in whole pixels.
    pub dx: i16,
    /// Row offset in whole pixels.
    pub dy: i16,
}

/// `(iq, ir)` for every unordered pair, `ir < iq`, in iq-major order.
pub fn frame_pairs(frames: usize) -> impl Iterator<Item = (u16, u16)> {
    let frames = frames as u16;
    (1..frames).flat_map(|iq| (0..iq).map(move |ir| (iq, ir)))
}

/// Whole-pixel difference of one table column, truncated toward zero.
/// `i16::MIN` has no negation and is rejected with the out-of-range values.
fn column_offset(table: &[i32], iq: u16, ir: u16, column: usize) -> Result<i16> {
    let word = |frame: u16| {
        let index = frame as usize * 2 + column;
        table
            .get(index)
            .map(|&w| (index, FixedResult::from_raw(w)))
            .ok_or(PreprocessingError::invalid_number("displacement"))
    };
    let (q_index, q) = word(iq)?;
    let (_, r) = word(ir)?;
    let invalid = PreprocessingError::InvalidNumber {
        op: "displacement",
        count: 1,
        first_index: Some(q_index),
    };
    let diff = q.zip_with(r, subtract).ok_or(invalid.clone())?;
    i16::try_from(diff.trunc_int())
        .ok()
        .filter(|&offset| offset != i16::MIN)
        .ok_or(invalid)
}

/// Offset of frame `iq` relative to frame `ir` from an `N x 2` table.
pub fn decode_offset(table: &[i32], iq: u16, ir: u16, order: DisplacementOrder) -> Result<(i16, i16)> {
    let (x_col, y_col) = match order {
        DisplacementOrder::DxDy => (0, 1),
        DisplacementOrder::DyDx => (1, 0),
    };
    Ok((
        column_offset(table, iq, ir, x_col)?,
        column_offset(table, iq, ir, y_col)?,
    ))
}

/// Decode every pair from the table registered at `address`.
pub fn decode_pairs(
    ws: &Workspace,
    address: u32,
    frames: usize,
    order: DisplacementOrder,
) -> Result<Vec<FramePair>> {
    let table = ws.words(ws.region(address, frames as u16, 2)?)?;
    frame_pairs(frames)
        .map(|(iq, ir)| {
            let (dx, dy) = decode_offset(table, iq, ir, order)?;
            Ok(FramePair { iq, ir, dx, dy })
        })
        .collect()
}

impl FramePair {
    pub fn offset(&self) -> (i16, i16) {
        (self.dx, self.dy)
    }

    /// The offset of `ir` relative to `iq`. Exact for decoded pairs, which
    /// never hold `i16::MIN`.
    pub fn inverse(&self) -> (i16, i16) {
        (self.dx.saturating_neg(), self.dy.saturating_neg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfield_math::{FP32_NAN, FP32_ONE};

    #[test]
    fn test_pairs_cover_every_unordered_pair() {
        let pairs: Vec<_> = frame_pairs(4).collect();
        assert_eq!(pairs, vec![(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)]);
        assert_eq!(frame_pairs(9).count(), 36);
        assert_eq!(frame_pairs(1).count(), 0);
    }

    #[test]
    fn test_offsets_truncate_toward_zero() {
        let one = FP32_ONE;
        // Frame 0 at (0, 0); frame 1 at (3.5, -2.75).
        let table = [0, 0, 3 * one + one / 2, -2 * one - 3 * one / 4];
        assert_eq!(decode_offset(&table, 1, 0, DisplacementOrder::DxDy).unwrap(), (3, -2));
        assert_eq!(decode_offset(&table, 1, 0, DisplacementOrder::DyDx).unwrap(), (-2, 3));
        assert_eq!(decode_offset(&table, 0, 1, DisplacementOrder::DxDy).unwrap(), (-3, 2));
    }

    #[test]
    fn test_poisoned_or_huge_offsets() {
        let table = [0, 0, FP32_NAN, 0];
        assert!(matches!(
            decode_offset(&table, 1, 0, DisplacementOrder::DxDy),
            Err(PreprocessingError::InvalidNumber { first_index: Some(2), .. })
        ));
        let table = [0, 0, 40_000 * FP32_ONE, 0];
        assert!(decode_offset(&table, 1, 0, DisplacementOrder::DxDy).is_err());
    }

    #[test]
    fn test_offset_without_negation_is_rejected() {
        let one = FP32_ONE;
        let table = [0, 0, 0, -32_768 * one];
        assert!(matches!(
            decode_offset(&table, 1, 0, DisplacementOrder::DxDy),
            Err(PreprocessingError::InvalidNumber { first_index: Some(3), .. })
        ));
        // The reversed pair gives +32768, which does not fit either.
        assert!(decode_offset(&table, 0, 1, DisplacementOrder::DxDy).is_err());

        let table = [0, 0, 0, -32_767 * one];
        let (dx, dy) = decode_offset(&table, 1, 0, DisplacementOrder::DxDy).unwrap();
        let pair = FramePair { iq: 1, ir: 0, dx, dy };
        assert_eq!(pair.inverse(), (0, 32_767));
    }

    #[test]
    fn test_decode_pairs_from_workspace() {
        let one = FP32_ONE;
        let mut ws = Workspace::new(6);
        ws.map(0, 6, 7).unwrap();
        let table = ws.region(0, 3, 2).unwrap();
        ws.words_mut(table).unwrap().copy_from_slice(&[0, 0, one, 0, one, 2 * one]);

        let pairs = decode_pairs(&ws, 0, 3, DisplacementOrder::DxDy).unwrap();
        assert_eq!(
            pairs,
            vec![
                FramePair { iq: 1, ir: 0, dx: 1, dy: 0 },
                FramePair { iq: 2, ir: 0, dx: 1, dy: 2 },
                FramePair { iq: 2, ir: 1, dx: 0, dy: 2 },
            ]
        );
        assert_eq!(pairs[1].inverse(), (-1, -2));
    }
}
