use serde::{Deserialize, Serialize};

use flatfield_math::{Fixed, FixedBuffer};

use crate::displacement::FramePair;
use crate::refine::IterationStats;

/// Final per-pixel flatfield map, row-major Q24.8 words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainMap {
    pub rows: u16,
    pub cols: u16,
    pub data: FixedBuffer,
}

impl GainMap {
    pub fn new(rows: u16, cols: u16, data: FixedBuffer) -> Self {
        Self { rows, cols, data }
    }

    /// Gain at `(row, col)`; `None` outside the map or for a sentinel word.
    pub fn get(&self, row: u16, col: u16) -> Option<Fixed> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let index = row as usize * self.cols as usize + col as usize;
        self.data.data.get(index).copied().and_then(Fixed::from_raw)
    }

    /// Pixels no frame contributed to.
    pub fn uncovered(&self) -> usize {
        self.data.data.iter().filter(|&&w| w == 0).count()
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.data.to_f64()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Everything a run produces besides the side effects on the bulk store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub pairs: Vec<FramePair>,
    pub iterations: Vec<IterationStats>,
    pub gain: GainMap,
}

impl CalibrationReport {
    pub fn last_iteration(&self) -> Option<&IterationStats> {
        self.iterations.last()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfield_math::{FP32_NAN, FP32_ONE};

    #[test]
    fn test_lookup_and_persistence() {
        let map = GainMap::new(2, 2, FixedBuffer { data: vec![FP32_ONE, 0, FP32_NAN, 300] });
        assert_eq!(map.get(0, 0), Some(Fixed::ONE));
        assert_eq!(map.get(1, 0), None);
        assert_eq!(map.get(2, 0), None);
        assert_eq!(map.get(1, 1).map(Fixed::raw), Some(300));
        assert_eq!(map.uncovered(), 1);

        let bytes = map.to_bytes().unwrap();
        assert_eq!(GainMap::from_bytes(&bytes).unwrap(), map);
        assert!(GainMap::from_bytes(&bytes[..3]).is_err());
    }
}
