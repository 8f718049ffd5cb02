//! Synthetic frame stacks with a known gain, for demos and tests.
//!
//! Frame `i` pointed at `(dx_i, dy_i)` sees the sky at
//! `(x - dx_i, y - dy_i)` through the detector gain `g(y, x)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flatfield_core::{NandFlash, Result, SlotRole};
use flatfield_math::FixedBuffer;

use crate::config::{CalibrationConfig, DisplacementOrder};

#[derive(Debug, Clone)]
pub struct SceneBuilder {
    rows: u16,
    cols: u16,
    offsets: Vec<(i32, i32)>,
    level: f64,
    gain: Vec<f64>,
    dead: Vec<usize>,
    noise: Option<(u64, f64)>,
}

/// A generated stack of raw detector frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticScene {
    pub rows: u16,
    pub cols: u16,
    /// Raw counts, one row-major image per pointing.
    pub frames: Vec<Vec<i32>>,
    /// 1 for live pixels, 0 for dead ones.
    pub detector_mask: Vec<i32>,
    /// Whole-pixel pointing `(dx, dy)` of each frame.
    pub displacements: Vec<(i32, i32)>,
    /// The gain the frames were generated with.
    pub gain: Vec<f64>,
}

impl SceneBuilder {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            rows,
            cols,
            offsets: vec![(0, 0), (1, 0)],
            level: 1000.0,
            gain: vec![1.0; rows as usize * cols as usize],
            dead: Vec::new(),
            noise: None,
        }
    }

    pub fn offsets(mut self, offsets: &[(i32, i32)]) -> Self {
        self.offsets = offsets.to_vec();
        self
    }

    /// Mean sky level in counts.
    pub fn level(mut self, counts: f64) -> Self {
        self.level = counts;
        self
    }

    pub fn gain_at(mut self, row: u16, col: u16, gain: f64) -> Self {
        if let Some(g) = self.gain.get_mut(row as usize * self.cols as usize + col as usize) {
            *g = gain;
        }
        self
    }

    pub fn dead_pixel(mut self, row: u16, col: u16) -> Self {
        self.dead.push(row as usize * self.cols as usize + col as usize);
        self
    }

    /// Uniform noise of `amplitude` counts from a seeded generator.
    pub fn noise(mut self, seed: u64, amplitude: f64) -> Self {
        self.noise = Some((seed, amplitude));
        self
    }

    fn sky(&self, u: f64, v: f64) -> f64 {
        self.level * (1.0 + 0.25 * (0.9 * u).sin() * (0.7 * v).cos())
    }

    pub fn build(&self) -> SyntheticScene {
        let cols = self.cols as usize;
        let mut rng = self.noise.map(|(seed, _)| StdRng::seed_from_u64(seed));

        let frames = self
            .offsets
            .iter()
            .map(|&(dx, dy)| {
                (0..self.gain.len())
                    .map(|p| {
                        let (y, x) = ((p / cols) as i32, (p % cols) as i32);
                        let mut counts = self.sky((x - dx) as f64, (y - dy) as f64) * self.gain[p];
                        if let (Some(rng), Some((_, amplitude))) = (rng.as_mut(), self.noise) {
                            counts += rng.gen_range(-amplitude..=amplitude);
                        }
                        counts.round().max(0.0) as i32
                    })
                    .collect()
            })
            .collect();

        let mut detector_mask = vec![1; self.gain.len()];
        for &p in &self.dead {
            if let Some(m) = detector_mask.get_mut(p) {
                *m = 0;
            }
        }

        SyntheticScene {
            rows: self.rows,
            cols: self.cols,
            frames,
            detector_mask,
            displacements: self.offsets.clone(),
            gain: self.gain.clone(),
        }
    }
}

impl SyntheticScene {
    /// Default configuration sized for this stack.
    pub fn config(&self) -> CalibrationConfig {
        CalibrationConfig {
            frames: self.frames.len(),
            rows: self.rows,
            cols: self.cols,
            ..CalibrationConfig::default()
        }
    }

    /// A bulk store holding the frames, detector mask and displacement table.
    pub fn store(&self, order: DisplacementOrder) -> Result<NandFlash> {
        let mut nand = NandFlash::new(self.frames.len(), self.rows, self.cols);
        for (i, frame) in self.frames.iter().enumerate() {
            nand.write_slot(SlotRole::Frame(i), &FixedBuffer::from_ints(frame))?;
        }
        nand.write_slot(SlotRole::DetectorMask, &FixedBuffer::from_ints(&self.detector_mask))?;

        let table: Vec<i32> = self
            .displacements
            .iter()
            .flat_map(|&(dx, dy)| match order {
                DisplacementOrder::DxDy => [dx, dy],
                DisplacementOrder::DyDx => [dy, dx],
            })
            .collect();
        nand.write_slot(SlotRole::Displacement, &FixedBuffer::from_ints(&table))?;
        Ok(nand)
    }
}
