use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flatfield_math::{Fixed, FP32_FWL, FP32_MAX};
use flatfield_ops::MAX_MASK_PLANES;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least two frames are needed, got {0}")]
    TooFewFrames(usize),
    #[error("{0} frames exceed the available mask planes")]
    TooManyFrames(usize),
    #[error("Frame dimensions must be nonzero, got {rows}x{cols}")]
    EmptyFrame { rows: u16, cols: u16 },
    #[error("Working memory for {rows}x{cols} frames does not fit the 32-bit address space")]
    FrameTooLarge { rows: u16, cols: u16 },
    #[error("{rows}x{cols} pixels cannot be counted in Q24.8")]
    TooManyPixels { rows: u16, cols: u16 },
    #[error("Intensity window ({min}, {max}] is invalid")]
    IntensityWindow { min: i32, max: i32 },
    #[error("Iteration count must be positive")]
    NoIterations,
    #[error("Unsupported fraction width {0}, expected 8")]
    FractionBits(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column order of the displacement table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplacementOrder {
    /// Column offset first.
    #[default]
    DxDy,
    /// Row offset first.
    DyDx,
}

/// Runtime parameters of a calibration run.
///
/// Intensities are raw detector counts; they are shifted into Q24.8 when the
/// frames are masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of overlapping frames (N).
    pub frames: usize,
    pub rows: u16,
    pub cols: u16,
    /// Exclusive lower bound of accepted counts.
    pub intensity_min: i32,
    /// Inclusive upper bound of accepted counts.
    pub intensity_max: i32,
    /// Relaxation rounds in the refinement phase.
    pub iterations: u16,
    pub fraction_bits: u32,
    pub displacement_order: DisplacementOrder,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            frames: 9,
            rows: 2048,
            cols: 2048,
            intensity_min: 0,
            intensity_max: 82_000,
            iterations: 10,
            fraction_bits: FP32_FWL,
            displacement_order: DisplacementOrder::DxDy,
        }
    }
}

/// Largest count that still fits Q24.8.
const MAX_COUNTS: i32 = FP32_MAX >> FP32_FWL;

/// Buffers the calibration keeps resident, besides the displacement table.
pub(crate) const RESIDENT_IMAGES: u32 = 6;

impl CalibrationConfig {
    pub fn pixels(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames < 2 {
            return Err(ConfigError::TooFewFrames(self.frames));
        }
        if self.frames > MAX_MASK_PLANES as usize {
            return Err(ConfigError::TooManyFrames(self.frames));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyFrame {
                rows: self.rows,
                cols: self.cols,
            });
        }
        // Pixel totals in the statistics are Q24.8 counts.
        if self.pixels() > MAX_COUNTS as usize {
            return Err(ConfigError::TooManyPixels {
                rows: self.rows,
                cols: self.cols,
            });
        }
        // A negative lower bound would accept pixels zeroed by the detector mask.
        if self.intensity_min < 0
            || self.intensity_min >= self.intensity_max
            || self.intensity_max > MAX_COUNTS
        {
            return Err(ConfigError::IntensityWindow {
                min: self.intensity_min,
                max: self.intensity_max,
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.fraction_bits != FP32_FWL {
            return Err(ConfigError::FractionBits(self.fraction_bits));
        }
        Ok(())
    }

    /// Lower window bound in Q24.8.
    pub fn i_min(&self) -> Result<Fixed, ConfigError> {
        self.counts(self.intensity_min)
    }

    /// Upper window bound in Q24.8.
    pub fn i_max(&self) -> Result<Fixed, ConfigError> {
        self.counts(self.intensity_max)
    }

    fn counts(&self, value: i32) -> Result<Fixed, ConfigError> {
        Fixed::from_int(value).ok_or(ConfigError::IntensityWindow {
            min: self.intensity_min,
            max: self.intensity_max,
        })
    }

    /// Read and validate a JSON configuration. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
