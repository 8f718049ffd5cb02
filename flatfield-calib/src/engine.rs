use std::fmt;

use log::info;
use thiserror::Error;

use flatfield_core::{BulkStore, PreprocessingError, SlotRole, Workspace};
use flatfield_math::FixedBuffer;
use flatfield_ops::load_image;

use crate::config::{CalibrationConfig, ConfigError};
use crate::displacement::decode_pairs;
use crate::gain_map::{CalibrationReport, GainMap};
use crate::layout::MemoryLayout;
use crate::masking::mask_frames;
use crate::pairwise::accumulate_pairs;
use crate::refine::{finalize, refine_gain};

/// Stage of a run, reported with any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Layout,
    Masking,
    Displacement,
    Accumulation,
    Refinement,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Layout => "memory layout",
            Phase::Masking => "masking",
            Phase::Displacement => "displacement decoding",
            Phase::Accumulation => "pairwise accumulation",
            Phase::Refinement => "gain refinement",
            Phase::Finalize => "flatfield",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{phase} failed: {source}")]
    Preprocessing {
        phase: Phase,
        source: PreprocessingError,
    },
}

impl CalibrationError {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            CalibrationError::Config(_) => None,
            CalibrationError::Preprocessing { phase, .. } => Some(*phase),
        }
    }
}

trait InPhase<T> {
    fn in_phase(self, phase: Phase) -> Result<T, CalibrationError>;
}

impl<T> InPhase<T> for flatfield_core::Result<T> {
    fn in_phase(self, phase: Phase) -> Result<T, CalibrationError> {
        self.map_err(|source| CalibrationError::Preprocessing { phase, source })
    }
}

/// A configured calibration run.
///
/// The bulk store must hold the raw frames (in Q24.8), the detector mask
/// and the displacement table. Frames are replaced by their masked log10
/// values, and the combined mask, both accumulators and the final map are
/// written back to their slots.
#[derive(Debug, Clone)]
pub struct Calibration {
    config: CalibrationConfig,
    layout: MemoryLayout,
}

impl Calibration {
    pub fn new(config: CalibrationConfig) -> Result<Self, CalibrationError> {
        config.validate()?;
        let layout = MemoryLayout::new(&config)?;
        Ok(Self { config, layout })
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Working memory sized and registered for this run.
    pub fn workspace(&self) -> Result<Workspace, CalibrationError> {
        self.layout.workspace().in_phase(Phase::Layout)
    }

    pub fn run<S: BulkStore + ?Sized>(
        &self,
        ws: &mut Workspace,
        store: &mut S,
    ) -> Result<CalibrationReport, CalibrationError> {
        let CalibrationConfig {
            frames,
            rows,
            cols,
            iterations,
            displacement_order,
            ..
        } = self.config;
        let layout = &self.layout;

        self.layout.register(ws).in_phase(Phase::Layout)?;

        info!("masking {frames} frames of {rows}x{cols}");
        let (i_min, i_max) = (self.config.i_min()?, self.config.i_max()?);
        mask_frames(ws, store, layout, frames, rows, cols, i_min, i_max).in_phase(Phase::Masking)?;

        load_image(store, SlotRole::Displacement, ws, frames as u16, 2, layout.displacement)
            .in_phase(Phase::Displacement)?;
        let pairs = decode_pairs(ws, layout.displacement, frames, displacement_order)
            .in_phase(Phase::Displacement)?;

        info!("accumulating {} frame pairs", pairs.len());
        accumulate_pairs(ws, store, layout, &pairs, rows, cols).in_phase(Phase::Accumulation)?;

        info!("refining gain over {iterations} iterations");
        let stats = refine_gain(ws, store, layout, &pairs, rows, cols, iterations)
            .in_phase(Phase::Refinement)?;

        let map = finalize(ws, store, layout, rows, cols).in_phase(Phase::Finalize)?;
        let region = ws.region(map, rows, cols).in_phase(Phase::Finalize)?;
        let data = ws.words(region).in_phase(Phase::Finalize)?.to_vec();
        let gain = GainMap::new(rows, cols, FixedBuffer { data });
        info!("flatfield complete, {} uncovered pixels", gain.uncovered());

        Ok(CalibrationReport {
            pairs,
            iterations: stats,
            gain,
        })
    }
}
