//! # flatfield-calib
//!
//! Derives a per-pixel flatfield map from N overlapping frames of the same
//! scene, using only Q24.8 arithmetic and a fixed set of working buffers.
//!
//! ## Phases
//! 1. **Masking** ([`masking`]): each frame is masked by the detector mask and
//!    the intensity window, linearized to log10 and tagged in plane `i` of the
//!    combined mask.
//! 2. **Accumulation** ([`pairwise`]): for every pair `ir < iq` the
//!    masked log-difference over the common window is accumulated, together
//!    with the overlap count.
//! 3. **Refinement** ([`refine`]): Jacobi relaxation of the log gain,
//!    recentered each round on a five-sigma trimmed average, then inverted
//!    with `10^x` under the combined mask.
//!
//! ## Example
//! ```
//! use flatfield_calib::{Calibration, DisplacementOrder, SceneBuilder};
//!
//! let scene = SceneBuilder::new(6, 6).offsets(&[(0, 0), (1, 0), (0, 1)]).build();
//! let mut store = scene.store(DisplacementOrder::DxDy).unwrap();
//!
//! let calibration = Calibration::new(scene.config()).unwrap();
//! let mut ws = calibration.workspace().unwrap();
//! let report = calibration.run(&mut ws, &mut store).unwrap();
//! assert_eq!(report.pairs.len(), 3);
//! ```

pub mod config;
pub mod displacement;
pub mod engine;
pub mod gain_map;
pub mod layout;
pub mod masking;
pub mod pairwise;
pub mod refine;
pub mod synthetic;

pub use config::{CalibrationConfig, ConfigError, DisplacementOrder};
pub use displacement::{decode_offset, decode_pairs, frame_pairs, FramePair};
pub use engine::{Calibration, CalibrationError, Phase};
pub use gain_map::{CalibrationReport, GainMap};
pub use layout::MemoryLayout;
pub use masking::mask_frames;
pub use pairwise::{accumulate_pairs, overlap_mask};
pub use refine::{finalize, refine_gain, IterationStats};
pub use synthetic::{SceneBuilder, SyntheticScene};
