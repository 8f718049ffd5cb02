//! # flatfield-core
//!
//! Memory model for the calibration pipeline.
//!
//! - [`AddressSpace`]: a registry of at most 16 entries mapping logical
//!   addresses to regions of working memory, validating every request
//! - [`Workspace`]: the registry together with the [`Sdram`] words it
//!   describes; the only way ImageOps read or write pixels
//! - [`BulkStore`]: the slot-oriented store frames and accumulators are
//!   shuffled through, with [`NandFlash`] as the in-memory implementation
//! - [`PreprocessingError`]: the status taxonomy shared by every operation

pub mod sdram;
pub mod status;
pub mod store;
pub mod vmem;

pub use sdram::{Region, Sdram, Workspace};
pub use status::{AddressFault, PreprocessingError, Result};
pub use store::{BulkStore, NandFlash, SlotRole};
pub use vmem::{AddressSpace, DataRef, MemoryEntry, VMEM_MAX_ENTRIES, WORD_BYTES};
