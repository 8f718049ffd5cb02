use std::fmt;
use thiserror::Error;

use crate::store::SlotRole;

/// Why an address was refused or an access fell outside its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFault {
    NullData,
    Unaligned { byte_offset: usize },
    Unregistered,
    /// Range collides with the entry registered at `existing`.
    Overlap { existing: u32, existing_size: u32 },
    /// Same address re-registered with a different size.
    SizeConflict { registered: u32, requested: u32 },
    OutOfBounds { index: usize },
}

impl fmt::Display for AddressFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFault::NullData => write!(f, "no data reference"),
            AddressFault::Unaligned { byte_offset } => {
                write!(f, "data at byte offset {byte_offset} is not word aligned")
            }
            AddressFault::Unregistered => write!(f, "address is not registered"),
            AddressFault::Overlap { existing, existing_size } => write!(
                f,
                "overlaps entry {existing:#010x} of {existing_size} words"
            ),
            AddressFault::SizeConflict { registered, requested } => write!(
                f,
                "already registered with {registered} words, requested {requested}"
            ),
            AddressFault::OutOfBounds { index } => write!(f, "index {index} outside the region"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessingError {
    #[error("Invalid address {address:#010x}: {fault}")]
    InvalidAddress { address: u32, fault: AddressFault },

    #[error("Invalid size at {address:#010x}: {rows}x{cols} exceeds {registered} registered words")]
    InvalidSize {
        address: u32,
        rows: u16,
        cols: u16,
        registered: u32,
    },

    #[error("Invalid number in {op}: {count} sample(s) overflowed{}", first_at(.first_index))]
    InvalidNumber {
        op: &'static str,
        count: usize,
        first_index: Option<usize>,
    },

    #[error("Out of memory: no free entry for address {address:#010x}")]
    OutOfMemory { address: u32 },

    #[error("Bulk store has no slot for {0:?}")]
    InvalidSlot(SlotRole),

    #[error("{words} words do not fit the {capacity}-word slot for {role:?}")]
    SlotOverflow {
        role: SlotRole,
        words: usize,
        capacity: usize,
    },

    #[error("Mask plane {index} does not fit above the fractional bits")]
    InvalidMaskPlane { index: u16 },
}

impl PreprocessingError {
    pub fn invalid_number(op: &'static str) -> Self {
        PreprocessingError::InvalidNumber {
            op,
            count: 1,
            first_index: None,
        }
    }

    pub fn invalid_address(address: u32, fault: AddressFault) -> Self {
        PreprocessingError::InvalidAddress { address, fault }
    }
}

fn first_at(index: &Option<usize>) -> String {
    index.map(|i| format!(", first at index {i}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, PreprocessingError>;
