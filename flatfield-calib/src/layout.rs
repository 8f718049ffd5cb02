//! Static partition of working memory.
//!
//! Six image buffers and the displacement table are laid out back to back;
//! each logical address equals the word offset of its data.

use std::fmt;

use log::debug;

use flatfield_core::Workspace;

use crate::config::{CalibrationConfig, ConfigError, RESIDENT_IMAGES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    pub tmp1: u32,
    pub tmp2: u32,
    pub tmp3: u32,
    /// Pairwise log-difference accumulator.
    pub constant: u32,
    /// Overlap-count accumulator.
    pub pixel_count: u32,
    /// Working gain estimate, in log10 units.
    pub gain: u32,
    pub displacement: u32,
    image_words: u32,
    table_words: u32,
}

impl MemoryLayout {
    /// Offsets for `config`. Every address and the table end must fit the
    /// 32-bit address space.
    pub fn new(config: &CalibrationConfig) -> Result<Self, ConfigError> {
        let too_large = || ConfigError::FrameTooLarge {
            rows: config.rows,
            cols: config.cols,
        };
        let image_words = u32::try_from(config.pixels()).map_err(|_| too_large())?;
        let at = |slot: u32| slot.checked_mul(image_words).ok_or_else(too_large);
        let table_words = u32::try_from(config.frames)
            .ok()
            .and_then(|n| n.checked_mul(2))
            .ok_or_else(too_large)?;
        let displacement = at(RESIDENT_IMAGES)?;
        displacement.checked_add(table_words).ok_or_else(too_large)?;
        Ok(Self {
            tmp1: at(0)?,
            tmp2: at(1)?,
            tmp3: at(2)?,
            constant: at(3)?,
            pixel_count: at(4)?,
            gain: at(5)?,
            displacement,
            image_words,
            table_words,
        })
    }

    pub fn image_words(&self) -> u32 {
        self.image_words
    }

    /// Working memory needed to back every buffer.
    pub fn sdram_words(&self) -> usize {
        self.displacement as usize + self.table_words as usize
    }

    fn entries(&self) -> [(&'static str, u32, u32); 7] {
        [
            ("tmp1", self.tmp1, self.image_words),
            ("tmp2", self.tmp2, self.image_words),
            ("tmp3", self.tmp3, self.image_words),
            ("constant", self.constant, self.image_words),
            ("pixel_count", self.pixel_count, self.image_words),
            ("gain", self.gain, self.image_words),
            ("displacement", self.displacement, self.table_words),
        ]
    }

    /// Register every buffer. Re-registering an identical layout is a no-op.
    pub fn register(&self, ws: &mut Workspace) -> flatfield_core::Result<()> {
        for (id, (name, address, size)) in self.entries().into_iter().enumerate() {
            let slot = ws.map(address, size, id as u32 + 1)?;
            debug!("layout: {name} at {address:#010x} ({size} words) in slot {slot}");
        }
        Ok(())
    }

    /// A fresh workspace with the layout registered.
    pub fn workspace(&self) -> flatfield_core::Result<Workspace> {
        let mut ws = Workspace::new(self.sdram_words());
        self.register(&mut ws)?;
        Ok(ws)
    }
}

impl fmt::Display for MemoryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, address, size) in self.entries() {
            writeln!(f, "{name:<12} {address:#010x} {size:>10}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfield_core::{AddressFault, PreprocessingError};

    fn config() -> CalibrationConfig {
        CalibrationConfig {
            frames: 3,
            rows: 4,
            cols: 5,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn test_buffers_are_contiguous() {
        let layout = MemoryLayout::new(&config()).unwrap();
        assert_eq!(layout.gain, 100);
        assert_eq!(layout.displacement, 120);
        assert_eq!(layout.sdram_words(), 126);
    }

    #[test]
    fn test_register_is_idempotent() {
        let layout = MemoryLayout::new(&config()).unwrap();
        let mut ws = layout.workspace().unwrap();
        assert_eq!(ws.vmem().len(), 7);
        layout.register(&mut ws).unwrap();
        assert_eq!(ws.vmem().len(), 7);

        ws.region(layout.gain, 4, 5).unwrap();
        ws.region(layout.displacement, 3, 2).unwrap();
        assert!(matches!(
            ws.region(layout.displacement, 4, 2),
            Err(PreprocessingError::InvalidSize { .. })
        ));
        assert!(matches!(
            ws.region(layout.gain + 1, 1, 1),
            Err(PreprocessingError::InvalidAddress { fault: AddressFault::Unregistered, .. })
        ));
    }

    #[test]
    fn test_oversized_frames_do_not_wrap() {
        let huge = CalibrationConfig {
            rows: u16::MAX,
            cols: u16::MAX,
            ..config()
        };
        assert!(matches!(
            MemoryLayout::new(&huge),
            Err(ConfigError::FrameTooLarge { rows: u16::MAX, cols: u16::MAX })
        ));

        // Tiny frames, but a displacement table longer than the address space.
        let edge = CalibrationConfig {
            frames: u32::MAX as usize / 2 + 1,
            rows: 1,
            cols: 1,
            ..config()
        };
        assert!(MemoryLayout::new(&edge).is_err());
    }
}
