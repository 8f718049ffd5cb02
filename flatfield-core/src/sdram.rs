use log::warn;

use crate::status::{AddressFault, PreprocessingError, Result};
use crate::vmem::{AddressSpace, DataRef, MemoryEntry};

/// Working memory: one flat run of 32-bit words shared by every buffer.
#[derive(Debug, Clone)]
pub struct Sdram {
    words: Vec<i32>,
}

impl Sdram {
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words],
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A validated view of `rows x cols` words of one registered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    address: u32,
    start: usize,
    len: usize,
}

impl Region {
    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The address space together with the memory it describes. Every pixel
/// access goes through [`Workspace::region`] and the indexed accessors.
#[derive(Debug, Clone)]
pub struct Workspace {
    vmem: AddressSpace,
    sdram: Sdram,
}

impl Workspace {
    pub fn new(sdram_words: usize) -> Self {
        Self {
            vmem: AddressSpace::new(),
            sdram: Sdram::new(sdram_words),
        }
    }

    pub fn vmem(&self) -> &AddressSpace {
        &self.vmem
    }

    pub fn vmem_mut(&mut self) -> &mut AddressSpace {
        &mut self.vmem
    }

    pub fn sdram(&self) -> &Sdram {
        &self.sdram
    }

    /// Register a buffer whose data must lie inside working memory.
    pub fn set_entry(
        &mut self,
        address: u32,
        size: u32,
        dataset_id: u32,
        data: Option<DataRef>,
    ) -> Result<usize> {
        if let Some(data) = data {
            let end = data.word_offset() + size as usize;
            if data.is_aligned() && end > self.sdram.len() {
                warn!(
                    "vmem: {address:#010x}+{size} ends past working memory ({} words)",
                    self.sdram.len()
                );
                return Err(PreprocessingError::invalid_address(
                    address,
                    AddressFault::OutOfBounds { index: end },
                ));
            }
        }
        self.vmem.set_entry(address, size, dataset_id, data)
    }

    /// Register `address` backed by the words starting at the same offset.
    pub fn map(&mut self, address: u32, size: u32, dataset_id: u32) -> Result<usize> {
        self.set_entry(
            address,
            size,
            dataset_id,
            Some(DataRef::from_word_offset(address as usize)),
        )
    }

    /// Validate `rows x cols` against the registration of `address`.
    pub fn region(&self, address: u32, rows: u16, cols: u16) -> Result<Region> {
        let MemoryEntry { size, data, .. } = *self.vmem.check_processing_size(address, rows, cols)?;
        let start = data.word_offset();
        if start + size as usize > self.sdram.len() {
            return Err(PreprocessingError::invalid_address(
                address,
                AddressFault::OutOfBounds {
                    index: start + size as usize,
                },
            ));
        }
        Ok(Region {
            address,
            start,
            len: rows as usize * cols as usize,
        })
    }

    #[inline]
    pub fn read(&self, region: Region, index: usize) -> Result<i32> {
        self.check_index(region, index)?;
        Ok(self.sdram.words[region.start + index])
    }

    #[inline]
    pub fn write(&mut self, region: Region, index: usize, word: i32) -> Result<()> {
        self.check_index(region, index)?;
        self.sdram.words[region.start + index] = word;
        Ok(())
    }

    pub fn words(&self, region: Region) -> Result<&[i32]> {
        self.sdram
            .words
            .get(region.start..region.start + region.len)
            .ok_or(PreprocessingError::invalid_address(
                region.address,
                AddressFault::OutOfBounds {
                    index: region.start + region.len,
                },
            ))
    }

    pub fn words_mut(&mut self, region: Region) -> Result<&mut [i32]> {
        self.sdram
            .words
            .get_mut(region.start..region.start + region.len)
            .ok_or(PreprocessingError::invalid_address(
                region.address,
                AddressFault::OutOfBounds {
                    index: region.start + region.len,
                },
            ))
    }

    fn check_index(&self, region: Region, index: usize) -> Result<()> {
        if index >= region.len || region.start + index >= self.sdram.len() {
            return Err(PreprocessingError::invalid_address(
                region.address,
                AddressFault::OutOfBounds { index },
            ));
        }
        Ok(())
    }
}
