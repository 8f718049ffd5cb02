use log::{debug, warn};
use std::fmt;

use crate::status::{AddressFault, PreprocessingError, Result};

/// Capacity of the memory map for the whole process.
pub const VMEM_MAX_ENTRIES: usize = 16;

/// Bytes per stored sample; data references must be aligned to it.
pub const WORD_BYTES: usize = 4;

/// Non-owning reference into working memory, expressed as a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRef {
    byte_offset: usize,
}

impl DataRef {
    pub const fn from_byte_offset(byte_offset: usize) -> Self {
        Self { byte_offset }
    }

    pub const fn from_word_offset(word_offset: usize) -> Self {
        Self {
            byte_offset: word_offset * WORD_BYTES,
        }
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn word_offset(&self) -> usize {
        self.byte_offset / WORD_BYTES
    }

    pub fn is_aligned(&self) -> bool {
        self.byte_offset % WORD_BYTES == 0
    }
}

/// One registered region. `size` counts 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEntry {
    pub address: u32,
    pub size: u32,
    pub dataset_id: u32,
    pub data: DataRef,
}

impl MemoryEntry {
    /// One past the last address covered by this entry.
    pub fn end(&self) -> u64 {
        self.address as u64 + self.size as u64
    }
}

/// Fixed-capacity table mapping logical addresses to regions of working
/// memory. It records identity and size only; it never owns the data.
#[derive(Debug, Default, Clone)]
pub struct AddressSpace {
    entries: [Option<MemoryEntry>; VMEM_MAX_ENTRIES],
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `[address, address + size)` and return the slot used.
    ///
    /// Re-registering an address with the same size resets that entry in
    /// place; any other overlap is refused.
    pub fn set_entry(
        &mut self,
        address: u32,
        size: u32,
        dataset_id: u32,
        data: Option<DataRef>,
    ) -> Result<usize> {
        let data = data.ok_or_else(|| {
            warn!("vmem: null data reference for address {address:#010x}");
            PreprocessingError::invalid_address(address, AddressFault::NullData)
        })?;
        if !data.is_aligned() {
            warn!("vmem: unaligned data reference for address {address:#010x}");
            return Err(PreprocessingError::invalid_address(
                address,
                AddressFault::Unaligned {
                    byte_offset: data.byte_offset(),
                },
            ));
        }

        let start = address as u64;
        let end = start + size as u64;
        let mut slot = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let Some(e) = entry else {
                slot.get_or_insert(i);
                continue;
            };
            let inside = start > e.address as u64 && start < e.end();
            let reaches_into = start < e.address as u64 && end > e.address as u64;
            if inside || reaches_into {
                warn!(
                    "vmem: {address:#010x}+{size} overlaps {:#010x}+{}",
                    e.address, e.size
                );
                return Err(PreprocessingError::invalid_address(
                    address,
                    AddressFault::Overlap {
                        existing: e.address,
                        existing_size: e.size,
                    },
                ));
            }
            if e.address == address {
                if e.size != size {
                    warn!(
                        "vmem: {address:#010x} already registered with {} words, requested {size}",
                        e.size
                    );
                    return Err(PreprocessingError::invalid_address(
                        address,
                        AddressFault::SizeConflict {
                            registered: e.size,
                            requested: size,
                        },
                    ));
                }
                slot = Some(i);
            }
        }

        let Some(slot) = slot else {
            warn!("vmem: table full, cannot register {address:#010x}");
            return Err(PreprocessingError::OutOfMemory { address });
        };
        self.entries[slot] = Some(MemoryEntry {
            address,
            size,
            dataset_id,
            data,
        });
        debug!("vmem: slot {slot} <- {address:#010x} ({size} words, dataset {dataset_id})");
        Ok(slot)
    }

    pub fn delete_entry(&mut self, address: u32) -> Result<()> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| matches!(e, Some(e) if e.address == address))
            .ok_or(PreprocessingError::invalid_address(
                address,
                AddressFault::Unregistered,
            ))?;
        *slot = None;
        Ok(())
    }

    pub fn delete_all(&mut self) {
        self.entries = [None; VMEM_MAX_ENTRIES];
    }

    /// Exact-address lookup.
    pub fn entry(&self, address: u32) -> Option<&MemoryEntry> {
        self.iter().find(|e| e.address == address)
    }

    pub fn get_size(&self, address: u32) -> Option<u32> {
        self.entry(address).map(|e| e.size)
    }

    pub fn get_dataset_id(&self, address: u32) -> Option<u32> {
        self.entry(address).map(|e| e.dataset_id)
    }

    pub fn get_data_address(&self, address: u32) -> Option<DataRef> {
        self.entry(address).map(|e| e.data)
    }

    /// Registered entry for `address`, if `rows x cols` fits in it.
    pub fn check_processing_size(&self, address: u32, rows: u16, cols: u16) -> Result<&MemoryEntry> {
        let entry = self.entry(address).ok_or_else(|| {
            warn!("vmem: {address:#010x} is not registered");
            PreprocessingError::invalid_address(address, AddressFault::Unregistered)
        })?;
        if rows as u64 * cols as u64 > entry.size as u64 {
            warn!(
                "vmem: processing size {rows}x{cols} exceeds {} words at {address:#010x}",
                entry.size
            );
            return Err(PreprocessingError::InvalidSize {
                address,
                rows,
                cols,
                registered: entry.size,
            });
        }
        Ok(entry)
    }

    pub fn is_processing_size_valid(&self, address: u32, rows: u16, cols: u16) -> bool {
        self.check_processing_size(address, rows, cols).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>4} {:>10} {:>10} {:>8} {:>10}", "slot", "address", "words", "dataset", "data")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if let Some(e) = entry {
                writeln!(
                    f,
                    "{:>4} {:#010x} {:>10} {:>8} {:>10}",
                    i,
                    e.address,
                    e.size,
                    e.dataset_id,
                    e.data.byte_offset()
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(words: usize) -> Option<DataRef> {
        Some(DataRef::from_word_offset(words))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut vmem = AddressSpace::new();
        assert_eq!(vmem.set_entry(0x100, 64, 7, data(0x100)).unwrap(), 0);
        assert_eq!(vmem.set_entry(0x200, 16, 8, data(0x200)).unwrap(), 1);

        assert_eq!(vmem.get_size(0x100), Some(64));
        assert_eq!(vmem.get_dataset_id(0x200), Some(8));
        assert_eq!(vmem.get_data_address(0x100), data(0x100));
        assert_eq!(vmem.get_data_address(0x300), None);
        assert_eq!(vmem.get_size(0x101), None);
        assert_eq!(vmem.len(), 2);
    }

    #[test]
    fn test_rejects_null_and_unaligned() {
        let mut vmem = AddressSpace::new();
        let err = vmem.set_entry(0, 4, 0, None).unwrap_err();
        assert!(matches!(err, PreprocessingError::InvalidAddress { fault: AddressFault::NullData, .. }));
        let err = vmem
            .set_entry(0, 4, 0, Some(DataRef::from_byte_offset(6)))
            .unwrap_err();
        assert!(matches!(err, PreprocessingError::InvalidAddress { fault: AddressFault::Unaligned { byte_offset: 6 }, .. }));
        assert!(vmem.is_empty());
    }

    #[test]
    fn test_rejects_overlap() {
        let mut vmem = AddressSpace::new();
        vmem.set_entry(100, 50, 0, data(0)).unwrap();
        // Starts strictly inside.
        assert!(vmem.set_entry(120, 10, 0, data(200)).is_err());
        // Starts below and reaches into it.
        assert!(vmem.set_entry(90, 11, 0, data(200)).is_err());
        // Touching ranges are fine on both sides.
        vmem.set_entry(90, 10, 0, data(200)).unwrap();
        vmem.set_entry(150, 10, 0, data(300)).unwrap();
    }

    #[test]
    fn test_reregistration_same_size_reuses_slot() {
        let mut vmem = AddressSpace::new();
        vmem.set_entry(0, 16, 1, data(0)).unwrap();
        vmem.set_entry(32, 16, 2, data(32)).unwrap();
        vmem.delete_entry(0).unwrap();
        // Slot 0 is free again but the reset must land on the existing slot 1.
        assert_eq!(vmem.set_entry(32, 16, 9, data(64)).unwrap(), 1);
        assert_eq!(vmem.get_dataset_id(32), Some(9));
        assert_eq!(vmem.len(), 1);

        let err = vmem.set_entry(32, 8, 2, data(32)).unwrap_err();
        assert!(matches!(err, PreprocessingError::InvalidAddress { fault: AddressFault::SizeConflict { registered: 16, requested: 8 }, .. }));
    }

    #[test]
    fn test_out_of_memory() {
        let mut vmem = AddressSpace::new();
        for i in 0..VMEM_MAX_ENTRIES as u32 {
            vmem.set_entry(i * 10, 10, i, data(i as usize * 10)).unwrap();
        }
        let err = vmem.set_entry(1000, 10, 0, data(1000)).unwrap_err();
        assert_eq!(err, PreprocessingError::OutOfMemory { address: 1000 });

        vmem.delete_all();
        assert!(vmem.is_empty());
        vmem.set_entry(1000, 10, 0, data(1000)).unwrap();
    }

    #[test]
    fn test_processing_size_gate() {
        let mut vmem = AddressSpace::new();
        vmem.set_entry(0, 16, 0, data(0)).unwrap();
        assert!(vmem.is_processing_size_valid(0, 4, 4));
        assert!(vmem.is_processing_size_valid(0, 2, 3));
        assert!(!vmem.is_processing_size_valid(0, 4, 5));
        assert!(!vmem.is_processing_size_valid(16, 1, 1));
        assert!(matches!(
            vmem.check_processing_size(0, 5, 4),
            Err(PreprocessingError::InvalidSize { rows: 5, cols: 4, registered: 16, .. })
        ));
        assert!(vmem.delete_entry(16).is_err());
    }

    #[test]
    fn test_display_lists_entries() {
        let mut vmem = AddressSpace::new();
        vmem.set_entry(0x40, 8, 3, data(0x40)).unwrap();
        let table = vmem.to_string();
        assert!(table.contains("0x00000040"));
        assert_eq!(table.lines().count(), 2);
    }
}
