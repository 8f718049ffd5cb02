use proptest::prelude::*;
use flatfield_core::{AddressSpace, DataRef, PreprocessingError, Workspace, VMEM_MAX_ENTRIES};

fn data(offset: u32) -> Option<DataRef> {
    Some(DataRef::from_word_offset(offset as usize))
}

// Property 1: a second entry at a different address is accepted iff the
// two ranges do not intersect
proptest! {
    #[test]
    fn prop_overlap_rejected(
        a in 0u32..1000, a_size in 1u32..200,
        b in 0u32..1000, b_size in 1u32..200
    ) {
        prop_assume!(a != b);
        let mut vmem = AddressSpace::new();
        vmem.set_entry(a, a_size, 0, data(a)).unwrap();

        let intersects = a < b + b_size && b < a + a_size;
        let result = vmem.set_entry(b, b_size, 1, data(b));
        prop_assert_eq!(result.is_err(), intersects, "a={}+{} b={}+{}", a, a_size, b, b_size);
        prop_assert_eq!(vmem.len(), if intersects { 1 } else { 2 });
    }
}

// Property 2: the size gate is false exactly when rows*cols exceeds the size
proptest! {
    #[test]
    fn prop_processing_size_gate(size in 0u32..5000, rows in 0u16..100, cols in 0u16..100) {
        let mut vmem = AddressSpace::new();
        vmem.set_entry(64, size, 0, data(64)).unwrap();
        let fits = rows as u32 * cols as u32 <= size;
        prop_assert_eq!(vmem.is_processing_size_valid(64, rows, cols), fits);
        prop_assert!(!vmem.is_processing_size_valid(65, rows, cols));
    }
}

// Property 3: lookups on unregistered addresses are absent, never garbage
proptest! {
    #[test]
    fn prop_absent_lookups(addresses in prop::collection::btree_set(0u32..10_000, 1..VMEM_MAX_ENTRIES), lookup in 0u32..10_000) {
        let mut vmem = AddressSpace::new();
        for &a in &addresses {
            // Size 0 never overlaps anything.
            vmem.set_entry(a, 0, a, data(a)).unwrap();
        }
        if addresses.contains(&lookup) {
            prop_assert_eq!(vmem.get_dataset_id(lookup), Some(lookup));
            prop_assert_eq!(vmem.get_data_address(lookup), data(lookup));
        } else {
            prop_assert_eq!(vmem.get_data_address(lookup), None);
            prop_assert_eq!(vmem.get_size(lookup), None);
            prop_assert_eq!(vmem.get_dataset_id(lookup), None);
        }
    }
}

#[test]
fn test_seventeenth_entry_is_out_of_memory() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ws = Workspace::new(17 * 4);
    for i in 0..VMEM_MAX_ENTRIES as u32 {
        ws.map(i * 4, 4, i).unwrap();
    }
    assert_eq!(ws.map(64, 4, 16), Err(PreprocessingError::OutOfMemory { address: 64 }));
    println!("{}", ws.vmem());
}
