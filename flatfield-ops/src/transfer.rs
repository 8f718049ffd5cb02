//! Moving images between bulk storage and the working set.

use flatfield_core::{BulkStore, PreprocessingError, Result, SlotRole, Workspace};

use crate::kernel::NumericTally;

/// Copy the first `rows x cols` words of a bulk-store slot into `dst`.
pub fn load_image<S: BulkStore + ?Sized>(
    store: &S,
    role: SlotRole,
    ws: &mut Workspace,
    rows: u16,
    cols: u16,
    dst: u32,
) -> Result<()> {
    let d = ws.region(dst, rows, cols)?;
    let slot = store.slot(role)?;
    let src = slot.get(..d.len()).ok_or(PreprocessingError::SlotOverflow {
        role,
        words: d.len(),
        capacity: slot.len(),
    })?;

    let mut tally = NumericTally::new("load_image");
    for (p, &word) in src.iter().enumerate() {
        tally.check(p, word);
    }
    ws.words_mut(d)?.copy_from_slice(src);
    tally.finish()
}

/// Copy `rows x cols` words of `src` into the start of a bulk-store slot.
pub fn store_image<S: BulkStore + ?Sized>(
    ws: &Workspace,
    src: u32,
    rows: u16,
    cols: u16,
    store: &mut S,
    role: SlotRole,
) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let words = ws.words(s)?;
    let slot = store.slot_mut(role)?;
    let capacity = slot.len();
    let dst = slot.get_mut(..words.len()).ok_or(PreprocessingError::SlotOverflow {
        role,
        words: words.len(),
        capacity,
    })?;
    dst.copy_from_slice(words);
    Ok(())
}
