//! Shared per-pixel loops.

use flatfield_core::{PreprocessingError, Result, Workspace};
use flatfield_math::{Fixed, FixedResult, FP32_NAN};
use log::warn;

/// Counts sentinel words produced by one operation. Processing continues
/// past a bad pixel; the status is reported once at the end.
pub(crate) struct NumericTally {
    op: &'static str,
    count: usize,
    first_index: Option<usize>,
}

impl NumericTally {
    pub(crate) fn new(op: &'static str) -> Self {
        Self {
            op,
            count: 0,
            first_index: None,
        }
    }

    pub(crate) fn record(&mut self, index: usize, poisoned: bool) {
        if poisoned {
            self.count += 1;
            self.first_index.get_or_insert(index);
        }
    }

    pub(crate) fn check(&mut self, index: usize, word: i32) {
        self.record(index, word == FP32_NAN);
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.count == 0 {
            return Ok(());
        }
        warn!("{}: {} invalid sample(s)", self.op, self.count);
        Err(PreprocessingError::InvalidNumber {
            op: self.op,
            count: self.count,
            first_index: self.first_index,
        })
    }
}

/// `dst[p] = f(src1[p], src2[p])` over `rows x cols`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn combine_images<F>(
    ws: &mut Workspace,
    op: &'static str,
    src1: u32,
    src2: u32,
    rows: u16,
    cols: u16,
    dst: u32,
    f: F,
) -> Result<()>
where
    F: Fn(Fixed, Fixed) -> FixedResult,
{
    let a = ws.region(src1, rows, cols)?;
    let b = ws.region(src2, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;

    let mut tally = NumericTally::new(op);
    for p in 0..d.len() {
        let lhs = FixedResult::from_raw(ws.read(a, p)?);
        let rhs = FixedResult::from_raw(ws.read(b, p)?);
        let word = lhs.zip_with(rhs, &f).to_raw();
        ws.write(d, p, word)?;
        tally.check(p, word);
    }
    tally.finish()
}

/// `dst[p] = f(src[p])` over `rows x cols`.
pub(crate) fn map_image<F>(
    ws: &mut Workspace,
    op: &'static str,
    src: u32,
    rows: u16,
    cols: u16,
    dst: u32,
    f: F,
) -> Result<()>
where
    F: Fn(Fixed) -> FixedResult,
{
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;

    let mut tally = NumericTally::new(op);
    for p in 0..d.len() {
        let word = FixedResult::from_raw(ws.read(s, p)?).and_then(&f).to_raw();
        ws.write(d, p, word)?;
        tally.check(p, word);
    }
    tally.finish()
}
