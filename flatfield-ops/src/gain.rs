use std::cmp::Ordering;

use flatfield_core::{Result, Workspace};
use flatfield_math::{compare, divide, Fixed, FixedResult, FP32_FWL, FP32_ONE};

use crate::kernel::NumericTally;

/// `dst = num / count` wherever `count > 1.0`; other pixels of `dst` are
/// left unchanged (dividing by 1.0 would be the identity anyway).
pub fn normalize(ws: &mut Workspace, num: u32, count: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    let n = ws.region(num, rows, cols)?;
    let c = ws.region(count, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;

    let mut tally = NumericTally::new("normalize");
    for p in 0..d.len() {
        let weight = ws.read(c, p)?;
        if compare(weight, FP32_ONE) == Ordering::Greater {
            let word = FixedResult::from_raw(ws.read(n, p)?)
                .zip_with(FixedResult::from_raw(weight), |a, b| divide(a, b, FP32_FWL))
                .to_raw();
            ws.write(d, p, word)?;
        }
        tally.check(p, ws.read(d, p)?);
    }
    tally.finish()
}

/// `dst = round(10^src)` wherever `mask` is nonzero; other pixels are left
/// unchanged. Inverts the logarithm taken when the frames were masked.
pub fn flatfield(ws: &mut Workspace, src: u32, mask: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let m = ws.region(mask, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;

    let mut tally = NumericTally::new("flatfield");
    for p in 0..d.len() {
        if ws.read(m, p)? != 0 {
            let word = FixedResult::from_raw(ws.read(s, p)?)
                .and_then(|v| Fixed::from_f64_rounded(10f64.powf(v.to_f64())))
                .to_raw();
            ws.write(d, p, word)?;
            tally.check(p, word);
        }
    }
    tally.finish()
}
