//! Regions of interest addressed by a signed pixel offset.
//!
//! For an offset `(dx, dy)` the window of source pixels is
//! `rows [max(0,-dy), min(0,-dy)+rows)` and `cols [max(0,-dx), min(0,-dx)+cols)`.
//! Pixel `p = y*cols + x` of the window maps to
//! `roi = (y - row_lo)*cols + (x - col_lo)`, i.e. the window moved to the
//! origin. Only the window is touched; everything else is left as it was.

use flatfield_core::{Result, Workspace};
use flatfield_math::{add, subtract, FixedResult, Fixed};

use crate::kernel::NumericTally;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiWindow {
    pub row_lo: usize,
    pub row_hi: usize,
    pub col_lo: usize,
    pub col_hi: usize,
    cols: usize,
}

/// `[lo, hi)` along one axis; empty when the offset exceeds the extent.
fn edges(extent: u16, offset: i16) -> (usize, usize) {
    let neg = -(offset as i32);
    let lo = neg.max(0);
    let hi = neg.min(0) + extent as i32;
    if hi <= lo {
        (0, 0)
    } else {
        (lo as usize, hi as usize)
    }
}

impl RoiWindow {
    pub fn new(rows: u16, cols: u16, dx: i16, dy: i16) -> Self {
        let (row_lo, row_hi) = edges(rows, dy);
        let (col_lo, col_hi) = edges(cols, dx);
        Self {
            row_lo,
            row_hi,
            col_lo,
            col_hi,
            cols: cols as usize,
        }
    }

    pub fn height(&self) -> usize {
        self.row_hi - self.row_lo
    }

    pub fn width(&self) -> usize {
        self.col_hi - self.col_lo
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// `(p, roi)` index pairs in increasing `p` order.
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.cols;
        let width = if self.is_empty() { 0 } else { self.width() };
        (self.row_lo..self.row_hi).flat_map(move |y| {
            (self.col_lo..self.col_lo + width).map(move |x| {
                (y * cols + x, (y - self.row_lo) * cols + (x - self.col_lo))
            })
        })
    }
}

/// Extract: `dst[roi] = src[p]`. In-place use (`src == dst`) is safe
/// because every write lands at or before the pixel just read.
pub fn create_roi(ws: &mut Workspace, src: u32, rows: u16, cols: u16, dx: i16, dy: i16, dst: u32) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;
    let window = RoiWindow::new(rows, cols, dx, dy);

    let mut tally = NumericTally::new("create_roi");
    for (p, roi) in window.indices() {
        let word = ws.read(s, p)?;
        ws.write(d, roi, word)?;
        tally.check(roi, word);
    }
    tally.finish()
}

/// Insert, the inverse of [`create_roi`]: `dst[p] = src[roi]`.
pub fn insert_roi(ws: &mut Workspace, src: u32, rows: u16, cols: u16, dx: i16, dy: i16, dst: u32) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;
    let window = RoiWindow::new(rows, cols, dx, dy);

    let mut tally = NumericTally::new("insert_roi");
    for (p, roi) in window.indices() {
        let word = ws.read(s, roi)?;
        ws.write(d, p, word)?;
        tally.check(p, word);
    }
    tally.finish()
}

/// `dst[p] = src1[p] + src2[roi]` over the window.
#[allow(clippy::too_many_arguments)]
pub fn add_roi(ws: &mut Workspace, src1: u32, src2: u32, rows: u16, cols: u16, dx: i16, dy: i16, dst: u32) -> Result<()> {
    combine_roi(ws, "add_roi", src1, src2, rows, cols, dx, dy, dst, add)
}

/// `dst[p] = src1[p] - src2[roi]` over the window.
#[allow(clippy::too_many_arguments)]
pub fn subtract_roi(ws: &mut Workspace, src1: u32, src2: u32, rows: u16, cols: u16, dx: i16, dy: i16, dst: u32) -> Result<()> {
    combine_roi(ws, "subtract_roi", src1, src2, rows, cols, dx, dy, dst, subtract)
}

#[allow(clippy::too_many_arguments)]
fn combine_roi(
    ws: &mut Workspace,
    op: &'static str,
    src1: u32,
    src2: u32,
    rows: u16,
    cols: u16,
    dx: i16,
    dy: i16,
    dst: u32,
    f: fn(Fixed, Fixed) -> FixedResult,
) -> Result<()> {
    let a = ws.region(src1, rows, cols)?;
    let b = ws.region(src2, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;
    let window = RoiWindow::new(rows, cols, dx, dy);

    let mut tally = NumericTally::new(op);
    for (p, roi) in window.indices() {
        let lhs = FixedResult::from_raw(ws.read(a, p)?);
        let rhs = FixedResult::from_raw(ws.read(b, roi)?);
        let word = lhs.zip_with(rhs, f).to_raw();
        ws.write(d, p, word)?;
        tally.check(p, word);
    }
    tally.finish()
}

/// Zero every pixel outside the `height x width` block at the origin that
/// [`create_roi`] fills for this offset.
pub fn clear_outside_roi(ws: &mut Workspace, dst: u32, rows: u16, cols: u16, dx: i16, dy: i16) -> Result<()> {
    let d = ws.region(dst, rows, cols)?;
    let window = RoiWindow::new(rows, cols, dx, dy);
    let (height, width) = if window.is_empty() {
        (0, 0)
    } else {
        (window.height(), window.width())
    };
    for p in 0..d.len() {
        let (y, x) = (p / cols as usize, p % cols as usize);
        if y >= height || x >= width {
            ws.write(d, p, 0)?;
        }
    }
    Ok(())
}

/// Extract in place and zero the uncovered border: a shift with zero fill.
pub fn shift_image(ws: &mut Workspace, buffer: u32, rows: u16, cols: u16, dx: i16, dy: i16) -> Result<()> {
    create_roi(ws, buffer, rows, cols, dx, dy, buffer)?;
    clear_outside_roi(ws, buffer, rows, cols, dx, dy)
}
