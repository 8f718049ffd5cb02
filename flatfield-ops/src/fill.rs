use flatfield_core::{Result, Workspace};

use crate::kernel::NumericTally;

/// Copy `src` into `dst`.
pub fn equal_images(ws: &mut Workspace, src: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    let s = ws.region(src, rows, cols)?;
    let d = ws.region(dst, rows, cols)?;

    let mut tally = NumericTally::new("equal_images");
    for p in 0..s.len() {
        let word = ws.read(s, p)?;
        ws.write(d, p, word)?;
        tally.check(p, word);
    }
    tally.finish()
}

/// Fill `rows x cols` of `dst` with 0.
pub fn zero(ws: &mut Workspace, dst: u32, rows: u16, cols: u16) -> Result<()> {
    let d = ws.region(dst, rows, cols)?;
    ws.words_mut(d)?.fill(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfield_math::FP32_NAN;

    #[test]
    fn test_copy_and_zero() {
        let mut ws = Workspace::new(8);
        ws.map(0, 4, 0).unwrap();
        ws.map(4, 4, 1).unwrap();
        let src = ws.region(0, 2, 2).unwrap();
        ws.words_mut(src).unwrap().copy_from_slice(&[1, 2, 3, 4]);

        equal_images(&mut ws, 0, 2, 2, 4).unwrap();
        assert_eq!(ws.words(ws.region(4, 2, 2).unwrap()).unwrap(), &[1, 2, 3, 4]);

        zero(&mut ws, 0, 1, 3).unwrap();
        assert_eq!(ws.words(src).unwrap(), &[0, 0, 0, 4]);

        ws.write(src, 3, FP32_NAN).unwrap();
        assert!(equal_images(&mut ws, 0, 2, 2, 4).is_err());
        assert!(zero(&mut ws, 0, 3, 2).is_err());
    }
}
