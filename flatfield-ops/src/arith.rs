//! Elementwise image/image and image/scalar arithmetic, plus reductions.

use flatfield_core::{PreprocessingError, Result, Workspace};
use flatfield_math::{
    add, divide, int_to_fixed, multiply, subtract, Fixed, FixedResult, FP32_FWL,
};

use crate::kernel::{combine_images, map_image};

/// `dst = src1 + src2`, pixel by pixel. Overflowed pixels hold the sentinel
/// and are reported as invalid numbers.
///
/// # Example
/// ```
/// use flatfield_core::Workspace;
/// use flatfield_ops::add_images;
///
/// let mut ws = Workspace::new(12);
/// for (address, id) in [(0, 1), (4, 2), (8, 3)] {
///     ws.map(address, 4, id).unwrap();
/// }
/// let a = ws.region(0, 2, 2).unwrap();
/// ws.words_mut(a).unwrap().copy_from_slice(&[256, 512, -256, 0]);
/// let b = ws.region(4, 2, 2).unwrap();
/// ws.words_mut(b).unwrap().copy_from_slice(&[256; 4]);
///
/// add_images(&mut ws, 0, 4, 2, 2, 8).unwrap();
/// let sum = ws.region(8, 2, 2).unwrap();
/// assert_eq!(ws.words(sum).unwrap(), &[512, 768, 0, 256]);
/// ```
pub fn add_images(ws: &mut Workspace, src1: u32, src2: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    combine_images(ws, "add_images", src1, src2, rows, cols, dst, add)
}

/// `dst = src1 - src2`, pixel by pixel.
pub fn subtract_images(ws: &mut Workspace, src1: u32, src2: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    combine_images(ws, "subtract_images", src1, src2, rows, cols, dst, subtract)
}

/// `dst = src1 * src2` in Q24.8, pixel by pixel.
pub fn multiply_images(ws: &mut Workspace, src1: u32, src2: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    combine_images(ws, "multiply_images", src1, src2, rows, cols, dst, |a, b| {
        multiply(a, b, FP32_FWL)
    })
}

/// Pixels divided by zero become invalid numbers; the rest are still written.
pub fn divide_images(ws: &mut Workspace, src1: u32, src2: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    combine_images(ws, "divide_images", src1, src2, rows, cols, dst, |a, b| {
        divide(a, b, FP32_FWL)
    })
}

/// `dst = src + scalar`.
pub fn add_scalar(ws: &mut Workspace, src: u32, rows: u16, cols: u16, scalar: Fixed, dst: u32) -> Result<()> {
    map_image(ws, "add_scalar", src, rows, cols, dst, |v| add(v, scalar))
}

/// `dst = src - scalar`.
pub fn subtract_scalar(ws: &mut Workspace, src: u32, rows: u16, cols: u16, scalar: Fixed, dst: u32) -> Result<()> {
    map_image(ws, "subtract_scalar", src, rows, cols, dst, |v| subtract(v, scalar))
}

/// `dst = src * scalar` in Q24.8.
pub fn multiply_scalar(ws: &mut Workspace, src: u32, rows: u16, cols: u16, scalar: Fixed, dst: u32) -> Result<()> {
    map_image(ws, "multiply_scalar", src, rows, cols, dst, |v| {
        multiply(v, scalar, FP32_FWL)
    })
}

/// `dst = src / scalar`. A zero scalar is rejected before any pixel is
/// written.
pub fn divide_scalar(ws: &mut Workspace, src: u32, rows: u16, cols: u16, scalar: Fixed, dst: u32) -> Result<()> {
    ws.region(src, rows, cols)?;
    ws.region(dst, rows, cols)?;
    if scalar.is_zero() {
        return Err(PreprocessingError::invalid_number("divide_scalar"));
    }
    map_image(ws, "divide_scalar", src, rows, cols, dst, |v| {
        divide(v, scalar, FP32_FWL)
    })
}

/// Base-10 logarithm of every positive pixel; non-positive pixels are invalid.
pub fn log10_image(ws: &mut Workspace, src: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    map_image(ws, "log10_image", src, rows, cols, dst, |v| {
        if v.is_positive() {
            Fixed::from_f64(v.to_f64().log10())
        } else {
            FixedResult::Overflow
        }
    })
}

/// Square root of every non-negative pixel; negative pixels are invalid.
pub fn sqrt_image(ws: &mut Workspace, src: u32, rows: u16, cols: u16, dst: u32) -> Result<()> {
    map_image(ws, "sqrt_image", src, rows, cols, dst, |v| {
        if v.raw() >= 0 {
            Fixed::from_f64(v.to_f64().sqrt())
        } else {
            FixedResult::Overflow
        }
    })
}

/// Sum of all pixels. Stops at the first overflow.
pub fn sum_image(ws: &Workspace, src: u32, rows: u16, cols: u16) -> Result<Fixed> {
    let s = ws.region(src, rows, cols)?;
    let mut sum = Fixed::ZERO;
    for p in 0..s.len() {
        sum = FixedResult::from_raw(ws.read(s, p)?)
            .and_then(|v| add(sum, v))
            .ok_or(PreprocessingError::InvalidNumber {
                op: "sum_image",
                count: 1,
                first_index: Some(p),
            })?;
    }
    Ok(sum)
}

/// Mean of all pixels.
pub fn mean_image(ws: &Workspace, src: u32, rows: u16, cols: u16) -> Result<Fixed> {
    let sum = sum_image(ws, src, rows, cols)?;
    let pixels = i32::try_from(rows as u32 * cols as u32).unwrap_or(i32::MAX);
    int_to_fixed(pixels, FP32_FWL)
        .and_then(|n| divide(sum, n, FP32_FWL))
        .ok_or(PreprocessingError::invalid_number("mean_image"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfield_math::{FP32_MAX, FP32_NAN, FP32_ONE};

    fn workspace(images: &[&[i32]]) -> Workspace {
        let len = images[0].len();
        let mut ws = Workspace::new(len * (images.len() + 1));
        for (i, image) in images.iter().enumerate() {
            let address = (i * len) as u32;
            ws.map(address, len as u32, i as u32).unwrap();
            let region = ws.region(address, 1, len as u16).unwrap();
            ws.words_mut(region).unwrap().copy_from_slice(image);
        }
        let out = (images.len() * len) as u32;
        ws.map(out, len as u32, 99).unwrap();
        ws
    }

    fn words(ws: &Workspace, address: u32, len: usize) -> Vec<i32> {
        ws.words(ws.region(address, 1, len as u16).unwrap()).unwrap().to_vec()
    }

    #[test]
    fn test_elementwise_images() {
        let one = FP32_ONE;
        let mut ws = workspace(&[&[one, 2 * one, -one, 0], &[one, one / 2, 3 * one, one]]);
        add_images(&mut ws, 0, 4, 2, 2, 8).unwrap();
        assert_eq!(words(&ws, 8, 4), vec![2 * one, 5 * one / 2, 2 * one, one]);
        subtract_images(&mut ws, 0, 4, 2, 2, 8).unwrap();
        assert_eq!(words(&ws, 8, 4), vec![0, 3 * one / 2, -4 * one, -one]);
        multiply_images(&mut ws, 0, 4, 2, 2, 8).unwrap();
        assert_eq!(words(&ws, 8, 4), vec![one, one, -3 * one, 0]);
        divide_images(&mut ws, 4, 0, 2, 2, 8).unwrap_err();
        // Division by the zero pixel is flagged but the others were written.
        assert_eq!(words(&ws, 8, 4), vec![one, one / 4, -3 * one, FP32_NAN]);
    }

    #[test]
    fn test_overflow_sets_status_but_continues() {
        let mut ws = workspace(&[&[FP32_MAX, 1, FP32_MAX, 2], &[1, 1, 1, 1]]);
        let err = add_images(&mut ws, 0, 4, 2, 2, 8).unwrap_err();
        assert_eq!(
            err,
            PreprocessingError::InvalidNumber { op: "add_images", count: 2, first_index: Some(0) }
        );
        assert_eq!(words(&ws, 8, 4), vec![FP32_NAN, 2, FP32_NAN, 3]);
    }

    #[test]
    fn test_shape_checked_before_any_write() {
        let mut ws = workspace(&[&[1, 1, 1, 1], &[1, 1, 1, 1]]);
        let err = add_images(&mut ws, 0, 4, 3, 2, 8).unwrap_err();
        assert!(matches!(err, PreprocessingError::InvalidSize { rows: 3, cols: 2, .. }));
        assert_eq!(words(&ws, 8, 4), vec![0; 4]);
    }

    #[test]
    fn test_scalar_ops() {
        let one = FP32_ONE;
        let mut ws = workspace(&[&[one, 2 * one, 4 * one, -one]]);
        let two = Fixed::from_int(2).value().unwrap();
        multiply_scalar(&mut ws, 0, 1, 4, two, 4).unwrap();
        assert_eq!(words(&ws, 4, 4), vec![2 * one, 4 * one, 8 * one, -2 * one]);
        divide_scalar(&mut ws, 0, 1, 4, two, 4).unwrap();
        assert_eq!(words(&ws, 4, 4), vec![one / 2, one, 2 * one, -one / 2]);
        subtract_scalar(&mut ws, 0, 1, 4, two, 0).unwrap();
        assert_eq!(words(&ws, 0, 4), vec![-one, 0, 2 * one, -3 * one]);
        add_scalar(&mut ws, 0, 1, 4, two, 0).unwrap();
        assert_eq!(words(&ws, 0, 4), vec![one, 2 * one, 4 * one, -one]);
        assert!(divide_scalar(&mut ws, 0, 1, 4, Fixed::ZERO, 4).is_err());
    }

    #[test]
    fn test_reductions_and_transcendentals() {
        let one = FP32_ONE;
        let mut ws = workspace(&[&[one, 10 * one, 100 * one, 4 * one]]);
        assert_eq!(sum_image(&ws, 0, 2, 2).unwrap().raw(), 115 * one);
        assert_eq!(mean_image(&ws, 0, 2, 2).unwrap().raw(), 115 * one / 4);
        sqrt_image(&mut ws, 0, 1, 4, 4).unwrap();
        assert_eq!(words(&ws, 4, 4)[3], 2 * one);
        log10_image(&mut ws, 0, 1, 4, 4).unwrap();
        assert_eq!(words(&ws, 4, 4)[0], 0);
        assert_eq!(words(&ws, 4, 4)[1], one);
    }
}
