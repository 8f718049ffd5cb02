//! Global statistics used to recenter the gain estimate.

use serde::{Deserialize, Serialize};

use flatfield_core::{PreprocessingError, Result, Workspace};
use flatfield_math::{add, divide, int_to_fixed, multiply, subtract, Fixed, FixedResult, FP32_FWL};

/// Result of [`mean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeanStats {
    pub mean: Fixed,
    /// Five times the empirical standard deviation.
    pub five_sigma: Fixed,
    /// Number of contributing pixels, as a fixed-point value.
    pub count: Fixed,
    pub sum: Fixed,
}

/// Result of [`fivesigma`]: the outliers' sum and count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierStats {
    pub sum: Fixed,
    pub count: Fixed,
}

impl MeanStats {
    /// Mean of the pixels left after removing `outliers`.
    ///
    /// When the spread truncates to zero every deviating pixel is an outlier
    /// and nothing may be left; the untrimmed mean is returned then.
    pub fn trimmed_average(&self, outliers: &OutlierStats) -> Result<Fixed> {
        let invalid = || PreprocessingError::invalid_number("trimmed_average");
        let count = subtract(self.count, outliers.count).ok_or_else(invalid)?;
        if !count.is_positive() {
            return Ok(self.mean);
        }
        subtract(self.sum, outliers.sum)
            .and_then(|s| divide(s, count, FP32_FWL))
            .ok_or_else(invalid)
    }
}

fn checked(result: FixedResult, op: &'static str, index: usize) -> Result<Fixed> {
    result.ok_or(PreprocessingError::InvalidNumber {
        op,
        count: 1,
        first_index: Some(index),
    })
}

fn pixels_to_fixed(pixels: usize, op: &'static str) -> Result<Fixed> {
    let pixels = i32::try_from(pixels).map_err(|_| PreprocessingError::invalid_number(op))?;
    int_to_fixed(pixels, FP32_FWL).ok_or(PreprocessingError::invalid_number(op))
}

/// Mean and five-sigma spread of `src` over pixels whose `count` is > 0.
///
/// Accumulators are fixed-point; the first overflow aborts. A spread that
/// truncation drives negative is reported as zero.
pub fn mean(ws: &Workspace, src: u32, count: u32, rows: u16, cols: u16) -> Result<MeanStats> {
    let s = ws.region(src, rows, cols)?;
    let c = ws.region(count, rows, cols)?;

    let mut sum = Fixed::ZERO;
    let mut sum_sq = Fixed::ZERO;
    let mut pixels = 0usize;
    for p in 0..s.len() {
        if ws.read(c, p)? <= 0 {
            continue;
        }
        let v = checked(FixedResult::from_raw(ws.read(s, p)?), "mean", p)?;
        sum = checked(add(sum, v), "mean", p)?;
        let sq = checked(multiply(v, v, FP32_FWL), "mean", p)?;
        sum_sq = checked(add(sum_sq, sq), "mean", p)?;
        pixels += 1;
    }

    let n = pixels_to_fixed(pixels, "mean")?;
    let invalid = || PreprocessingError::invalid_number("mean");
    let mean = divide(sum, n, FP32_FWL).ok_or_else(invalid)?;
    let mean_sq = divide(sum_sq, n, FP32_FWL).ok_or_else(invalid)?;
    let variance = multiply(mean, mean, FP32_FWL)
        .and_then(|m2| subtract(mean_sq, m2))
        .ok_or_else(invalid)?;
    let sigma = Fixed::from_f64(variance.to_f64().max(0.0).sqrt()).ok_or_else(invalid)?;
    let five_sigma = Fixed::from_int(5)
        .and_then(|five| multiply(five, sigma, FP32_FWL))
        .ok_or_else(invalid)?;

    Ok(MeanStats {
        mean,
        five_sigma,
        count: n,
        sum,
    })
}

/// Sum and count of pixels (with `count` > 0) for which
/// `|src - mean| > five_sigma`.
#[allow(clippy::too_many_arguments)]
pub fn fivesigma(
    ws: &Workspace,
    src: u32,
    count: u32,
    rows: u16,
    cols: u16,
    mean: Fixed,
    five_sigma: Fixed,
) -> Result<OutlierStats> {
    let s = ws.region(src, rows, cols)?;
    let c = ws.region(count, rows, cols)?;

    let mut sum = Fixed::ZERO;
    let mut pixels = 0usize;
    for p in 0..s.len() {
        if ws.read(c, p)? <= 0 {
            continue;
        }
        let v = checked(FixedResult::from_raw(ws.read(s, p)?), "fivesigma", p)?;
        let deviation = checked(subtract(v, mean), "fivesigma", p)?;
        if deviation.abs() > five_sigma {
            sum = checked(add(sum, v), "fivesigma", p)?;
            pixels += 1;
        }
    }

    Ok(OutlierStats {
        sum,
        count: pixels_to_fixed(pixels, "fivesigma")?,
    })
}
