//! 2-D integer images in FITS files, through `fitsio`.
//!
//! - reading takes the first HDU with `NAXIS = 2`; samples come back as
//!   physical values (BSCALE/BZERO applied) and must round to an `i32`
//! - writing creates a 32-bit integer image extension followed by the
//!   extra header cards

use std::path::Path;

use fitsio::hdu::FitsHdu;
use fitsio::images::{ImageDescription, ImageType};
use fitsio::FitsFile;
use log::debug;
use thiserror::Error;

const EXTNAME: &str = "IMAGE";

#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::errors::Error),
    #[error("Invalid FITS image: {0}")]
    InvalidFormat(String),
    #[error("Sample {index} = {value} is not a 32-bit count")]
    Sample { index: usize, value: f64 },
    #[error("{rows}x{cols} image cannot hold {samples} samples")]
    Dimensions { rows: usize, cols: usize, samples: usize },
}

/// One `KEYWORD = value` record. Values that parse as numbers are written
/// as numbers, anything else as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCard {
    pub keyword: String,
    pub value: String,
}

impl HeaderCard {
    pub fn new(keyword: &str, value: &str) -> Self {
        Self {
            keyword: keyword.to_uppercase(),
            value: value.to_string(),
        }
    }

    fn read(fptr: &mut FitsFile, hdu: &FitsHdu, keyword: &str) -> Option<Self> {
        let value = hdu
            .read_key::<f64>(fptr, keyword)
            .map(|v| v.to_string())
            .or_else(|_| hdu.read_key::<String>(fptr, keyword))
            .ok()?;
        Some(Self::new(keyword, &value))
    }

    fn write(&self, fptr: &mut FitsFile, hdu: &FitsHdu) -> Result<(), FitsError> {
        if let Ok(v) = self.value.parse::<i64>() {
            hdu.write_key(fptr, &self.keyword, v)?;
        } else if let Ok(v) = self.value.parse::<f64>() {
            hdu.write_key(fptr, &self.keyword, v)?;
        } else {
            hdu.write_key(fptr, &self.keyword, self.value.as_str())?;
        }
        Ok(())
    }
}

/// A row-major 2-D integer image with its extra header records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitsImage {
    pub rows: u16,
    pub cols: u16,
    pub samples: Vec<i32>,
    pub header: Vec<HeaderCard>,
}

impl FitsImage {
    pub fn new(rows: u16, cols: u16, samples: Vec<i32>) -> Result<Self, FitsError> {
        if samples.len() != rows as usize * cols as usize {
            return Err(FitsError::Dimensions {
                rows: rows as usize,
                cols: cols as usize,
                samples: samples.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            samples,
            header: Vec::new(),
        })
    }

    pub fn with_card(mut self, keyword: &str, value: &str) -> Self {
        self.header.push(HeaderCard::new(keyword, value));
        self
    }

    pub fn card(&self, keyword: &str) -> Option<&str> {
        let keyword = keyword.to_uppercase();
        self.header
            .iter()
            .find(|c| c.keyword == keyword)
            .map(|c| c.value.as_str())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FitsError> {
        Self::load_with_cards(path, &[])
    }

    /// Load the image and whichever of `keywords` its HDU carries.
    pub fn load_with_cards(path: impl AsRef<Path>, keywords: &[&str]) -> Result<Self, FitsError> {
        let path = path.as_ref();
        let mut fptr = FitsFile::open(path)?;

        let mut index: usize = 0;
        while let Ok(hdu) = fptr.hdu(index) {
            if hdu.read_key::<i64>(&mut fptr, "NAXIS").unwrap_or(0) == 2 {
                let image = Self::read_hdu(&mut fptr, &hdu, keywords)?;
                debug!(
                    "fits: read {}x{} from {} (hdu {index})",
                    image.rows,
                    image.cols,
                    path.display()
                );
                return Ok(image);
            }
            index += 1;
        }
        Err(FitsError::InvalidFormat(format!("{} has no 2-D image", path.display())))
    }

    fn read_hdu(fptr: &mut FitsFile, hdu: &FitsHdu, keywords: &[&str]) -> Result<Self, FitsError> {
        let cols = dimension(hdu.read_key::<i64>(fptr, "NAXIS1")?)?;
        let rows = dimension(hdu.read_key::<i64>(fptr, "NAXIS2")?)?;
        let physical: Vec<f64> = hdu.read_image(fptr)?;

        let samples = physical
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                let rounded = value.round();
                if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
                    Ok(rounded as i32)
                } else {
                    Err(FitsError::Sample { index, value })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut image = Self::new(rows, cols, samples)?;
        image.header = keywords
            .iter()
            .filter_map(|k| HeaderCard::read(fptr, hdu, k))
            .collect();
        Ok(image)
    }

    /// Write a fresh file, replacing any existing one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FitsError> {
        let mut fptr = FitsFile::create(path.as_ref()).overwrite().open()?;
        let description = ImageDescription {
            data_type: ImageType::Long,
            dimensions: &[self.rows as usize, self.cols as usize],
        };
        let hdu = fptr.create_image(EXTNAME.to_string(), &description)?;
        hdu.write_image(&mut fptr, &self.samples[..])?;
        for card in &self.header {
            card.write(&mut fptr, &hdu)?;
        }
        Ok(())
    }
}

fn dimension(value: i64) -> Result<u16, FitsError> {
    u16::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| FitsError::InvalidFormat(format!("axis length {value}")))
}
