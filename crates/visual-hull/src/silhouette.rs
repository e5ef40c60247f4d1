//! Silhouette extraction from decoded images.
//!
//! An extractor turns one decoded image into a [`SilhouetteSet`]: for every
//! sampled row, the leftmost and rightmost sampled columns that belong to the
//! object. The carving core only depends on the [`SilhouetteExtractor`] trait.

use image::RgbImage;

use crate::config::CarveParams;
use crate::types::{SilhouetteSet, Slice};

/// Turns a decoded image into per-row silhouette boundaries.
pub trait SilhouetteExtractor {
    /// Extract the silhouette. Rows without object pixels produce no slice, so
    /// the result is empty when nothing was found.
    fn extract(&self, image: &RgbImage) -> SilhouetteSet;

    /// Intensity threshold used, for error reporting.
    fn threshold(&self) -> u32;
}

/// Intensity-threshold extractor for images of a lit object on a dark
/// background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdExtractor {
    /// Row and column sampling stride in pixels.
    pub step: u32,
    /// A pixel is silhouette when `r + g + b > threshold`.
    pub threshold: u32,
    /// Scan only rows below this index.
    pub row_cap: Option<u32>,
}

impl ThresholdExtractor {
    /// Create an extractor.
    pub fn new(step: u32, threshold: u32, row_cap: Option<u32>) -> Self {
        Self {
            step: step.max(1),
            threshold,
            row_cap,
        }
    }

    /// Extractor configured from run parameters.
    pub fn from_params(params: &CarveParams) -> Self {
        Self::new(params.step.max(1) as u32, params.threshold, params.row_cap)
    }

    /// Whether the pixel at `(x, y)` is part of the object.
    #[inline]
    fn is_object(&self, image: &RgbImage, x: u32, y: u32) -> bool {
        let [r, g, b] = image.get_pixel(x, y).0;
        r as u32 + g as u32 + b as u32 > self.threshold
    }

    fn scan_row(&self, image: &RgbImage, y: u32) -> Option<Slice> {
        let width = image.width();
        let step = self.step as usize;

        let left = (0..width)
            .step_by(step)
            .find(|&x| self.is_object(image, x, y))?;

        // The right scan walks its own grid down from the last column and never
        // reaches column 0.
        let right = (1..width)
            .rev()
            .step_by(step)
            .find(|&x| self.is_object(image, x, y))
            .unwrap_or(left)
            .max(left);

        Some(Slice::new(y as i32, left as i32, right as i32))
    }
}

impl SilhouetteExtractor for ThresholdExtractor {
    fn extract(&self, image: &RgbImage) -> SilhouetteSet {
        let rows = match self.row_cap {
            Some(cap) => cap.min(image.height()),
            None => image.height(),
        };

        (0..rows)
            .step_by(self.step as usize)
            .filter_map(|y| self.scan_row(image, y))
            .collect()
    }

    fn threshold(&self) -> u32 {
        self.threshold
    }
}
