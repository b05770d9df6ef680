use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::ArrayD;

use crate::decode::PixelGrid;
use crate::error::PipelineError;

/// 8-bit image ready for raster encoding. Same shape conventions as
/// `PixelGrid`: 2-D monochrome or 2-D×3 RGB, all samples in [0, 255].
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub data: ArrayD<u8>,
}

impl NormalizedImage {
    pub fn height(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn channels(&self) -> usize {
        if self.data.ndim() == 3 {
            self.data.shape()[2]
        } else {
            1
        }
    }

    /// Repackage the sample array as an `image` buffer for encoding.
    pub fn to_dynamic_image(&self) -> Result<DynamicImage, PipelineError> {
        let width = self.width() as u32;
        let height = self.height() as u32;
        let pixels: Vec<u8> = self.data.iter().copied().collect();

        let image = match self.channels() {
            1 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
            n => {
                return Err(PipelineError::Preprocess(format!(
                    "cannot encode image with {n} channels"
                )))
            }
        };

        image.ok_or_else(|| {
            PipelineError::Preprocess("pixel buffer does not match image dimensions".into())
        })
    }
}

/// Linearly rescale an arbitrary-range grid to unsigned 8-bit.
///
/// `output = round(input / max(input) * 255)`; no windowing or percentile
/// stretch. A grid whose maximum is 0 (an all-black image) maps to the
/// all-zero image of the same shape instead of dividing by zero.
pub fn rescale_to_8bit(grid: &PixelGrid) -> NormalizedImage {
    let max = grid.max_sample();
    let data = if max == 0 {
        grid.data.mapv(|_| 0u8)
    } else {
        let max = f32::from(max);
        grid.data
            .mapv(|v| ((f32::from(v) / max) * 255.0).round() as u8)
    };
    NormalizedImage { data }
}
