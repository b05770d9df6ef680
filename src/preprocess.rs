//
// preprocess.rs
// Modality-Classifier-rs
//
// Shapes any decoded raster image into the fixed tensor layout the classifier was trained on.
//
// Thales Matheus Mendonça Santos - December 2025

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use crate::error::PipelineError;

/// Spatial resolution the trained artifact expects. An invariant of the
/// model, not negotiable at request time.
pub const MODEL_INPUT_SIZE: u32 = 152;

/// Convert a decoded raster image into the model input tensor.
///
/// Fixed step order: resize to 152x152, harmonize channels to RGB, scale
/// samples to [0.0, 1.0], prepend a single-item batch dimension. Inputs with
/// channel counts other than 1 or 3 are rejected.
pub fn to_model_input(image: &DynamicImage) -> Result<Array4<f32>, PipelineError> {
    let resized = image.resize_exact(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Triangle);

    // Grayscale replicates into all three channels; RGB passes through.
    let rgb = match resized.color().channel_count() {
        1 | 3 => resized.to_rgb8(),
        n => {
            return Err(PipelineError::Preprocess(format!(
                "expected 1 or 3 channels, got {n}"
            )))
        }
    };

    let size = MODEL_INPUT_SIZE as usize;
    let tensor = Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| {
        f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0
    });

    Ok(tensor)
}
