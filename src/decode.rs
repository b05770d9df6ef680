use std::path::Path;

use dicom::object::open_file;
use dicom::pixeldata::PixelDecoder;
use dicom_pixeldata::PixelRepresentation;
use ndarray::{ArrayD, Axis};

use crate::error::PipelineError;

/// Pixel matrix extracted from a DICOM file, kept at its native bit depth.
///
/// The array is 2-D for monochrome data (rows, cols) or 3-D for RGB
/// (rows, cols, 3). 8-bit sources are widened losslessly to `u16`.
#[derive(Debug, Clone)]
pub struct PixelGrid {
    pub data: ArrayD<u16>,
}

impl PixelGrid {
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

    pub fn max_sample(&self) -> u16 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

/// Read a DICOM file and extract its first frame as a `PixelGrid`.
///
/// Only the pixel data element is consulted; modality tags are deliberately
/// ignored (the caller's file extension decides that this is a DICOM path).
pub fn read_pixel_grid(path: &Path) -> Result<PixelGrid, PipelineError> {
    let obj = open_file(path)
        .map_err(|e| PipelineError::Decode(format!("Falha ao abrir arquivo DICOM: {e}")))?;
    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| PipelineError::Decode(format!("failed to decode pixel data: {e}")))?;

    let bits_allocated = decoded.bits_allocated();
    let array = if decoded.pixel_representation() == PixelRepresentation::Unsigned {
        if bits_allocated <= 8 {
            decoded
                .to_ndarray::<u8>()
                .map_err(|e| PipelineError::Decode(e.to_string()))?
                .mapv(u16::from)
        } else if bits_allocated <= 16 {
            decoded
                .to_ndarray::<u16>()
                .map_err(|e| PipelineError::Decode(e.to_string()))?
        } else {
            return Err(PipelineError::Decode(format!(
                "unsupported bit depth: {bits_allocated}"
            )));
        }
    } else {
        // Signed stored values: negative samples clamp to zero before rescale,
        // consistent with the normalizer's implicit minimum of 0.
        decoded
            .to_ndarray::<i32>()
            .map_err(|e| PipelineError::Decode(e.to_string()))?
            .mapv(|v| v.clamp(0, i32::from(u16::MAX)) as u16)
    };

    first_frame_grid(array.into_dyn())
}

fn first_frame_grid(array: ArrayD<u16>) -> Result<PixelGrid, PipelineError> {
    // dicom-pixeldata yields [frames, rows, cols, samples]; a single-label
    // classifier only ever looks at frame 0.
    if array.ndim() != 4 {
        return Err(PipelineError::Decode(format!(
            "unexpected pixel array shape: {:?}",
            array.shape()
        )));
    }
    if array.shape()[0] == 0 {
        return Err(PipelineError::Decode("pixel data contains no frames".into()));
    }

    let frame = array.index_axis_move(Axis(0), 0);
    let data = match frame.shape()[2] {
        1 => frame.index_axis_move(Axis(2), 0),
        3 => frame,
        n => {
            return Err(PipelineError::Decode(format!(
                "unsupported samples per pixel: {n}"
            )))
        }
    };

    Ok(PixelGrid { data })
}
