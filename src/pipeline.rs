//
// pipeline.rs
// Modality-Classifier-rs
//
// End-to-end classification flow: extension dispatch, DICOM-to-JPEG conversion, preprocessing, and scoring.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use crate::classify::{self, ModalityScorer};
use crate::decode;
use crate::error::PipelineError;
use crate::models::Classification;
use crate::normalize;
use crate::preprocess;
use crate::raster;

/// Which processing path an upload takes, decided by its declared filename.
///
/// The extension alone selects the path: DICOM content claimed as `.jpg`
/// (or vice versa) will fail at decode time, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Dicom,
    Raster,
}

impl UploadKind {
    pub fn from_filename(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        match Path::new(&lowered).extension()?.to_str()? {
            "dcm" => Some(UploadKind::Dicom),
            "jpg" | "jpeg" | "png" => Some(UploadKind::Raster),
            _ => None,
        }
    }
}

/// Classify an uploaded file from its raw bytes and declared filename.
///
/// DICOM uploads pass through decode, 8-bit rescale, and JPEG encoding before
/// joining the raster path; raster uploads are decoded directly. Unsupported
/// extensions are rejected before any decode work or scratch file is done.
pub fn classify_bytes(
    scorer: &dyn ModalityScorer,
    filename: &str,
    bytes: &[u8],
) -> Result<Classification, PipelineError> {
    let kind = UploadKind::from_filename(filename)
        .ok_or_else(|| PipelineError::UnsupportedMedia(filename.to_string()))?;

    // Uploads are identified in the log by content digest, not by the
    // untrusted filename.
    let digest = hex::encode(Sha256::digest(bytes));
    info!(upload = %&digest[..12], ?kind, "received upload");

    let image = match kind {
        UploadKind::Dicom => {
            // The DICOM reader works on files, so the upload lands in a
            // per-request scratch directory: unique per request, removed on
            // success and error alike when the guard drops.
            let scratch =
                tempfile::tempdir().map_err(|e| PipelineError::Io(e.to_string()))?;
            let path = scratch.path().join("upload.dcm");
            fs::write(&path, bytes).map_err(|e| PipelineError::Io(e.to_string()))?;

            let grid = decode::read_pixel_grid(&path)?;
            let normalized = normalize::rescale_to_8bit(&grid);
            let jpeg = raster::encode_jpeg(&normalized)?;
            raster::decode_raster(&jpeg)?
        }
        UploadKind::Raster => raster::decode_raster(bytes)?,
    };

    let tensor = preprocess::to_model_input(&image)?;
    let score = scorer.score(&tensor)?;
    let modality = classify::label_for_score(score);
    info!(score, %modality, "classification complete");

    Ok(Classification { modality, score })
}

/// Classify a file on disk, routing by its filename like an upload.
pub fn classify_file(
    scorer: &dyn ModalityScorer,
    path: &Path,
) -> Result<Classification, PipelineError> {
    let bytes = fs::read(path)
        .map_err(|e| PipelineError::Io(format!("failed to read {path:?}: {e}")))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    classify_bytes(scorer, name, &bytes)
}

/// Convert a DICOM file to an 8-bit JPEG next to it (or at `output`).
pub fn convert_dicom_to_jpeg(
    input: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf, PipelineError> {
    let grid = decode::read_pixel_grid(input)?;
    let normalized = normalize::rescale_to_8bit(&grid);

    let target = output.unwrap_or_else(|| {
        let mut p = input.to_path_buf();
        p.set_extension("jpg");
        p
    });
    raster::save(&normalized, &target)?;
    info!(input = ?input, output = ?target, "DICOM converted to JPEG");

    Ok(target)
}
