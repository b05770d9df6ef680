use thiserror::Error;

/// Closed set of failures the classification pipeline can produce.
///
/// Every stage maps its library errors into one of these variants; the web
/// boundary decides which variants are the client's fault and which are ours.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input bytes could not be decoded as DICOM or as a raster image.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The declared filename does not carry a supported extension.
    #[error("unsupported file type: {0}")]
    UnsupportedMedia(String),

    /// The decoded image cannot be shaped into the model input tensor.
    #[error("preprocess failed: {0}")]
    Preprocess(String),

    /// The model invocation itself failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model artifact could not be loaded at startup.
    #[error("model artifact unavailable: {0}")]
    ArtifactLoad(String),

    /// Scratch file handling failed.
    #[error("i/o failure: {0}")]
    Io(String),
}
