use std::path::PathBuf;

/// Errors surfaced to the caller of the pipeline.
///
/// The first four variants are configuration problems: they are fatal and
/// happen before any image is classified.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("model file not found: {}", path.display())]
    MissingModel { path: PathBuf },

    #[error("failed to load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("detection mode requested but no detector model is loaded")]
    DetectorNotConfigured,

    #[error("invalid config file {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image decode failed")]
    Decode(#[from] image::ImageError),

    #[error("unexpected model output: expected {expected}, got {got}")]
    UnexpectedOutput { expected: String, got: String },
}

impl PipelineError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingModel { .. }
                | PipelineError::ModelLoad { .. }
                | PipelineError::DetectorNotConfigured
                | PipelineError::Config { .. }
        )
    }
}
