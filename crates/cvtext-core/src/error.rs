use std::path::PathBuf;

use crate::model::ExtractionMethod;

#[derive(Debug, thiserror::Error)]
pub enum CvtextError {
    #[error("extracted only {chars} characters of text; the PDF may be image-only or corrupted")]
    InsufficientText { chars: usize },

    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    #[error("{method} extraction failed: {reason}")]
    Strategy {
        method: ExtractionMethod,
        reason: String,
    },

    #[error("{0} extraction panicked on a malformed PDF")]
    StrategyPanicked(ExtractionMethod),

    #[error("OCR is not available: no PDF rasterizer is configured")]
    OcrUnavailable,

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for CvtextError {
    fn from(e: lopdf::Error) -> Self {
        CvtextError::Pdf(e.to_string())
    }
}
