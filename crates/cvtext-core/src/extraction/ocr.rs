use crate::error::CvtextError;

/// Trait for OCR backends consulted when every text-layer strategy is weak.
///
/// An engine receives the raw PDF and is responsible for rasterizing its
/// pages. The returned text is normalized and scored by the orchestrator.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, pdf_bytes: &[u8]) -> Result<String, CvtextError>;

    /// Name of this engine (for diagnostics).
    fn engine_name(&self) -> &str;
}

/// Default engine: no PDF rasterizer is wired, so recognition always fails
/// with [`CvtextError::OcrUnavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOcr;

impl OcrEngine for DisabledOcr {
    fn recognize(&self, _pdf_bytes: &[u8]) -> Result<String, CvtextError> {
        Err(CvtextError::OcrUnavailable)
    }

    fn engine_name(&self) -> &str {
        "disabled"
    }
}
