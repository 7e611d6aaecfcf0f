pub mod config;
pub mod error;
pub mod extraction;
pub mod images;
pub mod model;
pub mod orchestrator;
pub mod reconstruct;
pub mod text;
pub mod trace;

use serde::{Deserialize, Serialize};

use config::ExtractionConfig;
use error::CvtextError;
use model::{ExtractionCandidate, ExtractionMethod};
use orchestrator::Orchestrator;
use trace::ExtractionTrace;

/// Text plus side outputs for one resume PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeExtraction {
    pub text: String,
    pub method: ExtractionMethod,
    pub confidence: f64,
    /// Public URLs of saved embedded images, largest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub trace: ExtractionTrace,
}

/// Main API entry point: extract resume text and embedded photos from a PDF.
///
/// Text extraction and image scanning run concurrently. Images are saved
/// only when `config.images.enabled` is set and text extraction succeeded;
/// a failure to save them never fails the call.
pub fn extract_resume(
    pdf_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ResumeExtraction, CvtextError> {
    extract_resume_with(&Orchestrator::new(config.clone()), pdf_bytes)
}

/// Same as [`extract_resume`] with a caller-assembled orchestrator.
pub fn extract_resume_with(
    orchestrator: &Orchestrator,
    pdf_bytes: &[u8],
) -> Result<ResumeExtraction, CvtextError> {
    let images_config = &orchestrator.config().images;

    let ((result, trace), candidates) = rayon::join(
        || orchestrator.extract_traced(pdf_bytes),
        || {
            if images_config.enabled {
                images::find_candidates_within(
                    pdf_bytes,
                    images_config.min_bytes,
                    images_config.max_bytes,
                )
            } else {
                Vec::new()
            }
        },
    );

    // Rejected uploads must not leave photos behind
    let best = result?;
    let images = images::save_gallery(
        pdf_bytes,
        &candidates,
        images_config,
        images_config.gallery_max,
    );

    Ok(ResumeExtraction {
        text: best.text,
        method: best.method,
        confidence: best.confidence,
        images,
        trace,
    })
}

/// Extract the best text from a PDF with default settings.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<ExtractionCandidate, CvtextError> {
    Orchestrator::default().extract(pdf_bytes)
}
