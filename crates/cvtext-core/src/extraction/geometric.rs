//! Strategies that rebuild text from positioned runs instead of trusting
//! the decoder's own text output.

use crate::error::CvtextError;
use crate::extraction::{SourceDocument, TextStrategy};
use crate::model::ExtractionMethod;
use crate::reconstruct::{characters, layout};

/// Run-level reading-order reconstruction.
pub struct LayoutReconstruction;

impl TextStrategy for LayoutReconstruction {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::LayoutReconstruction
    }

    fn extract(&self, doc: &SourceDocument<'_>) -> Result<String, CvtextError> {
        Ok(layout::reconstruct(doc.page_runs()?))
    }
}

/// Glyph-level reconstruction.
pub struct CharacterReconstruction;

impl TextStrategy for CharacterReconstruction {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::CharacterReconstruction
    }

    fn extract(&self, doc: &SourceDocument<'_>) -> Result<String, CvtextError> {
        Ok(characters::reconstruct(doc.page_runs()?))
    }
}
