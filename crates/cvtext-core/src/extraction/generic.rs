//! Text-layer extraction through `pdf-extract`.
//!
//! Two strategies share the same decoder: the stock plain-text output, and a
//! custom [`OutputDev`] that glues glyphs together and only breaks on a
//! baseline change. The custom device recovers text from producers whose word
//! and line hints make the stock output insert separators mid-word.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};

use crate::error::CvtextError;
use crate::extraction::{SourceDocument, TextStrategy};
use crate::model::{ExtractionMethod, LINE_TOLERANCE};

/// pdf-extract with its default plain-text output.
pub struct GenericStandard;

impl TextStrategy for GenericStandard {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::GenericStandard
    }

    fn extract(&self, doc: &SourceDocument<'_>) -> Result<String, CvtextError> {
        pdf_extract::extract_text_from_mem(doc.bytes()).map_err(|e| CvtextError::Strategy {
            method: self.method(),
            reason: e.to_string(),
        })
    }
}

/// pdf-extract driven through [`BaselineJoinOutput`].
pub struct GenericEnhanced;

impl TextStrategy for GenericEnhanced {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::GenericEnhanced
    }

    fn extract(&self, doc: &SourceDocument<'_>) -> Result<String, CvtextError> {
        let pdf = pdf_extract::Document::load_mem(doc.bytes())
            .map_err(|e| CvtextError::Pdf(e.to_string()))?;

        let mut output = BaselineJoinOutput::default();
        pdf_extract::output_doc(&pdf, &mut output).map_err(|e| CvtextError::Strategy {
            method: self.method(),
            reason: e.to_string(),
        })?;

        Ok(output.into_text())
    }
}

/// Output device that concatenates glyphs in content-stream order.
///
/// No separator is inserted between glyphs unless the baseline moves, in
/// which case a newline is emitted. Pages are separated by a blank line.
#[derive(Debug, Default)]
pub struct BaselineJoinOutput {
    text: String,
    last_y: Option<f64>,
}

impl BaselineJoinOutput {
    pub fn into_text(self) -> String {
        self.text
    }

    fn push_glyph(&mut self, y: f64, glyph: &str) {
        if let Some(last) = self.last_y {
            if (y - last).abs() > f64::from(LINE_TOLERANCE) {
                self.text.push('\n');
            }
        }
        self.text.push_str(glyph);
        self.last_y = Some(y);
    }
}

impl OutputDev for BaselineJoinOutput {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.last_y = None;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        _width: f64,
        _spacing: f64,
        _font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        self.push_glyph(trm.m32, char);
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
