use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimated glyph advance per unit of font size.
///
/// Shared by run width estimation, inter-run gap detection and character
/// placement; all three must agree or reconstructed spacing drifts.
pub const CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Maximum vertical distance (in PDF units) for two items to share a line.
pub const LINE_TOLERANCE: f32 = 0.5;

/// One run of characters sharing a baseline position and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedTextRun {
    pub x: f32,
    /// Baseline position, origin at the bottom-left of the page.
    pub y: f32,
    pub content: String,
    pub font_size: f32,
    pub font_name: String,
}

impl PositionedTextRun {
    pub fn new(x: f32, y: f32, content: impl Into<String>, font_size: f32) -> Self {
        Self {
            x,
            y,
            content: content.into(),
            font_size,
            font_name: String::new(),
        }
    }

    /// Estimated horizontal extent of the run.
    pub fn estimated_width(&self) -> f32 {
        self.content.chars().count() as f32 * self.font_size * CHAR_WIDTH_FACTOR
    }

    /// Split the run into characters placed at the estimated advance.
    pub fn characters(&self) -> Vec<Character> {
        let advance = self.font_size * CHAR_WIDTH_FACTOR;
        self.content
            .chars()
            .enumerate()
            .map(|(i, ch)| Character {
                ch,
                x: self.x + i as f32 * advance,
                y: self.y,
                font_size: self.font_size,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Character {
    pub ch: char,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

/// Anything with a page position that can be put into reading order.
pub trait Positioned {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
}

impl Positioned for PositionedTextRun {
    fn x(&self) -> f32 {
        self.x
    }

    fn y(&self) -> f32 {
        self.y
    }
}

impl Positioned for Character {
    fn x(&self) -> f32 {
        self.x
    }

    fn y(&self) -> f32 {
        self.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    GenericEnhanced,
    GenericStandard,
    LayoutReconstruction,
    CharacterReconstruction,
    Ocr,
    None,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::GenericEnhanced => write!(f, "generic-enhanced"),
            ExtractionMethod::GenericStandard => write!(f, "generic-standard"),
            ExtractionMethod::LayoutReconstruction => write!(f, "layout-reconstruction"),
            ExtractionMethod::CharacterReconstruction => write!(f, "character-reconstruction"),
            ExtractionMethod::Ocr => write!(f, "ocr"),
            ExtractionMethod::None => write!(f, "none"),
        }
    }
}

/// One strategy's text plus its quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    pub text: String,
    /// Non-negative quality score.
    pub confidence: f64,
    pub method: ExtractionMethod,
}

impl ExtractionCandidate {
    /// The sentinel every extraction starts from.
    pub fn none() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            method: ExtractionMethod::None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.method == ExtractionMethod::None
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl Default for ExtractionCandidate {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A byte-range hypothesis for an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
    pub format: ImageFormat,
    pub size: usize,
}

impl ImageCandidate {
    pub fn bytes<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.start..self.end]
    }
}
