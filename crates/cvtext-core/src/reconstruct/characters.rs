use crate::model::{Character, PositionedTextRun};
use crate::reconstruct::{join_pages, reading_order};

/// A horizontal gap wider than this many font-size units is a word break.
pub const CHAR_GAP_FACTOR: f32 = 1.5;

/// Rebuild page text glyph by glyph.
///
/// Every run is exploded into [`Character`]s at the estimated advance, so
/// text is re-flowed purely from glyph positions. This recovers words when
/// a producer emits one run per glyph or splits runs mid-word.
pub fn reconstruct(pages: &[Vec<PositionedTextRun>]) -> String {
    join_pages(pages.iter().map(|runs| reconstruct_page(runs)))
}

pub fn reconstruct_page(runs: &[PositionedTextRun]) -> String {
    let chars: Vec<Character> = runs
        .iter()
        .filter(|r| !r.content.trim().is_empty())
        .flat_map(|r| r.characters())
        .collect();

    let mut lines = Vec::new();
    for line in reading_order(chars) {
        let mut text = String::new();
        let mut last_x: Option<f32> = None;

        for c in &line {
            if let Some(lx) = last_x {
                if c.x - lx > CHAR_GAP_FACTOR * c.font_size {
                    text.push(' ');
                }
            }
            text.push(c.ch);
            last_x = Some(c.x);
        }

        if !text.trim().is_empty() {
            lines.push(text);
        }
    }

    lines.join("\n")
}
