//! Reading-order reconstruction from positioned text.
//!
//! PDF content streams emit text in drawing order, which for many producers
//! has little to do with reading order. Both reconstructors here put items
//! back into top-to-bottom, left-to-right order from their page coordinates:
//!
//! - [`layout`] works on whole text runs and re-inserts word gaps between runs.
//! - [`characters`] explodes runs into single glyphs first, for producers whose
//!   run boundaries do not line up with word boundaries.

pub mod characters;
pub mod layout;

use crate::model::{Positioned, LINE_TOLERANCE};

/// Group items into lines in reading order.
///
/// 1. Sort by descending `y` (PDF origin is bottom-left), then ascending `x`.
/// 2. Start a new line whenever an item's `y` is more than [`LINE_TOLERANCE`]
///    away from the `y` of the item that opened the current line.
/// 3. Re-sort every line by `x`, so baseline jitter inside the tolerance
///    cannot scramble left-to-right order.
pub fn reading_order<T: Positioned>(mut items: Vec<T>) -> Vec<Vec<T>> {
    items.sort_by(|a, b| b.y().total_cmp(&a.y()).then(a.x().total_cmp(&b.x())));

    let mut lines: Vec<Vec<T>> = Vec::new();
    let mut anchor_y = f32::NAN;

    for item in items {
        let same_line = !lines.is_empty() && (item.y() - anchor_y).abs() <= LINE_TOLERANCE;
        if same_line {
            if let Some(line) = lines.last_mut() {
                line.push(item);
            }
        } else {
            anchor_y = item.y();
            lines.push(vec![item]);
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x().total_cmp(&b.x()));
    }

    lines
}

/// Join per-page texts, dropping pages that produced nothing.
pub(crate) fn join_pages(pages: impl IntoIterator<Item = String>) -> String {
    pages
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
