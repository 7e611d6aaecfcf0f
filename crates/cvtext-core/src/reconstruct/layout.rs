use crate::model::PositionedTextRun;
use crate::reconstruct::{join_pages, reading_order};

/// Minimum gap between the estimated end of one run and the start of the
/// next for a word break to be inserted.
pub const RUN_GAP_THRESHOLD: f32 = 0.5;

/// Rebuild page text from positioned runs.
///
/// Lines within a page are joined with `\n`, pages with `\n\n`. Runs whose
/// content is blank are ignored and pages without any text are skipped.
pub fn reconstruct(pages: &[Vec<PositionedTextRun>]) -> String {
    join_pages(pages.iter().map(|runs| reconstruct_page(runs)))
}

/// Rebuild a single page.
pub fn reconstruct_page(runs: &[PositionedTextRun]) -> String {
    let runs: Vec<PositionedTextRun> = runs
        .iter()
        .filter(|r| !r.content.trim().is_empty())
        .cloned()
        .collect();

    reading_order(runs)
        .iter()
        .map(|line| build_line(line))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate the runs of one line, inserting a space where the next run
/// starts clearly past the estimated end of the previous one.
fn build_line(runs: &[PositionedTextRun]) -> String {
    let mut text = String::new();
    let mut prev_end: Option<f32> = None;

    for run in runs {
        if let Some(end) = prev_end {
            if run.x - end > RUN_GAP_THRESHOLD && !text.ends_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&run.content);
        prev_end = Some(run.x + run.estimated_width());
    }

    text
}
