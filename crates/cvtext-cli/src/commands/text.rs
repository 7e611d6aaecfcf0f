use std::path::Path;

use cvtext_core::error::CvtextError;
use cvtext_core::text;

use crate::output;

pub fn score(text_file: &Path) -> Result<(), CvtextError> {
    let content = std::fs::read_to_string(text_file)?;
    let breakdown = text::assess(&content);
    output::table::print_breakdown(&breakdown);
    Ok(())
}

pub fn normalize(text_file: &Path) -> Result<(), CvtextError> {
    let content = std::fs::read_to_string(text_file)?;
    println!("{}", text::normalize(&content));
    Ok(())
}
