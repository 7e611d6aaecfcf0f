use std::path::PathBuf;

use cvtext_core::error::CvtextError;
use cvtext_core::images;
use cvtext_core::orchestrator::Orchestrator;

use crate::commands::load_config;
use crate::output;

pub fn run(pdf_file: PathBuf, config_file: Option<PathBuf>) -> Result<(), CvtextError> {
    let config = load_config(config_file)?;
    let pdf_bytes = std::fs::read(&pdf_file)?;

    let orchestrator = Orchestrator::new(config);
    let (result, trace) = orchestrator.extract_traced(&pdf_bytes);

    println!("=== {} ===\n", pdf_file.display());
    output::table::print_trace(&trace, &result);

    let image_config = &orchestrator.config().images;
    let candidates =
        images::find_candidates_within(&pdf_bytes, image_config.min_bytes, image_config.max_bytes);
    println!("  Embedded images: {}", candidates.len());

    Ok(())
}
