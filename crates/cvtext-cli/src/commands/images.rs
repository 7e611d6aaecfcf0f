use std::path::PathBuf;

use cvtext_core::config::ImageConfig;
use cvtext_core::error::CvtextError;
use cvtext_core::images;

use crate::output;

pub fn run(pdf_file: PathBuf, max: usize, dir: Option<PathBuf>) -> Result<(), CvtextError> {
    let pdf_bytes = std::fs::read(&pdf_file)?;

    let mut config = ImageConfig::default();
    if let Some(dir) = dir {
        config.upload_dir = dir;
    }

    let candidates = images::find_candidates_within(&pdf_bytes, config.min_bytes, config.max_bytes);
    output::table::print_images(&candidates);

    if max == 0 || candidates.is_empty() {
        return Ok(());
    }

    let urls = images::extract_gallery(&pdf_bytes, &config, max);
    if urls.is_empty() {
        eprintln!("  no images could be saved to {}", config.upload_dir.display());
    }
    for url in &urls {
        println!("  saved: {url}");
    }

    Ok(())
}
