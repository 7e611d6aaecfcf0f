use std::path::PathBuf;

use cvtext_core::error::CvtextError;

use crate::commands::load_config;
use crate::output;

pub fn run(
    pdf_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    photos: bool,
) -> Result<(), CvtextError> {
    let mut config = load_config(config_file)?;
    config.images.enabled = photos;

    let pdf_bytes = std::fs::read(&pdf_file)?;
    let extraction = cvtext_core::extract_resume(&pdf_bytes, &config)?;

    let output_str = match output_format {
        "json" => output::json::to_string(&extraction)?,
        _ => extraction.text.clone(),
    };

    match output_file {
        Some(path) => {
            std::fs::write(&path, &output_str)?;
            eprintln!(
                "Extracted {} characters via {}, written to {}",
                extraction.text.chars().count(),
                extraction.method,
                path.display()
            );
        }
        None => println!("{output_str}"),
    }

    if photos {
        if extraction.images.is_empty() {
            eprintln!("  no embedded photos saved");
        }
        for url in &extraction.images {
            eprintln!("  photo: {url}");
        }
    }

    Ok(())
}
