pub mod extract;
pub mod images;
pub mod inspect;
pub mod text;

use std::path::PathBuf;

use cvtext_core::config::ExtractionConfig;
use cvtext_core::error::CvtextError;

/// Settings from `--config`, or the defaults.
pub(crate) fn load_config(path: Option<PathBuf>) -> Result<ExtractionConfig, CvtextError> {
    match path {
        Some(path) => {
            let config = ExtractionConfig::load(&path)?;
            tracing::debug!(path = %path.display(), ?config, "loaded settings");
            Ok(config)
        }
        None => Ok(ExtractionConfig::default()),
    }
}
