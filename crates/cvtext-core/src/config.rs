//! Extraction settings, loadable from a TOML file.
//!
//! Every field has a default so a partial file (or none at all) is valid:
//!
//! ```toml
//! min_chars = 100
//! parallel = false
//!
//! [images]
//! upload_dir = "/var/www/uploads"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CvtextError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Winners shorter than this many characters are rejected.
    pub min_chars: usize,
    /// OCR is consulted only when the best text is shorter than this.
    pub ocr_threshold_chars: usize,
    /// Multiplier applied to the OCR candidate's score.
    pub ocr_penalty: f64,
    /// Run the text-layer strategies concurrently.
    pub parallel: bool,
    /// Wall-clock budget. Once it is spent OCR is skipped, and so are the
    /// remaining sequential strategies after the first. Parallel runs start
    /// every text-layer strategy at once.
    pub time_budget_secs: u64,
    pub images: ImageConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars: 100,
            ocr_threshold_chars: 500,
            ocr_penalty: 0.8,
            parallel: true,
            time_budget_secs: 60,
            images: ImageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,
    /// Spans must be strictly larger than this to be kept.
    pub min_bytes: usize,
    /// Spans must be strictly smaller than this to be kept.
    pub max_bytes: usize,
    pub upload_dir: PathBuf,
    /// URL prefix prepended to saved filenames.
    pub public_prefix: String,
    pub gallery_max: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_bytes: 2 * 1024,
            max_bytes: 10 * 1024 * 1024,
            upload_dir: PathBuf::from("uploads"),
            public_prefix: "/uploads".to_string(),
            gallery_max: 5,
        }
    }
}

impl ExtractionConfig {
    /// Load settings from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: &Path) -> Result<Self, CvtextError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| CvtextError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            CvtextError::ConfigLoad { reason, .. } => CvtextError::ConfigLoad {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, CvtextError> {
        toml::from_str(content).map_err(|e| CvtextError::ConfigLoad {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }
}
