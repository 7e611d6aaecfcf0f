use serde::{Deserialize, Serialize};

use crate::model::ExtractionMethod;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Produced non-empty normalized text.
    Produced,
    /// Ran cleanly but nothing survived normalization.
    Empty,
    /// Returned an error or panicked.
    Failed,
    /// Not run (OCR above threshold, budget exhausted).
    Skipped,
}

/// Outcome of one strategy within one extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub method: ExtractionMethod,
    pub status: AttemptStatus,
    pub chars: usize,
    pub score: f64,
    /// Whether this attempt became the best candidate when it was folded.
    pub retained: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StrategyAttempt {
    pub fn produced(method: ExtractionMethod, chars: usize, score: f64, retained: bool) -> Self {
        Self {
            method,
            status: if chars == 0 {
                AttemptStatus::Empty
            } else {
                AttemptStatus::Produced
            },
            chars,
            score,
            retained,
            detail: None,
        }
    }

    pub fn failed(method: ExtractionMethod, reason: impl Into<String>) -> Self {
        Self {
            method,
            status: AttemptStatus::Failed,
            chars: 0,
            score: 0.0,
            retained: false,
            detail: Some(reason.into()),
        }
    }

    pub fn skipped(method: ExtractionMethod, reason: impl Into<String>) -> Self {
        Self {
            status: AttemptStatus::Skipped,
            ..Self::failed(method, reason)
        }
    }
}

/// Ordered record of every strategy consulted during one extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub trace_schema_version: String,
    pub attempts: Vec<StrategyAttempt>,
    pub winner: ExtractionMethod,
    pub elapsed_ms: u64,
}

impl Default for ExtractionTrace {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            attempts: Vec::new(),
            winner: ExtractionMethod::None,
            elapsed_ms: 0,
        }
    }
}

impl ExtractionTrace {
    pub fn push(&mut self, attempt: StrategyAttempt) {
        self.attempts.push(attempt);
    }

    pub fn attempt(&self, method: ExtractionMethod) -> Option<&StrategyAttempt> {
        self.attempts.iter().find(|a| a.method == method)
    }
}
