//! Multi-strategy text extraction with a deterministic winner.
//!
//! The text-layer strategies are consulted in a fixed order and each output is
//! normalized and scored before being folded into the running best candidate.
//! OCR is consulted last, and only when the best text layer is short.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::CvtextError;
use crate::extraction::content_stream::LopdfRunSource;
use crate::extraction::generic::{GenericEnhanced, GenericStandard};
use crate::extraction::geometric::{CharacterReconstruction, LayoutReconstruction};
use crate::extraction::ocr::{DisabledOcr, OcrEngine};
use crate::extraction::{guard_panics, RunSource, SourceDocument, TextStrategy};
use crate::model::{ExtractionCandidate, ExtractionMethod};
use crate::text::{normalize, quality};
use crate::trace::{ExtractionTrace, StrategyAttempt};

const BUDGET_EXHAUSTED: &str = "time budget exhausted";

/// Maps normalized text to a non-negative quality score.
pub type Scorer = fn(&str) -> f64;

/// The text-layer strategies in fold order.
pub fn default_strategies() -> Vec<Box<dyn TextStrategy>> {
    vec![
        Box::new(GenericEnhanced),
        Box::new(GenericStandard),
        Box::new(LayoutReconstruction),
        Box::new(CharacterReconstruction),
    ]
}

pub struct Orchestrator {
    strategies: Vec<Box<dyn TextStrategy>>,
    run_source: Box<dyn RunSource>,
    ocr: Box<dyn OcrEngine>,
    scorer: Scorer,
    config: ExtractionConfig,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl Orchestrator {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            strategies: default_strategies(),
            run_source: Box::new(LopdfRunSource::new()),
            ocr: Box::new(DisabledOcr),
            scorer: quality::score,
            config,
        }
    }

    /// Replace the text-layer strategies. Order is fold order.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn TextStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_run_source(mut self, run_source: Box<dyn RunSource>) -> Self {
        self.run_source = run_source;
        self
    }

    pub fn with_ocr(mut self, ocr: Box<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract the best text from a PDF buffer.
    ///
    /// Fails with [`CvtextError::InsufficientText`] when even the winner is
    /// shorter than `min_chars`. Strategy failures never fail the call.
    pub fn extract(&self, pdf_bytes: &[u8]) -> Result<ExtractionCandidate, CvtextError> {
        self.extract_traced(pdf_bytes).0
    }

    /// Like [`extract`](Self::extract), also returning what every strategy did.
    pub fn extract_traced(
        &self,
        pdf_bytes: &[u8],
    ) -> (Result<ExtractionCandidate, CvtextError>, ExtractionTrace) {
        let started = Instant::now();
        let mut trace = ExtractionTrace::default();
        let doc = SourceDocument::new(pdf_bytes, self.run_source.as_ref());

        let run = |strategy: &dyn TextStrategy| {
            guard_panics(strategy.method(), || strategy.extract(&doc))
        };
        let budget = Duration::from_secs(self.config.time_budget_secs);
        let outputs: Vec<Option<Result<String, CvtextError>>> = if self.config.parallel {
            self.strategies.par_iter().map(|s| Some(run(s.as_ref()))).collect()
        } else {
            // The first strategy always runs
            self.strategies
                .iter()
                .enumerate()
                .map(|(position, s)| {
                    (position == 0 || started.elapsed() < budget).then(|| run(s.as_ref()))
                })
                .collect()
        };

        let mut best = ExtractionCandidate::none();
        for (position, (strategy, output)) in self.strategies.iter().zip(outputs).enumerate() {
            let method = strategy.method();
            let raw = match output {
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    warn!(method = %method, error = %e, "extraction strategy failed");
                    trace.push(StrategyAttempt::failed(method, e.to_string()));
                    continue;
                }
                None => {
                    warn!(
                        method = %method,
                        budget_secs = self.config.time_budget_secs,
                        "time budget spent, skipping strategy"
                    );
                    trace.push(StrategyAttempt::skipped(method, BUDGET_EXHAUSTED));
                    continue;
                }
            };

            let candidate = self.candidate(method, &raw, 1.0);
            let retained = if position == 0 {
                supersedes_first(&candidate, &best)
            } else {
                candidate.confidence > best.confidence
            };

            debug!(
                method = %method,
                chars = candidate.char_count(),
                score = candidate.confidence,
                retained,
                "strategy produced candidate"
            );
            trace.push(StrategyAttempt::produced(
                method,
                candidate.char_count(),
                candidate.confidence,
                retained,
            ));
            if retained {
                best = candidate;
            }
        }

        self.consult_ocr(pdf_bytes, started, &mut best, &mut trace);

        trace.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let chars = best.char_count();
        if best.is_none() || chars < self.config.min_chars {
            warn!(
                chars,
                min_chars = self.config.min_chars,
                best = %best.method,
                "no strategy produced enough text"
            );
            return (Err(CvtextError::InsufficientText { chars }), trace);
        }

        info!(
            method = %best.method,
            chars,
            score = best.confidence,
            elapsed_ms = trace.elapsed_ms,
            "selected extraction"
        );
        trace.winner = best.method;
        (Ok(best), trace)
    }

    fn candidate(&self, method: ExtractionMethod, raw: &str, weight: f64) -> ExtractionCandidate {
        let text = normalize(raw);
        let score = (self.scorer)(&text).max(0.0) * weight;
        ExtractionCandidate {
            text,
            confidence: score,
            method,
        }
    }

    fn consult_ocr(
        &self,
        pdf_bytes: &[u8],
        started: Instant,
        best: &mut ExtractionCandidate,
        trace: &mut ExtractionTrace,
    ) {
        let method = ExtractionMethod::Ocr;
        let best_chars = best.char_count();

        if best_chars >= self.config.ocr_threshold_chars {
            trace.push(StrategyAttempt::skipped(method, "text layer is long enough"));
            return;
        }
        if started.elapsed() >= Duration::from_secs(self.config.time_budget_secs) {
            warn!(budget_secs = self.config.time_budget_secs, "time budget spent, skipping OCR");
            trace.push(StrategyAttempt::skipped(method, BUDGET_EXHAUSTED));
            return;
        }

        match guard_panics(method, || self.ocr.recognize(pdf_bytes)) {
            Ok(raw) => {
                let candidate = self.candidate(method, &raw, self.config.ocr_penalty);
                let retained =
                    candidate.char_count() > best_chars && candidate.confidence > best.confidence;
                debug!(
                    engine = self.ocr.engine_name(),
                    chars = candidate.char_count(),
                    score = candidate.confidence,
                    retained,
                    "OCR produced candidate"
                );
                trace.push(StrategyAttempt::produced(
                    method,
                    candidate.char_count(),
                    candidate.confidence,
                    retained,
                ));
                if retained {
                    *best = candidate;
                }
            }
            Err(CvtextError::OcrUnavailable) => {
                debug!(engine = self.ocr.engine_name(), "OCR not available");
                trace.push(StrategyAttempt::skipped(
                    method,
                    CvtextError::OcrUnavailable.to_string(),
                ));
            }
            Err(e) => {
                warn!(engine = self.ocr.engine_name(), error = %e, "OCR failed");
                trace.push(StrategyAttempt::failed(method, e.to_string()));
            }
        }
    }
}

/// The first strategy wins on length first, then on score.
fn supersedes_first(candidate: &ExtractionCandidate, best: &ExtractionCandidate) -> bool {
    candidate.char_count() > best.char_count() || candidate.confidence > best.confidence
}
