pub mod content_stream;
pub mod generic;
pub mod geometric;
pub mod ocr;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use crate::error::CvtextError;
use crate::model::{ExtractionMethod, PositionedTextRun};

/// Positioned text runs, one vector per page.
pub type PageRuns = Vec<Vec<PositionedTextRun>>;

/// Trait for text extraction strategies run by the orchestrator.
pub trait TextStrategy: Send + Sync {
    /// Tag recorded on candidates produced by this strategy.
    fn method(&self) -> ExtractionMethod;

    /// Extract raw (un-normalized) text from the document.
    fn extract(&self, doc: &SourceDocument<'_>) -> Result<String, CvtextError>;
}

/// Trait for backends that decode per-page positioned text runs.
pub trait RunSource: Send + Sync {
    fn page_runs(&self, pdf_bytes: &[u8]) -> Result<PageRuns, CvtextError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// The immutable input shared by every strategy of one extraction.
///
/// Positioned runs are decoded at most once, on first request, and shared
/// by all geometric strategies, including when they run on different threads.
pub struct SourceDocument<'a> {
    bytes: &'a [u8],
    run_source: &'a dyn RunSource,
    runs: OnceLock<Result<PageRuns, String>>,
}

impl<'a> SourceDocument<'a> {
    pub fn new(bytes: &'a [u8], run_source: &'a dyn RunSource) -> Self {
        Self {
            bytes,
            run_source,
            runs: OnceLock::new(),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Positioned runs per page, decoded lazily.
    pub fn page_runs(&self) -> Result<&PageRuns, CvtextError> {
        let decoded = self.runs.get_or_init(|| {
            let source = self.run_source;
            let bytes = self.bytes;
            match catch_unwind(AssertUnwindSafe(|| source.page_runs(bytes))) {
                Ok(Ok(runs)) => {
                    tracing::debug!(
                        backend = source.backend_name(),
                        pages = runs.len(),
                        runs = runs.iter().map(Vec::len).sum::<usize>(),
                        "decoded positioned text runs"
                    );
                    Ok(runs)
                }
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("{} panicked while decoding runs", source.backend_name())),
            }
        });
        decoded.as_ref().map_err(|e| CvtextError::Pdf(e.clone()))
    }
}

/// Run `f`, turning a panic inside a PDF library into a strategy error.
///
/// Text-layer decoders are known to panic on malformed input.
pub(crate) fn guard_panics<T>(
    method: ExtractionMethod,
    f: impl FnOnce() -> Result<T, CvtextError>,
) -> Result<T, CvtextError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or(Err(CvtextError::StrategyPanicked(method)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl RunSource for CountingSource {
        fn page_runs(&self, _pdf_bytes: &[u8]) -> Result<PageRuns, CvtextError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![vec![PositionedTextRun::new(0.0, 0.0, "x", 10.0)]])
        }

        fn backend_name(&self) -> &str {
            "counting"
        }
    }

    struct PanickingSource;

    impl RunSource for PanickingSource {
        fn page_runs(&self, _pdf_bytes: &[u8]) -> Result<PageRuns, CvtextError> {
            panic!("corrupt xref");
        }

        fn backend_name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_runs_decoded_once() {
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let doc = SourceDocument::new(b"%PDF", &source);
        assert_eq!(doc.page_runs().unwrap().len(), 1);
        assert_eq!(doc.page_runs().unwrap().len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decoder_panic_becomes_error() {
        let doc = SourceDocument::new(b"%PDF", &PanickingSource);
        let err = doc.page_runs().unwrap_err();
        assert!(matches!(err, CvtextError::Pdf(ref m) if m.contains("panicking")));
    }

    #[test]
    fn test_guard_panics() {
        let r: Result<(), _> = guard_panics(ExtractionMethod::GenericStandard, || panic!("boom"));
        assert!(matches!(
            r,
            Err(CvtextError::StrategyPanicked(ExtractionMethod::GenericStandard))
        ));
        let ok = guard_panics(ExtractionMethod::GenericStandard, || Ok(7));
        assert_eq!(ok.unwrap(), 7);
    }
}
