//! Integration tests for the extraction pipeline end-to-end.
//!
//! Mock strategies, run sources and OCR engines pin down the orchestration
//! rules; small PDFs built in memory with lopdf exercise the real decoders.

use cvtext_core::config::{ExtractionConfig, ImageConfig};
use cvtext_core::error::CvtextError;
use cvtext_core::extraction::geometric::{CharacterReconstruction, LayoutReconstruction};
use cvtext_core::extraction::ocr::OcrEngine;
use cvtext_core::extraction::{PageRuns, RunSource, SourceDocument, TextStrategy};
use cvtext_core::model::{ExtractionMethod, PositionedTextRun};
use cvtext_core::orchestrator::Orchestrator;
use cvtext_core::trace::AttemptStatus;
use cvtext_core::{extract_resume, extract_resume_with, extract_text, text};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

struct MockStrategy {
    method: ExtractionMethod,
    text: String,
}

impl TextStrategy for MockStrategy {
    fn method(&self) -> ExtractionMethod {
        self.method
    }

    fn extract(&self, _doc: &SourceDocument<'_>) -> Result<String, CvtextError> {
        Ok(self.text.clone())
    }
}

struct MockRunSource {
    pages: PageRuns,
}

impl RunSource for MockRunSource {
    fn page_runs(&self, _pdf_bytes: &[u8]) -> Result<PageRuns, CvtextError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct MockOcr {
    text: String,
}

impl OcrEngine for MockOcr {
    fn recognize(&self, _pdf_bytes: &[u8]) -> Result<String, CvtextError> {
        Ok(self.text.clone())
    }

    fn engine_name(&self) -> &str {
        "mock"
    }
}

fn mock(method: ExtractionMethod, text: &str) -> Box<dyn TextStrategy> {
    Box::new(MockStrategy {
        method,
        text: text.to_string(),
    })
}

const RESUME_LINES: &[&str] = &[
    "Jane Doe",
    "Senior Software Engineer",
    "jane.doe@example.com | (555) 123-4567",
    "Summary",
    "Backend developer with eight years of experience building payment systems.",
    "Experience",
    "Acme Corp, Lead Engineer, 2019 to present.",
    "Owned the settlement pipeline and mentored four developers.",
    "Responsibilities included capacity planning and incident reviews.",
    "Designed a reconciliation service that processes two million events daily.",
    "Education",
    "Bachelor of Science in Computer Science, State University.",
    "Skills",
    "Rust, Go, Postgres, Kafka, Kubernetes, distributed systems design.",
    "Certifications",
    "Certified Kubernetes Administrator, issued 2021.",
    "Languages",
    "English, Swedish",
];

/// One run per line, top to bottom.
fn resume_runs() -> PageRuns {
    vec![RESUME_LINES
        .iter()
        .enumerate()
        .map(|(i, line)| PositionedTextRun::new(72.0, 720.0 - 14.0 * i as f32, *line, 10.0))
        .collect()]
}

// ---------------------------------------------------------------------------
// PDF fixtures
// ---------------------------------------------------------------------------

fn text_ops(lines: &[&str]) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for line in lines {
        ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        ops.push(Operation::new("T*", vec![]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

/// A single-page PDF with the given lines, plus optional raw image streams.
fn build_pdf(lines: &[&str], images: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = lopdf::Dictionary::new();
    for (i, data) in images.iter().enumerate() {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 64,
                "Height" => 64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            data.clone(),
        ));
        xobjects.set(format!("Im{i}"), image_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => xobjects,
    });
    let content = Content {
        operations: text_ops(lines),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A JPEG-shaped span of exactly `size` bytes.
fn fake_jpeg(size: usize) -> Vec<u8> {
    let mut v = vec![0xFF, 0xD8, 0xFF, 0xE0];
    v.resize(size - 2, 0x5A);
    v.extend_from_slice(&[0xFF, 0xD9]);
    v
}

// ---------------------------------------------------------------------------
// Test 1: Weak generic text loses to a rich layout reconstruction
// ---------------------------------------------------------------------------
#[test]
fn layout_beats_short_generic_text() {
    let generic = "Name: John Doe\nSkills: Python";

    let orchestrator = Orchestrator::default()
        .with_strategies(vec![
            mock(ExtractionMethod::GenericEnhanced, generic),
            mock(ExtractionMethod::GenericStandard, generic),
            Box::new(LayoutReconstruction),
            Box::new(CharacterReconstruction),
        ])
        .with_run_source(Box::new(MockRunSource {
            pages: resume_runs(),
        }));

    let (result, trace) = orchestrator.extract_traced(b"%PDF-1.4");
    let best = result.unwrap();

    assert!(best.char_count() > 600);
    assert_eq!(best.method, ExtractionMethod::LayoutReconstruction);
    assert_eq!(best.text, RESUME_LINES.join("\n"));

    // Character reconstruction produced the same text and tied
    let chars = trace.attempt(ExtractionMethod::CharacterReconstruction).unwrap();
    assert!(!chars.retained);
    assert_eq!(chars.score, best.confidence);
    assert_eq!(trace.winner, ExtractionMethod::LayoutReconstruction);
}

// ---------------------------------------------------------------------------
// Test 2: Winner is chosen by score in fixed order
// ---------------------------------------------------------------------------
#[test]
fn retain_if_better_is_deterministic() {
    fn by_length(text: &str) -> f64 {
        text.chars().count() as f64
    }
    let strategies = || -> Vec<Box<dyn TextStrategy>> {
        vec![
            mock(ExtractionMethod::GenericEnhanced, &"e".repeat(50)),
            mock(ExtractionMethod::GenericStandard, &"s".repeat(200)),
            mock(ExtractionMethod::LayoutReconstruction, &"l".repeat(150)),
            mock(ExtractionMethod::CharacterReconstruction, &"c".repeat(300)),
        ]
    };

    for parallel in [true, false] {
        let config = ExtractionConfig {
            parallel,
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(config)
            .with_strategies(strategies())
            .with_scorer(by_length);
        let (result, trace) = orchestrator.extract_traced(b"");
        let best = result.unwrap();
        assert_eq!(best.method, ExtractionMethod::CharacterReconstruction);
        assert_eq!(best.confidence, 300.0);

        let retained: Vec<bool> = trace.attempts.iter().take(4).map(|a| a.retained).collect();
        assert_eq!(retained, vec![true, true, false, true]);
    }
}

// ---------------------------------------------------------------------------
// Test 3: Short winners are rejected
// ---------------------------------------------------------------------------
#[test]
fn insufficient_text_is_an_error() {
    let orchestrator = Orchestrator::default().with_strategies(vec![
        mock(ExtractionMethod::GenericEnhanced, "Jane Doe"),
        mock(ExtractionMethod::GenericStandard, "Jane Doe, Engineer"),
    ]);
    match orchestrator.extract(b"") {
        Err(CvtextError::InsufficientText { chars }) => assert!(chars < 100),
        other => panic!("expected InsufficientText, got {other:?}"),
    }
}

#[test]
fn garbage_input_is_insufficient_text() {
    let err = extract_text(b"this is not a pdf at all").unwrap_err();
    assert!(matches!(err, CvtextError::InsufficientText { chars: 0 }));
    assert!(err.to_string().contains("image-only or corrupted"));
}

// ---------------------------------------------------------------------------
// Test 4: OCR fallback for image-only documents
// ---------------------------------------------------------------------------
#[test]
fn ocr_rescues_image_only_resume() {
    let orchestrator = Orchestrator::default()
        .with_strategies(vec![mock(ExtractionMethod::GenericStandard, "Page 1")])
        .with_ocr(Box::new(MockOcr {
            text: RESUME_LINES.join("\n"),
        }));

    let best = orchestrator.extract(b"").unwrap();
    assert_eq!(best.method, ExtractionMethod::Ocr);
    let unpenalized = text::score(&text::normalize(&RESUME_LINES.join("\n")));
    assert!((best.confidence - unpenalized * 0.8).abs() < 1e-9);
}

#[test]
fn ocr_not_consulted_for_rich_text_layer() {
    let orchestrator = Orchestrator::default()
        .with_strategies(vec![mock(
            ExtractionMethod::GenericStandard,
            &RESUME_LINES.join("\n"),
        )])
        .with_ocr(Box::new(MockOcr {
            text: RESUME_LINES.join("\n").repeat(3),
        }));

    let (result, trace) = orchestrator.extract_traced(b"");
    assert_eq!(result.unwrap().method, ExtractionMethod::GenericStandard);
    assert_eq!(
        trace.attempt(ExtractionMethod::Ocr).unwrap().status,
        AttemptStatus::Skipped
    );
}

// ---------------------------------------------------------------------------
// Test 5: Real decoders on an in-memory PDF
// ---------------------------------------------------------------------------
#[test]
fn extracts_text_from_generated_pdf() {
    let pdf = build_pdf(RESUME_LINES, &[]);
    let best = extract_text(&pdf).unwrap();
    assert!(best.text.contains("Experience"));
    assert!(best.text.contains("Education"));
    assert!(best.char_count() >= 100);
}

#[test]
fn generated_pdf_layout_reconstruction_is_clean() {
    let pdf = build_pdf(RESUME_LINES, &[]);
    let orchestrator =
        Orchestrator::default().with_strategies(vec![Box::new(LayoutReconstruction)]);
    let best = orchestrator.extract(&pdf).unwrap();
    assert_eq!(best.method, ExtractionMethod::LayoutReconstruction);
    assert_eq!(best.text, RESUME_LINES.join("\n"));
}

#[test]
fn generated_pdf_with_too_little_text() {
    let pdf = build_pdf(&["Scanned resume"], &[]);
    assert!(matches!(
        extract_text(&pdf),
        Err(CvtextError::InsufficientText { .. })
    ));
}

// ---------------------------------------------------------------------------
// Test 6: Embedded images alongside text
// ---------------------------------------------------------------------------
#[test]
fn extract_resume_saves_photos() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = build_pdf(RESUME_LINES, &[fake_jpeg(1024), fake_jpeg(5 * 1024)]);
    let config = ExtractionConfig {
        images: ImageConfig {
            upload_dir: dir.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };

    let result = extract_resume(&pdf, &config).unwrap();
    assert!(result.text.contains("Skills"));
    assert_eq!(result.images.len(), 1);
    assert!(result.images[0].starts_with("/uploads/resume-photo-"));
    assert!(result.images[0].ends_with("-0.jpg"));

    let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(saved.len(), 1);
    let bytes = std::fs::read(saved[0].as_ref().unwrap().path()).unwrap();
    assert_eq!(bytes.len(), 5 * 1024);
}

#[test]
fn extract_resume_with_images_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = build_pdf(RESUME_LINES, &[fake_jpeg(5 * 1024)]);
    let config = ExtractionConfig {
        images: ImageConfig {
            enabled: false,
            upload_dir: dir.path().join("uploads"),
            ..Default::default()
        },
        ..Default::default()
    };

    let result = extract_resume(&pdf, &config).unwrap();
    assert!(result.images.is_empty());
    assert!(!dir.path().join("uploads").exists());
}

#[test]
fn extract_resume_propagates_text_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExtractionConfig {
        images: ImageConfig {
            upload_dir: dir.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(config)
        .with_strategies(vec![mock(ExtractionMethod::GenericStandard, "")]);
    assert!(extract_resume_with(&orchestrator, b"%PDF-1.4").is_err());

    // A photo in a rejected upload is found but never written
    let pdf = build_pdf(&["Scanned resume"], &[fake_jpeg(5 * 1024)]);
    let err = extract_resume_with(&orchestrator, &pdf).unwrap_err();
    assert!(matches!(err, CvtextError::InsufficientText { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
