use cvtext_core::error::CvtextError;
use cvtext_core::model::{ExtractionCandidate, ImageCandidate};
use cvtext_core::text::QualityBreakdown;
use cvtext_core::trace::{AttemptStatus, ExtractionTrace};

pub fn print_trace(trace: &ExtractionTrace, result: &Result<ExtractionCandidate, CvtextError>) {
    let max_name = trace
        .attempts
        .iter()
        .map(|a| a.method.to_string().len())
        .max()
        .unwrap_or(10);

    println!(
        "  {:<width$}  {:<8}  {:>7}  {:>7}",
        "Strategy",
        "Status",
        "Chars",
        "Score",
        width = max_name
    );
    for a in &trace.attempts {
        let status = match a.status {
            AttemptStatus::Produced => "produced",
            AttemptStatus::Empty => "empty",
            AttemptStatus::Failed => "failed",
            AttemptStatus::Skipped => "skipped",
        };
        let marker = if a.retained { " *" } else { "" };
        println!(
            "  {:<width$}  {:<8}  {:>7}  {:>7.3}{}",
            a.method.to_string(),
            status,
            a.chars,
            a.score,
            marker,
            width = max_name
        );
        if let Some(ref detail) = a.detail {
            println!("    {detail}");
        }
    }
    println!();

    match result {
        Ok(best) => println!(
            "  Winner: {} ({} chars, score {:.3}) in {} ms",
            best.method,
            best.char_count(),
            best.confidence,
            trace.elapsed_ms
        ),
        Err(e) => println!("  No winner: {e}"),
    }
}

pub fn print_breakdown(b: &QualityBreakdown) {
    let rows = [
        ("length", b.length),
        ("words", b.words),
        ("sentences", b.sentences),
        ("keywords", b.keywords),
        ("email", b.email),
        ("phone", b.phone),
    ];
    for (name, value) in rows {
        println!("  {name:<18}  {value:>7.3}");
    }
    println!("  {:<18}  x{:>6.3}", "repetition factor", b.repetition_factor);
    println!("  {:<18}  {:>7.3}", "total", b.total);
}

pub fn print_images(candidates: &[ImageCandidate]) {
    if candidates.is_empty() {
        println!("  No embedded images found");
        return;
    }
    println!("  {:>3}  {:<6}  {:>10}  {:>10}", "#", "Format", "Offset", "Bytes");
    for (i, c) in candidates.iter().enumerate() {
        println!(
            "  {:>3}  {:<6}  {:>10}  {:>10}",
            i,
            c.format.to_string(),
            c.start,
            c.size
        );
    }
}
