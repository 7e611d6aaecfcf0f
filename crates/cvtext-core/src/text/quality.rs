use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Resume-domain vocabulary; each distinct hit adds [`KEYWORD_BONUS`].
pub const RESUME_KEYWORDS: [&str; 19] = [
    "experience",
    "education",
    "skills",
    "summary",
    "email",
    "phone",
    "work",
    "project",
    "university",
    "degree",
    "bachelor",
    "master",
    "certification",
    "languages",
    "developer",
    "engineer",
    "manager",
    "responsibilities",
    "achievements",
];

const KEYWORD_BONUS: f64 = 0.5;
const EMAIL_BONUS: f64 = 2.0;
const PHONE_BONUS: f64 = 1.0;

const LENGTH_CAP: f64 = 5.0;
const WORD_CAP: f64 = 3.0;
const SENTENCE_CAP: f64 = 2.0;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Every term of a quality score, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub length: f64,
    pub words: f64,
    pub sentences: f64,
    pub keywords: f64,
    pub email: f64,
    pub phone: f64,
    /// Multiplier in `[0.5, 2.0]` derived from the unique-word ratio.
    pub repetition_factor: f64,
    pub total: f64,
}

/// Score how "resume-like" and well-formed a text is. Always `>= 0`.
pub fn score(text: &str) -> f64 {
    assess(text).total
}

/// Compute the full score breakdown.
///
/// Each term is capped before summation so no single heuristic can
/// dominate; the sum is then scaled by the repetition factor.
pub fn assess(text: &str) -> QualityBreakdown {
    let char_count = text.chars().count();
    let words: Vec<&str> = text.split_whitespace().collect();

    let length = (char_count as f64 / 1000.0).min(LENGTH_CAP);
    let word_term = (words.len() as f64 / 100.0).min(WORD_CAP);

    let sentence_count = SENTENCE_BREAK
        .split(text)
        .filter(|s| s.trim().chars().count() > 10)
        .count();
    let sentences = (sentence_count as f64 / 10.0).min(SENTENCE_CAP);

    let lower = text.to_lowercase();
    let keyword_hits = RESUME_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();
    let keywords = keyword_hits as f64 * KEYWORD_BONUS;

    let email = if EMAIL.is_match(text) { EMAIL_BONUS } else { 0.0 };
    let phone = if PHONE.is_match(text) { PHONE_BONUS } else { 0.0 };

    let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let ratio = unique.len() as f64 / words.len().max(1) as f64;
    let repetition_factor = (2.0 * ratio).max(0.5);

    let total = (length + word_term + sentences + keywords + email + phone) * repetition_factor;

    QualityBreakdown {
        length,
        words: word_term,
        sentences,
        keywords,
        email,
        phone,
        repetition_factor,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(score(""), 0.0);
        assert_eq!(score(&crate::text::normalize("   \n ")), 0.0);
    }

    #[test]
    fn test_whitespace_counts_toward_length() {
        // 5 chars / 1000, halved by the repetition floor for a wordless text
        assert!((score("   \n ") - 0.0025).abs() < 1e-12);
    }

    #[test]
    fn test_never_negative() {
        for s in ["x", "a a a a a a a", "!!!...???", "12345"] {
            assert!(score(s) >= 0.0, "{s}");
        }
    }

    #[test]
    fn test_length_term_capped() {
        let long = "abcdefghij ".repeat(1000);
        assert_eq!(assess(&long).length, LENGTH_CAP);
    }

    #[test]
    fn test_length_term_monotonic_in_prefix() {
        let text = "Experienced engineer building data pipelines. ".repeat(15);
        let shorter: String = text.chars().take(400).collect();
        assert!(assess(&text).length >= assess(&shorter).length);
    }

    #[test]
    fn test_keywords_counted_once() {
        let b = assess("Skills skills SKILLS");
        assert_eq!(b.keywords, KEYWORD_BONUS);
        let b = assess("Education and Experience");
        assert_eq!(b.keywords, 2.0 * KEYWORD_BONUS);
    }

    #[test]
    fn test_contact_patterns() {
        let b = assess("Reach me at jane.doe@example.com or (555) 123-4567");
        assert_eq!(b.email, EMAIL_BONUS);
        assert_eq!(b.phone, PHONE_BONUS);

        let b = assess("no contact details here");
        assert_eq!(b.email, 0.0);
        assert_eq!(b.phone, 0.0);
    }

    #[test]
    fn test_phone_separators() {
        assert_eq!(assess("555.123.4567").phone, PHONE_BONUS);
        assert_eq!(assess("5551234567").phone, PHONE_BONUS);
        assert_eq!(assess("555-12-4567").phone, 0.0);
    }

    #[test]
    fn test_sentence_term() {
        let b = assess("This is one sentence. Another full sentence! Short. Yet another one here?");
        // "Short" is not longer than 10 characters
        assert!((b.sentences - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_repetition_penalty() {
        let repeated = vec!["word"; 1000].join(" ");
        let distinct = (0..1000)
            .map(|i| format!("w{i:03}"))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(repeated.len(), 4999);
        assert_eq!(distinct.len(), 4999);
        assert!(score(&repeated) < score(&distinct));
        assert_eq!(assess(&repeated).repetition_factor, 0.5);
        assert_eq!(assess(&distinct).repetition_factor, 2.0);
    }

    #[test]
    fn test_resume_beats_gibberish() {
        let resume = "John Doe\nSoftware Engineer\nEmail: john@doe.dev\n\
                      Experience: Built distributed systems at scale. \
                      Education: Bachelor degree in computer science.";
        let gibberish = "xq xq xq xq xq xq xq xq xq xq xq xq";
        assert!(score(resume) > score(gibberish));
    }
}
