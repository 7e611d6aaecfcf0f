use regex::Regex;
use std::sync::LazyLock;

/// Terminal punctuation glued to the next sentence: "Developer.Built".
static MISSING_SENTENCE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])([A-Z])").unwrap());

/// Lowercase letter glued to an uppercase one: "SkillsLanguages".
static CASE_TRANSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

/// Spaces around the `@` of an email address: "foo @ bar.com".
static SPACED_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9._%+-]) *@ *([A-Za-z0-9-])").unwrap());

/// Spaces around the dot before a common top-level domain: "example . com".
static SPACED_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"([A-Za-z0-9-])(?: +\. *| *\. +)",
        r"(com|org|net|edu|gov|io|dev|co|me|ai|info|uk|us|de)\b",
    ))
    .unwrap()
});

/// Clean raw extracted text.
///
/// Steps:
/// 1. Strip invisible artifacts (soft hyphen, zero-width space, BOM), turn
///    non-breaking spaces into spaces and unify line endings
/// 2. Collapse whitespace runs per line and trim every line
/// 3. Keep at most one blank line between paragraphs
/// 4. Repair glued sentences, glued words and split emails/URLs
///
/// Idempotent: running it twice gives the same result as running it once.
pub fn normalize(text: &str) -> String {
    let cleaned = strip_artifacts(text);
    let collapsed = collapse_whitespace(&cleaned);
    repair_spacing(&collapsed)
}

fn strip_artifacts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\u{00AD}' | '\u{200B}' | '\u{FEFF}' => {}
            '\u{00A0}' => out.push(' '),
            '\r' => {
                // "\r\n" and a lone "\r" both become one newline
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            // Form feeds separate pages in some decoders
            '\u{000C}' => out.push_str("\n\n"),
            _ => out.push(c),
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut prev_blank = true; // start true to drop leading blank lines

    for raw in text.split('\n') {
        let line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !prev_blank {
                lines.push(String::new());
            }
            prev_blank = true;
        } else {
            lines.push(line);
            prev_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

fn repair_spacing(text: &str) -> String {
    let s = MISSING_SENTENCE_SPACE.replace_all(text, "$1 $2");
    let s = CASE_TRANSITION.replace_all(&s, "$1 $2");
    let s = replace_to_fixpoint(&SPACED_AT, &s, "$1@$2");
    replace_to_fixpoint(&SPACED_DOMAIN, &s, "$1.$2")
}

/// Matches share boundary characters ("a @ b @ c"), so one pass can leave
/// a second match behind.
fn replace_to_fixpoint(re: &Regex, text: &str, rep: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = re.replace_all(&current, rep).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
