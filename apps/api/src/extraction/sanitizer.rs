//! Text sanitizer: turns assembled page text into canonical plain text.
//!
//! Lossy (non-ASCII is dropped), so it runs exactly once, after all line and
//! paragraph structure is final. `sanitize` is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::error::ExtractionError;

/// Marker the assembler may place between pages. Never survives sanitizing.
pub const PAGE_BREAK_MARKER: &str = "--- Page Break ---";

/// Below this many characters the text is not treated as a usable résumé.
pub const MIN_USABLE_CHARS: usize = 50;

static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r" +([.,!?;:])").unwrap());
static SENTENCE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?]) *([A-Z])").unwrap());

/// Canonicalizes raw extracted text.
pub fn sanitize(raw: &str) -> String {
    let normalized = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{000C}', "\n\n")
        .replace(PAGE_BREAK_MARKER, "\n\n");

    let mut out: Vec<String> = Vec::new();
    let mut pending_blank = false;

    for line in normalized.split('\n') {
        let line = clean_line(line);
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push(String::new());
            pending_blank = false;
        }
        out.push(line);
    }

    out.join("\n")
}

fn clean_line(line: &str) -> String {
    let printable: String = line
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() || c.is_control() {
                Some(' ')
            } else if (' '..='~').contains(&c) {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let collapsed = printable.split_whitespace().collect::<Vec<_>>().join(" ");
    let tightened = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
    let spaced = SENTENCE_GAP.replace_all(&tightened, "$1 $2");
    spaced.trim().to_string()
}

/// Enforces the minimum-content floor on already sanitized text.
pub fn require_usable(text: String) -> Result<String, ExtractionError> {
    let chars = text.chars().count();
    if chars < MIN_USABLE_CHARS {
        return Err(ExtractionError::InsufficientText {
            chars,
            minimum: MIN_USABLE_CHARS,
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_within_line() {
        assert_eq!(sanitize("Senior \t  Rust\u{00A0}Engineer"), "Senior Rust Engineer");
    }

    #[test]
    fn test_preserves_single_line_breaks() {
        assert_eq!(sanitize("John Doe\njohn@x.com"), "John Doe\njohn@x.com");
    }

    #[test]
    fn test_paragraph_breaks_become_one_blank_line() {
        assert_eq!(
            sanitize("Experience\n\n\n\n  \nEducation"),
            "Experience\n\nEducation"
        );
    }

    #[test]
    fn test_leading_and_trailing_blank_lines_removed() {
        assert_eq!(sanitize("\n\n  Summary  \n\n"), "Summary");
    }

    #[test]
    fn test_strips_non_printable_and_non_ascii() {
        assert_eq!(sanitize("Caf\u{00E9} \u{2022} Rust\u{0007}"), "Caf Rust");
        assert_eq!(sanitize("R\u{0007}ust"), "R ust");
    }

    #[test]
    fn test_removes_space_before_punctuation() {
        assert_eq!(sanitize("Rust , Go ; SQL : yes ."), "Rust, Go; SQL: yes.");
    }

    #[test]
    fn test_single_space_after_sentence_before_uppercase() {
        assert_eq!(sanitize("Led a team.Shipped v2!Then"), "Led a team. Shipped v2! Then");
    }

    #[test]
    fn test_decimal_and_domain_untouched() {
        assert_eq!(sanitize("GPA 3.8 at john@x.com"), "GPA 3.8 at john@x.com");
    }

    #[test]
    fn test_page_break_marker_is_stripped() {
        let raw = format!("Page one text\n\n{PAGE_BREAK_MARKER}\n\nPage two text");
        assert_eq!(sanitize(&raw), "Page one text\n\nPage two text");
    }

    #[test]
    fn test_form_feed_and_carriage_returns() {
        assert_eq!(sanitize("a\r\nb\rc\u{000C}d"), "a\nb\nc\n\nd");
    }

    #[test]
    fn test_idempotent_on_samples() {
        let samples = [
            "",
            "   ",
            "Hello .World",
            "a . . B",
            "x\n\n\n\ny\r\n\r\nz",
            "Tabs\tand\u{000B}vertical\u{00A0}space",
            "\u{2022} Built 3 services , cut latency 40% .Reduced cost",
            "--- Page Break ---",
            "e.g.Word ! ?Next",
            "Ends with punctuation ;",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_require_usable_floor_49_fails() {
        let text = "a".repeat(49);
        assert_eq!(
            require_usable(text),
            Err(ExtractionError::InsufficientText {
                chars: 49,
                minimum: 50
            })
        );
    }

    #[test]
    fn test_require_usable_floor_50_passes() {
        let text = "a".repeat(50);
        assert_eq!(require_usable(text.clone()), Ok(text));
    }
}
