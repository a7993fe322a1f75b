//! Diagnostic scanner: read-only quality report over raw OCR Markdown.
//!
//! Flags the three artefact classes that keep showing up in OCR output of
//! math-heavy Arabic documents:
//!
//! * a bare `arrow` with no leading backslash — usually an OCR-mangled
//!   `\leftarrow`/`\rightarrow`,
//! * math blocks whose `\left`/`\right` counts disagree,
//! * image references whose alt text is long enough to be a leaked figure
//!   description, or whose path is empty.
//!
//! The scanner mutates nothing; it exists so a human can review what the
//! automated repair passes would touch (or cannot fix).

use crate::config::RepairConfig;
use crate::pipeline::balance;
use crate::scan;
use std::fmt;

/// A single diagnostic finding, with a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Literal `arrow` not preceded by a backslash.
    SuspectArrow { line: usize, context: String },
    /// Math block with unequal `\left`/`\right` counts.
    UnbalancedDelimiters {
        line: usize,
        left: usize,
        right: usize,
        excerpt: String,
    },
    /// Image reference whose alt text exceeds the configured threshold.
    LongAltText { line: usize, alt: String },
    /// Image reference with an empty path.
    EmptyImagePath { line: usize, alt: String },
}

/// Report produced by [`scan_document`]. `Display` renders the textual form.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    pub findings: Vec<Finding>,
}

impl DiagnosticReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.findings.is_empty() {
            return writeln!(f, "No findings.");
        }
        for finding in &self.findings {
            match finding {
                Finding::SuspectArrow { line, context } => {
                    writeln!(f, "line {line}: suspect 'arrow' (missing backslash?): …{context}…")?
                }
                Finding::UnbalancedDelimiters {
                    line,
                    left,
                    right,
                    excerpt,
                } => writeln!(
                    f,
                    "line {line}: mismatched delimiters \\left={left} \\right={right}: {excerpt}…"
                )?,
                Finding::LongAltText { line, alt } => {
                    writeln!(f, "line {line}: alt text looks like a figure description: {alt}…")?
                }
                Finding::EmptyImagePath { line, alt } => {
                    writeln!(f, "line {line}: image reference with empty path (alt: {alt:?})")?
                }
            }
        }
        Ok(())
    }
}

/// Clamp a byte offset down to the nearest char boundary.
fn floor_char_boundary(text: &str, mut byte: usize) -> usize {
    byte = byte.min(text.len());
    while byte > 0 && !text.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

/// Clamp a byte offset up to the nearest char boundary.
fn ceil_char_boundary(text: &str, mut byte: usize) -> usize {
    byte = byte.min(text.len());
    while byte < text.len() && !text.is_char_boundary(byte) {
        byte += 1;
    }
    byte
}

/// A short excerpt around `[start, end)`, single-line.
fn context_around(text: &str, start: usize, end: usize) -> String {
    let from = floor_char_boundary(text, start.saturating_sub(20));
    let to = ceil_char_boundary(text, end + 20);
    text[from..to].replace('\n', " ")
}

/// Truncate to at most `n` chars, respecting boundaries.
fn truncate_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Run all diagnostic checks over the document.
pub fn scan_document(text: &str, config: &RepairConfig) -> DiagnosticReport {
    let mut findings = Vec::new();

    // Bare "arrow" occurrences.
    let mut offset = 0;
    while let Some(pos) = text[offset..].find("arrow") {
        let abs = offset + pos;
        let escaped = abs > 0 && text.as_bytes()[abs - 1] == b'\\';
        if !escaped {
            findings.push(Finding::SuspectArrow {
                line: scan::line_of(text, abs),
                context: context_around(text, abs, abs + "arrow".len()),
            });
        }
        offset = abs + "arrow".len();
    }

    // Mismatched delimiters per math block.
    for block in scan::math_blocks(text) {
        let (left, right) = balance::delimiter_counts(block.content);
        if left != right {
            findings.push(Finding::UnbalancedDelimiters {
                line: scan::line_of(text, block.span.start),
                left,
                right,
                excerpt: truncate_chars(block.content, 100),
            });
        }
    }

    // Image references needing manual review.
    for image in scan::image_refs(text) {
        let line = scan::line_of(text, image.span.start);
        if image.alt.chars().count() > config.long_alt_threshold {
            findings.push(Finding::LongAltText {
                line,
                alt: truncate_chars(image.alt, 50),
            });
        }
        if image.path.is_empty() {
            findings.push(Finding::EmptyImagePath {
                line,
                alt: truncate_chars(image.alt, 50),
            });
        }
    }

    DiagnosticReport { findings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RepairConfig {
        RepairConfig::default()
    }

    #[test]
    fn bare_arrow_is_flagged() {
        let report = scan_document("the arrow points north", &config());
        assert!(matches!(
            report.findings.as_slice(),
            [Finding::SuspectArrow { line: 1, .. }]
        ));
    }

    #[test]
    fn escaped_arrow_is_not_flagged() {
        let report = scan_document(r"use \arrow here", &config());
        assert!(report.is_clean());
    }

    #[test]
    fn rightarrow_in_math_is_flagged_once_when_bare() {
        // "rightarrow" without backslash contains a bare "arrow".
        let report = scan_document("$$a rightarrow b$$", &config());
        assert_eq!(report.findings.len(), 1);
    }

    #[test]
    fn balanced_block_is_not_flagged() {
        let report = scan_document(r"$$\left( x \right) + \left[ y \right]$$", &config());
        assert!(report.is_clean());
    }

    #[test]
    fn unbalanced_block_is_flagged_with_counts() {
        let report = scan_document("line one\n$$\\left( x$$", &config());
        match &report.findings[..] {
            [Finding::UnbalancedDelimiters {
                line,
                left,
                right,
                ..
            }] => {
                assert_eq!(*line, 2);
                assert_eq!((*left, *right), (1, 0));
            }
            other => panic!("unexpected findings: {other:?}"),
        }
    }

    #[test]
    fn long_alt_and_empty_path_are_flagged() {
        let long_alt = "a".repeat(60);
        let text = format!("![{long_alt}](img.png)\n![figure]()");
        let report = scan_document(&text, &config());
        assert_eq!(report.findings.len(), 2);
        assert!(matches!(report.findings[0], Finding::LongAltText { line: 1, .. }));
        assert!(matches!(report.findings[1], Finding::EmptyImagePath { line: 2, .. }));
    }

    #[test]
    fn display_renders_one_line_per_finding() {
        let report = scan_document("the arrow\n$$\\left( x$$", &config());
        let text = report.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("line 1"));
        assert!(text.contains("\\left=1 \\right=0"));
    }

    #[test]
    fn clean_document_reports_no_findings() {
        let report = scan_document("just plain prose", &config());
        assert!(report.is_clean());
        assert_eq!(report.to_string().trim(), "No findings.");
    }
}
