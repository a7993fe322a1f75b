//! Span scanner: typed views over raw OCR Markdown.
//!
//! The repair passes all operate on the same three constructs — display-math
//! blocks, image references, and page markers. This module finds them once,
//! with one well-known pattern each, and hands every pass a typed span with
//! byte ranges into the original text. Transforms then work by producing
//! `(range, replacement)` pairs spliced back with [`splice`], so no pass ever
//! re-derives a position by substring search.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// `$$…$$` display-math span, non-greedy, may cross lines.
pub static RE_MATH_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());

/// `![alt](path)` image reference.
pub static RE_IMAGE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

/// `{N}---…` pagination marker emitted by the OCR service between pages.
/// The page index inside the braces is zero-indexed.
pub static RE_PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}-{3,}").unwrap());

/// A `$$…$$` span in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathBlock<'a> {
    /// Byte range of the whole span, delimiters included.
    pub span: Range<usize>,
    /// Byte range of the content between the delimiters.
    pub content_span: Range<usize>,
    /// The content between the delimiters.
    pub content: &'a str,
}

/// An `![alt](path)` span in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef<'a> {
    /// Byte range of the whole reference.
    pub span: Range<usize>,
    pub alt: &'a str,
    pub path: &'a str,
}

/// A pagination marker in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMarker {
    /// Byte range of the marker.
    pub span: Range<usize>,
    /// Page index as written, zero-indexed.
    pub index: usize,
}

impl PageMarker {
    /// One-indexed page number, matching extracted image filenames.
    pub fn page(&self) -> usize {
        self.index + 1
    }
}

/// All math blocks in document order.
pub fn math_blocks(text: &str) -> Vec<MathBlock<'_>> {
    RE_MATH_BLOCK
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            let inner = caps.get(1).unwrap();
            MathBlock {
                span: whole.range(),
                content_span: inner.range(),
                content: inner.as_str(),
            }
        })
        .collect()
}

/// All image references in document order.
pub fn image_refs(text: &str) -> Vec<ImageRef<'_>> {
    RE_IMAGE_REF
        .captures_iter(text)
        .map(|caps| ImageRef {
            span: caps.get(0).unwrap().range(),
            alt: caps.get(1).unwrap().as_str(),
            path: caps.get(2).unwrap().as_str(),
        })
        .collect()
}

/// All page markers in document order.
pub fn page_markers(text: &str) -> Vec<PageMarker> {
    RE_PAGE_MARKER
        .captures_iter(text)
        .map(|caps| PageMarker {
            span: caps.get(0).unwrap().range(),
            index: caps[1].parse().unwrap_or(0),
        })
        .collect()
}

/// Fold over the document's lines, tagging each line with the page
/// established by the nearest preceding marker (one-indexed). Lines before
/// the first marker carry `None`.
pub fn fold_pages(text: &str) -> Vec<(Option<usize>, &str)> {
    let mut current: Option<usize> = None;
    text.lines()
        .map(|line| {
            if let Some(caps) = RE_PAGE_MARKER.captures(line) {
                if let Ok(index) = caps[1].parse::<usize>() {
                    current = Some(index + 1);
                }
            }
            (current, line)
        })
        .collect()
}

/// Splice non-overlapping replacements (in ascending range order) into `text`.
pub fn splice(text: &str, replacements: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in replacements {
        debug_assert!(range.start >= cursor, "replacements must not overlap");
        out.push_str(&text[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// 1-based line number of a byte offset, for diagnostics.
pub fn line_of(text: &str, byte: usize) -> usize {
    text[..byte.min(text.len())].bytes().filter(|&b| b == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_math_blocks_across_lines() {
        let text = "before\n$$a + b\n= c$$\nafter $$d$$";
        let blocks = math_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "a + b\n= c");
        assert_eq!(blocks[1].content, "d");
        assert_eq!(&text[blocks[0].span.clone()], "$$a + b\n= c$$");
    }

    #[test]
    fn finds_image_refs_with_empty_parts() {
        let refs = image_refs("![figure](img.png) and ![]() and ![alt only]()");
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].alt, "figure");
        assert_eq!(refs[0].path, "img.png");
        assert_eq!(refs[1].alt, "");
        assert_eq!(refs[1].path, "");
        assert_eq!(refs[2].alt, "alt only");
        assert_eq!(refs[2].path, "");
    }

    #[test]
    fn page_marker_is_zero_indexed() {
        let markers = page_markers("{0}------------------\ntext\n{15}------");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].index, 0);
        assert_eq!(markers[0].page(), 1);
        assert_eq!(markers[1].page(), 16);
    }

    #[test]
    fn short_dash_run_is_not_a_marker() {
        assert!(page_markers("{3}--").is_empty());
        assert_eq!(page_markers("{3}---").len(), 1);
    }

    #[test]
    fn fold_tags_lines_with_current_page() {
        let text = "intro\n{0}------\nfirst page\n{1}------\nsecond page";
        let folded = fold_pages(text);
        assert_eq!(folded[0].0, None);
        assert_eq!(folded[1].0, Some(1));
        assert_eq!(folded[2].0, Some(1));
        assert_eq!(folded[3].0, Some(2));
        assert_eq!(folded[4].0, Some(2));
    }

    #[test]
    fn splice_replaces_in_place() {
        let text = "aaa bbb ccc";
        let out = splice(text, &[(4..7, "XYZ".to_string())]);
        assert_eq!(out, "aaa XYZ ccc");
    }

    #[test]
    fn splice_with_no_replacements_is_identity() {
        assert_eq!(splice("unchanged", &[]), "unchanged");
    }

    #[test]
    fn line_numbers_are_one_based() {
        let text = "first\nsecond\nthird";
        assert_eq!(line_of(text, 0), 1);
        assert_eq!(line_of(text, 6), 2);
        assert_eq!(line_of(text, text.len()), 3);
    }
}
