//! RTL extractor: hoist Arabic `\text{…}` runs out of math blocks.
//!
//! Math typesetters lay glyphs out strictly left-to-right, which scrambles an
//! Arabic label embedded via `\text{…}`. The pass removes the run from the
//! math content and re-emits it as a `<span dir="rtl">` immediately after the
//! shortened block, so the equation and the label each render in their own
//! direction.
//!
//! Only the first Arabic run per block is extracted. Blocks with several runs
//! have not shown up in real OCR output so far; see DESIGN.md.

use crate::scan;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// `\text{…}` whose braces contain at least one character in the Arabic
/// Unicode block (U+0600–U+06FF).
static RE_ARABIC_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\text\{([^}]*[\x{0600}-\x{06FF}][^}]*)\}").unwrap());

/// Extract the first Arabic `\text{…}` run from a math block's content.
///
/// Returns `Some((shortened_math, run))` when a run was found, `None` when
/// the block has no embedded Arabic text.
pub fn extract_block(content: &str) -> Option<(String, String)> {
    let caps = RE_ARABIC_TEXT.captures(content)?;
    let whole = caps.get(0).unwrap().as_str();
    let run = caps[1].to_string();
    let shortened = content.replacen(whole, "", 1);
    debug!(run = %run, "hoisted RTL run out of math block");
    Some((shortened, run))
}

/// Apply the extractor to every math block in the document.
///
/// Each affected `$$…$$` span is replaced by the shortened block followed by
/// a right-to-left inline span. Returns the rewritten text and the number of
/// extracted runs.
pub fn extract_document(text: &str) -> (String, usize) {
    let replacements: Vec<_> = scan::math_blocks(text)
        .into_iter()
        .filter_map(|block| {
            extract_block(block.content).map(|(shortened, run)| {
                let replacement = format!("$${}$$ <span dir=\"rtl\">{}</span>", shortened, run);
                (block.span, replacement)
            })
        })
        .collect();
    let count = replacements.len();
    (scan::splice(text, &replacements), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_run_is_hoisted() {
        let (math, run) = extract_block(r"x = 5 \text{عدد} + y").unwrap();
        assert_eq!(math, "x = 5  + y");
        assert_eq!(run, "عدد");
    }

    #[test]
    fn latin_text_is_left_alone() {
        assert_eq!(extract_block(r"x = \text{count} + y"), None);
    }

    #[test]
    fn block_without_text_command_is_left_alone() {
        assert_eq!(extract_block("عدد + x"), None);
    }

    #[test]
    fn only_first_run_is_extracted() {
        let (math, run) = extract_block(r"\text{أول} + \text{ثان}").unwrap();
        assert_eq!(run, "أول");
        assert!(math.contains(r"\text{ثان}"));
    }

    #[test]
    fn document_pass_emits_span_after_block() {
        let text = "before $$x = 5 \\text{عدد} + y$$ after";
        let (out, count) = extract_document(text);
        assert_eq!(count, 1);
        assert_eq!(
            out,
            "before $$x = 5  + y$$ <span dir=\"rtl\">عدد</span> after"
        );
    }

    #[test]
    fn document_pass_skips_pure_latin_blocks() {
        let text = "$$a + b$$ and $$\\text{sum}$$";
        let (out, count) = extract_document(text);
        assert_eq!(out, text);
        assert_eq!(count, 0);
    }

    #[test]
    fn mixed_content_inside_braces_still_matches() {
        let (math, run) = extract_block(r"\text{rate = معدل} \cdot t").unwrap();
        assert_eq!(run, "rate = معدل");
        assert_eq!(math, r" \cdot t");
    }
}
