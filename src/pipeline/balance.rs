//! Delimiter balancer: reconcile `\left`/`\right` pairs inside math blocks.
//!
//! OCR output frequently drops one side of a sizing-delimiter pair, and a
//! lone `\left(` makes the whole formula fail to typeset downstream. When the
//! counts differ the pass strips every `\left` and `\right` from the block —
//! a block with plain delimiters still renders, a block with mismatched
//! sizing commands does not. Balanced blocks pass through untouched, which
//! also makes the transform idempotent.
//!
//! `\leftarrow` / `\rightarrow` share the `\left`/`\right` prefix; a token
//! followed by another ASCII letter is a different command and must never be
//! counted or stripped.

use crate::scan;
use tracing::debug;

const LEFT: &str = r"\left";
const RIGHT: &str = r"\right";

/// Count occurrences of `token` not immediately followed by an ASCII letter.
fn count_token(content: &str, token: &str) -> usize {
    let mut count = 0;
    let mut rest = content;
    while let Some(pos) = rest.find(token) {
        let after = &rest[pos + token.len()..];
        let continues = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if !continues {
            count += 1;
        }
        rest = after;
    }
    count
}

/// Remove occurrences of `token` not immediately followed by an ASCII letter.
fn strip_token(content: &str, token: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find(token) {
        let after = &rest[pos + token.len()..];
        let continues = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        out.push_str(&rest[..pos]);
        if continues {
            out.push_str(token);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// `(left_count, right_count)` for a math block's content.
pub fn delimiter_counts(content: &str) -> (usize, usize) {
    (count_token(content, LEFT), count_token(content, RIGHT))
}

/// Balance a single math block's content.
///
/// Returns `Some(stripped)` when the counts differ and the block was
/// rewritten, `None` when the block is already balanced.
pub fn balance_block(content: &str) -> Option<String> {
    let (left, right) = delimiter_counts(content);
    if left == right {
        return None;
    }
    debug!(left, right, "stripping mismatched sizing delimiters");
    Some(strip_token(&strip_token(content, LEFT), RIGHT))
}

/// Apply the balancer to every math block in the document.
///
/// Blocks are non-overlapping, so processing order does not affect the
/// result. Returns the corrected text and the number of rewritten blocks.
pub fn balance_document(text: &str) -> (String, usize) {
    let replacements: Vec<_> = scan::math_blocks(text)
        .into_iter()
        .filter_map(|block| {
            balance_block(block.content).map(|fixed| (block.content_span, fixed))
        })
        .collect();
    let count = replacements.len();
    (scan::splice(text, &replacements), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_block_is_unchanged() {
        assert_eq!(balance_block(r"\left( x \right)"), None);
    }

    #[test]
    fn arrows_are_not_delimiters() {
        // left=1, right=1 — the \right inside \rightarrow must not count.
        assert_eq!(balance_block(r"\left( x \right) \rightarrow y"), None);
        assert_eq!(delimiter_counts(r"\leftarrow \rightarrow"), (0, 0));
    }

    #[test]
    fn mismatched_block_is_stripped() {
        let fixed = balance_block(r"\left( x + \left( y \right)").unwrap();
        assert_eq!(fixed, "( x + ( y )");
    }

    #[test]
    fn arrows_survive_stripping() {
        let fixed = balance_block(r"\left( a \rightarrow b").unwrap();
        assert_eq!(fixed, r"( a \rightarrow b");
    }

    #[test]
    fn balancing_is_idempotent() {
        let once = balance_block(r"\left( x + \left( y \right)").unwrap();
        // A stripped block has zero delimiters on both sides, so the second
        // application reports it as already balanced.
        assert_eq!(balance_block(&once), None);
    }

    #[test]
    fn document_pass_touches_only_mismatched_blocks() {
        let text = "$$\\left( a \\right)$$ mid $$\\left( b$$";
        let (fixed, count) = balance_document(text);
        assert_eq!(count, 1);
        assert_eq!(fixed, "$$\\left( a \\right)$$ mid $$( b$$");
    }

    #[test]
    fn document_pass_is_idempotent() {
        let text = "$$\\left( x + \\left( y \\right)$$";
        let (once, _) = balance_document(text);
        let (twice, second_count) = balance_document(&once);
        assert_eq!(once, twice);
        assert_eq!(second_count, 0);
    }

    #[test]
    fn text_without_math_is_untouched() {
        let (out, count) = balance_document("plain \\left( text");
        assert_eq!(out, "plain \\left( text");
        assert_eq!(count, 0);
    }
}
