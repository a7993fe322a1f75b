//! LaTeX → MathML conversion for print-oriented HTML.
//!
//! Browsers and print engines that cannot run MathJax still render MathML
//! natively, so this pass converts `$$…$$` and `$…$` spans up front via the
//! `latex2mathml` crate. A span the converter rejects is substituted with a
//! visibly marked literal fallback — the reader sees the raw LaTeX in a
//! highlighted box instead of silently losing the formula. A single bad
//! block never aborts the document.

use latex2mathml::{latex_to_mathml, DisplayStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_DISPLAY_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());

static RE_INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$]+?)\$").unwrap());

/// Convert one display span, falling back to marked literal LaTeX.
fn convert_display(latex: &str) -> String {
    match latex_to_mathml(latex, DisplayStyle::Block) {
        Ok(mathml) => format!("<div class=\"math-display\">{}</div>", mathml),
        Err(e) => {
            warn!("display math conversion failed: {e}");
            format!("<pre class=\"math-error\">$$${}$$$</pre>", latex)
        }
    }
}

/// Convert one inline span, falling back to marked literal LaTeX.
fn convert_inline(latex: &str) -> String {
    match latex_to_mathml(latex, DisplayStyle::Inline) {
        Ok(mathml) => format!("<span class=\"math-inline\">{}</span>", mathml),
        Err(e) => {
            warn!("inline math conversion failed: {e}");
            format!("<code class=\"math-error\">${}$</code>", latex)
        }
    }
}

/// Replace every math span in `text` with MathML (or its fallback).
///
/// Display spans are converted before inline spans so `$$…$$` is never
/// half-matched as two `$…$` spans.
pub fn mathml_pass(text: &str) -> String {
    let text = RE_DISPLAY_MATH
        .replace_all(text, |caps: &regex::Captures<'_>| convert_display(&caps[1]))
        .to_string();
    RE_INLINE_MATH
        .replace_all(&text, |caps: &regex::Captures<'_>| convert_inline(&caps[1]))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_math_becomes_mathml_div() {
        let out = mathml_pass("$$x^2 + y^2 = z^2$$");
        assert!(out.starts_with("<div class=\"math-display\">"));
        assert!(out.contains("<math"));
        assert!(!out.contains("$$"));
    }

    #[test]
    fn inline_math_becomes_mathml_span() {
        let out = mathml_pass("Euler: $e^{i\\pi} + 1 = 0$ holds.");
        assert!(out.contains("<span class=\"math-inline\">"));
        assert!(out.contains("<math"));
    }

    #[test]
    fn display_converted_before_inline() {
        let out = mathml_pass("$$a + b$$ and $c$");
        assert!(out.contains("math-display"));
        assert!(out.contains("math-inline"));
    }

    #[test]
    fn failed_conversion_yields_marked_fallback() {
        // Unclosed group is rejected by the converter.
        let out = mathml_pass(r"$$\frac{a}{$$");
        assert!(
            out.contains("math-error"),
            "expected visible fallback, got: {out}"
        );
        assert!(out.contains(r"\frac{a}{"));
    }

    #[test]
    fn one_bad_block_does_not_affect_its_neighbours() {
        let out = mathml_pass("$$a+b$$ then $$\\frac{a}{$$");
        assert!(out.contains("math-display"));
        assert!(out.contains("math-error"));
    }

    #[test]
    fn text_without_math_is_untouched() {
        assert_eq!(mathml_pass("no math here"), "no math here");
    }
}
