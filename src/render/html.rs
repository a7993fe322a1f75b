//! HTML rendering: repaired Markdown → complete right-to-left HTML document.
//!
//! Two variants share one code path:
//!
//! * [`render_html`] keeps `$…$`/`$$…$$` spans in place and loads MathJax in
//!   the page — the best-looking output for screens and for headless-browser
//!   PDF export.
//! * [`render_html_mathml`] converts math to MathML up front
//!   ([`crate::render::math`]) and uses print-oriented CSS, for consumers
//!   with no JavaScript.
//!
//! Both drop image references that are still empty after the repair passes;
//! an empty `![…]()` renders as a broken image icon and carries no
//! information the alt text doesn't.

use crate::render::math;
use comrak::{markdown_to_html, Options};
use once_cell::sync::Lazy;
use regex::Regex;

/// Image reference whose path survived repair empty.
static RE_DANGLING_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(\)").unwrap());

fn drop_dangling_images(markdown: &str) -> String {
    RE_DANGLING_IMAGE.replace_all(markdown, "").to_string()
}

/// Markdown → HTML fragment via comrak.
///
/// Raw HTML must pass through: the repair pipeline emits
/// `<span dir="rtl">` and the MathML pass emits `<math>` elements.
fn markdown_to_fragment(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.render.unsafe_ = true;
    markdown_to_html(markdown, &options)
}

/// Render a complete RTL HTML document with MathJax-based math.
pub fn render_html(markdown: &str, title: &str) -> String {
    let cleaned = drop_dangling_images(markdown);
    let body = markdown_to_fragment(&cleaned);
    SCREEN_TEMPLATE
        .replace("%TITLE%", title)
        .replace("%BODY%", &body)
}

/// Render a complete RTL HTML document with math pre-converted to MathML.
pub fn render_html_mathml(markdown: &str, title: &str) -> String {
    let cleaned = drop_dangling_images(markdown);
    let with_mathml = math::mathml_pass(&cleaned);
    let body = markdown_to_fragment(&with_mathml);
    PRINT_TEMPLATE
        .replace("%TITLE%", title)
        .replace("%BODY%", &body)
}

/// Screen template: Amiri serif body, MathJax 3 with `$`/`$$` delimiters,
/// math forced LTR inside the RTL page.
const SCREEN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>%TITLE%</title>
    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link href="https://fonts.googleapis.com/css2?family=Amiri:ital,wght@0,400;0,700;1,400;1,700&family=IBM+Plex+Sans+Arabic:wght@400;700&family=Roboto+Mono:wght@400;700&display=swap" rel="stylesheet">

    <script>
        MathJax = {
            tex: {
                inlineMath: [['$', '$']],
                displayMath: [['$$', '$$']],
                processEscapes: true,
                tags: 'ams'
            },
            svg: { fontCache: 'global' },
            output: { font: 'mathjax-modern' }
        };
    </script>
    <script src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js" id="MathJax-script" async></script>
    <style>
        body {
            font-family: 'Amiri', 'Times New Roman', serif;
            line-height: 2.0;
            max-width: 900px;
            margin: 0 auto;
            padding: 40px;
            background-color: #ffffff;
            color: #333;
            font-size: 18px;
        }

        /* Math is LTR even though the page is RTL */
        .mjx-chtml { direction: ltr; }

        h1, h2, h3, h4, h5, h6 {
            font-family: 'IBM Plex Sans Arabic', sans-serif;
            color: #2c3e50;
            margin-top: 1.5em;
            margin-bottom: 0.5em;
        }
        h1 { border-bottom: 3px solid #3498db; padding-bottom: 10px; }
        h2 { border-bottom: 2px solid #95a5a6; padding-bottom: 8px; }

        p { margin-bottom: 1em; text-align: justify; }

        code {
            background-color: #f5f5f5;
            padding: 2px 6px;
            border-radius: 3px;
            font-family: 'Roboto Mono', monospace;
            font-size: 0.9em;
            direction: ltr;
            display: inline-block;
        }
        pre {
            background-color: #f5f5f5;
            padding: 15px;
            border-radius: 5px;
            overflow-x: auto;
            border-left: 4px solid #3498db;
            direction: ltr;
        }
        pre code { background: none; padding: 0; }

        blockquote {
            border-right: 4px solid #3498db;
            padding-right: 15px;
            margin-right: 0;
            color: #555;
            font-style: italic;
        }

        table { border-collapse: collapse; width: 100%; margin: 20px 0; }
        th, td { border: 1px solid #ddd; padding: 12px; text-align: right; }
        th { background-color: #3498db; color: white; }
        tr:nth-child(even) { background-color: #f9f9f9; }

        hr { border: none; border-top: 2px solid #eee; margin: 40px 0; }

        .page-break {
            page-break-after: always;
            margin: 40px 0;
            border-top: 3px dashed #ccc;
        }
    </style>
</head>
<body>
%BODY%
</body>
</html>"#;

/// Print template: A4 page setup, MathML spans styled LTR, conversion
/// failures highlighted.
const PRINT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
    <meta charset="UTF-8">
    <title>%TITLE%</title>
    <style>
        @page { size: A4; margin: 2cm; }

        body {
            font-family: 'DejaVu Sans', 'Arial', sans-serif;
            line-height: 1.6;
            color: #333;
            font-size: 11pt;
        }

        h1 {
            color: #2c3e50;
            font-size: 24pt;
            margin: 0 0 12pt 0;
            border-bottom: 3pt solid #3498db;
            padding-bottom: 6pt;
            page-break-after: avoid;
        }
        h2 {
            color: #34495e;
            font-size: 18pt;
            margin: 18pt 0 9pt 0;
            border-bottom: 2pt solid #95a5a6;
            padding-bottom: 4pt;
            page-break-after: avoid;
        }
        h3 { color: #34495e; font-size: 14pt; margin: 14pt 0 7pt 0; page-break-after: avoid; }
        h4, h5, h6 { color: #555; margin: 12pt 0 6pt 0; page-break-after: avoid; }

        p { margin-bottom: 8pt; text-align: justify; orphans: 3; widows: 3; }

        .math-display {
            direction: ltr;
            text-align: center;
            margin: 12pt 0;
            padding: 8pt;
            background-color: #f9f9f9;
            border-left: 3pt solid #3498db;
            page-break-inside: avoid;
        }
        .math-inline { direction: ltr; font-family: 'DejaVu Sans', serif; }
        .math-error {
            background-color: #fff3cd;
            padding: 4pt;
            border: 1pt solid #ffc107;
            direction: ltr;
        }

        code {
            background-color: #f5f5f5;
            padding: 2pt 4pt;
            border-radius: 2pt;
            font-family: 'DejaVu Sans Mono', 'Courier New', monospace;
            font-size: 9pt;
            direction: ltr;
        }
        pre {
            background-color: #f5f5f5;
            padding: 10pt;
            border-radius: 4pt;
            border-left: 3pt solid #3498db;
            direction: ltr;
            overflow-x: auto;
            page-break-inside: avoid;
        }
        pre code { background: none; padding: 0; }

        blockquote {
            border-right: 3pt solid #3498db;
            padding-right: 12pt;
            margin-right: 0;
            margin-left: 12pt;
            color: #555;
            font-style: italic;
            page-break-inside: avoid;
        }

        table { border-collapse: collapse; width: 100%; margin: 12pt 0; page-break-inside: avoid; }
        th, td { border: 1pt solid #ddd; padding: 8pt; text-align: right; }
        th { background-color: #3498db; color: white; font-weight: bold; }
        tr:nth-child(even) { background-color: #f9f9f9; }

        hr { border: none; border-top: 1pt solid #ccc; margin: 20pt 0; }
    </style>
</head>
<body>
%BODY%
</body>
</html>"#;
