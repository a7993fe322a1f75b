//! # warraq
//!
//! Repair and render the Markdown that OCR services produce for scanned
//! Arabic PDF documents.
//!
//! ## Why this crate?
//!
//! Cloud OCR does the heavy lifting — layout analysis, recognition, image
//! extraction — but its Markdown output arrives with predictable damage:
//! math blocks with a `\left` and no `\right`, Arabic labels trapped inside
//! LTR math where they render scrambled, and image references that point at
//! placeholder names or at nothing at all. This crate fixes exactly those
//! artefacts with small deterministic passes, then renders the result as a
//! right-to-left HTML document (and, through a headless browser, as PDF).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. OCR      submit to the remote service, poll, save md + images
//!  ├─ 2. Balance  strip mismatched \left/\right pairs per math block
//!  ├─ 3. RTL      hoist Arabic \text{…} runs out of math blocks
//!  ├─ 4. Link     point image references at extracted page images
//!  ├─ 5. HTML     comrak + RTL template (MathJax or MathML)
//!  └─ 6. PDF      headless-browser print
//! ```
//!
//! Steps 2–4 are the repair core: pure text transforms that never fail —
//! anything unfixable is left exactly as it was.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warraq::{repair_file, RepairConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepairConfig::default();
//!     let output = repair_file("scan_output/document.md", &config).await?;
//!     eprintln!(
//!         "balanced {} blocks, linked {} images ({} unresolved)",
//!         output.stats.blocks_balanced,
//!         output.stats.images_linked,
//!         output.stats.images_unresolved,
//!     );
//!     println!("{}", output.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `warraq` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! warraq = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod repair;
pub mod scan;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrOptions, OcrOptionsBuilder, RepairConfig, RepairConfigBuilder, DEFAULT_OCR_URL};
pub use error::WarraqError;
pub use ocr::{save_outputs, OcrClient};
pub use output::{OcrJob, RepairOutput, RepairStats, SavedOcrOutputs};
pub use pipeline::diagnose::{scan_document, DiagnosticReport, Finding};
pub use pipeline::link::ImageIndex;
pub use progress::{JobProgress, NoopJobProgress};
pub use render::html::{render_html, render_html_mathml};
pub use render::pdf::{html_to_pdf, PrintOptions};
pub use repair::{repair_file, repair_markdown};
