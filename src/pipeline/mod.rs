//! Repair passes for OCR-produced Markdown.
//!
//! Each submodule implements exactly one transformation, all of them pure
//! `&str → String` over the whole document. Keeping passes separate makes
//! each independently testable and lets callers disable any of them through
//! [`crate::config::RepairConfig`].
//!
//! ## Data Flow
//!
//! ```text
//! raw markdown ──▶ balance ──▶ rtl ──▶ link ──▶ repaired markdown
//!                  (\left /    (hoist  (page
//!                   \right)     Arabic) images)
//! ```
//!
//! 1. [`balance`]  — strip mismatched `\left`/`\right` pairs from math blocks
//! 2. [`rtl`]      — hoist Arabic `\text{…}` runs out of math blocks
//! 3. [`link`]     — rewrite placeholder and empty image references to
//!    extracted page images
//! 4. [`diagnose`] — read-only report of artefacts worth a manual look
//!    (not part of the transform chain)
//!
//! Stages run strictly in this order and each consumes its predecessor's
//! full output. The orchestration lives in [`crate::repair`].

pub mod balance;
pub mod diagnose;
pub mod link;
pub mod rtl;
