//! Error types for the warraq library.
//!
//! Only *fatal* conditions surface as [`WarraqError`]: a missing input file,
//! a failed or timed-out OCR job, an unwritable output path. Everything
//! scoped to a single math block or image reference degrades locally instead
//! — a reference with no matching image file is left byte-for-byte unchanged,
//! and a math block the MathML converter rejects is rendered as a visibly
//! marked literal fallback. Those outcomes are reported through
//! [`crate::output::RepairStats`] and [`crate::pipeline::diagnose`], never as
//! `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the warraq library.
#[derive(Debug, Error)]
pub enum WarraqError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── OCR job errors ────────────────────────────────────────────────────
    /// No API key was provided and none was found in the environment.
    #[error(
        "No OCR API key configured.\n\
Set DATALAB_API_KEY or pass --api-key.\n\
Get a key from: https://www.datalab.to/"
    )]
    MissingApiKey,

    /// The submit request was rejected or failed to reach the API.
    #[error("Failed to submit OCR job: {reason}")]
    SubmitFailed { reason: String },

    /// The OCR service reported the job as failed.
    #[error("OCR job failed: {detail}")]
    JobFailed { detail: String },

    /// The job did not complete within the configured poll budget.
    #[error("OCR job still not complete after {polls} polls ({secs}s)\nIncrease --max-polls or try again later.")]
    PollTimeout { polls: u32, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Browser (HTML→PDF) errors ─────────────────────────────────────────
    /// The headless browser binary was not found on PATH.
    #[error(
        "Browser '{binary}' not found.\n\
Install it (e.g. apt install chromium-browser) or point --browser at an existing binary."
    )]
    BrowserNotFound { binary: String },

    /// The browser exited non-zero or produced no PDF.
    #[error("Browser PDF export failed: {detail}")]
    BrowserFailed { detail: String },

    /// The browser did not finish within the timeout.
    #[error("Browser PDF export timed out after {secs}s\nIncrease --print-timeout for documents with heavy math.")]
    BrowserTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
