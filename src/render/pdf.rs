//! HTML → PDF export through a headless Chromium.
//!
//! A real browser engine is the only renderer that handles MathJax output,
//! web fonts, and bidirectional text all at once, so PDF export shells out to
//! Chromium in headless print mode rather than re-implementing layout. The
//! `--virtual-time-budget` flag gives MathJax time to typeset before the
//! print snapshot is taken.

use crate::error::WarraqError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Options for the headless-browser print step.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Browser binary to invoke. Default: `chromium-browser`.
    pub browser: String,
    /// Virtual time granted to in-page scripts (MathJax) in milliseconds.
    /// Default: 10 000.
    pub virtual_time_budget_ms: u64,
    /// Wall-clock timeout for the whole export in seconds. Default: 30.
    pub timeout_secs: u64,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            browser: "chromium-browser".to_string(),
            virtual_time_budget_ms: 10_000,
            timeout_secs: 30,
        }
    }
}

/// Print an HTML file to PDF with a headless browser.
///
/// The HTML file's own directory is the base for relative image paths, so
/// the file should sit next to its `{stem}_images` directory.
pub async fn html_to_pdf(
    html_path: &Path,
    pdf_path: &Path,
    options: &PrintOptions,
) -> Result<(), WarraqError> {
    if !html_path.exists() {
        return Err(WarraqError::FileNotFound {
            path: html_path.to_path_buf(),
        });
    }

    let html_abs = html_path
        .canonicalize()
        .map_err(|e| WarraqError::Internal(format!("cannot canonicalise html path: {e}")))?;

    let mut cmd = Command::new(&options.browser);
    cmd.arg("--headless")
        .arg("--disable-gpu")
        .arg("--no-pdf-header-footer")
        .arg(format!("--print-to-pdf={}", pdf_path.display()))
        .arg("--run-all-compositor-stages-before-draw")
        .arg(format!(
            "--virtual-time-budget={}",
            options.virtual_time_budget_ms
        ))
        .arg(format!("file://{}", html_abs.display()))
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    debug!(browser = %options.browser, "spawning headless browser");

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WarraqError::BrowserNotFound {
                binary: options.browser.clone(),
            }
        } else {
            WarraqError::BrowserFailed {
                detail: e.to_string(),
            }
        }
    })?;

    let output = tokio::time::timeout(
        Duration::from_secs(options.timeout_secs),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| WarraqError::BrowserTimeout {
        secs: options.timeout_secs,
    })?
    .map_err(|e| WarraqError::BrowserFailed {
        detail: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(WarraqError::BrowserFailed {
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if !pdf_path.exists() {
        return Err(WarraqError::BrowserFailed {
            detail: format!("browser exited cleanly but wrote no PDF at {}", pdf_path.display()),
        });
    }

    info!("PDF created: {}", pdf_path.display());
    Ok(())
}
