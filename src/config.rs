//! Configuration types for the repair pipeline and the OCR client.
//!
//! All behaviour is controlled through two structs, each built via a
//! validating builder: [`RepairConfig`] for the Markdown repair passes and
//! [`OcrOptions`] for the remote OCR job. Keeping every knob in one place
//! makes configs trivial to share, log, and diff between runs.

use crate::error::WarraqError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a Markdown repair run.
///
/// Built via [`RepairConfig::builder()`] or [`RepairConfig::default()`].
///
/// # Example
/// ```rust
/// use warraq::RepairConfig;
///
/// let config = RepairConfig::builder()
///     .long_alt_threshold(80)
///     .extract_rtl(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Directory containing the extracted page images.
    ///
    /// When `None`, [`crate::repair::repair_file`] derives it from the
    /// Markdown path as `{stem}_images` in the same directory — the layout
    /// the OCR save step produces.
    pub images_dir: Option<PathBuf>,

    /// Run the `\left`/`\right` delimiter balancer. Default: true.
    pub balance_delimiters: bool,

    /// Hoist Arabic `\text{…}` runs out of math blocks. Default: true.
    pub extract_rtl: bool,

    /// Relink image references to extracted page images. Default: true.
    pub link_images: bool,

    /// Alt text longer than this is flagged by the diagnostic scanner as a
    /// figure description that leaked into the alt attribute. Default: 50.
    pub long_alt_threshold: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            images_dir: None,
            balance_delimiters: true,
            extract_rtl: true,
            link_images: true,
            long_alt_threshold: 50,
        }
    }
}

impl RepairConfig {
    /// Create a new builder for `RepairConfig`.
    pub fn builder() -> RepairConfigBuilder {
        RepairConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RepairConfig`].
#[derive(Debug)]
pub struct RepairConfigBuilder {
    config: RepairConfig,
}

impl RepairConfigBuilder {
    pub fn images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.images_dir = Some(dir.into());
        self
    }

    pub fn balance_delimiters(mut self, v: bool) -> Self {
        self.config.balance_delimiters = v;
        self
    }

    pub fn extract_rtl(mut self, v: bool) -> Self {
        self.config.extract_rtl = v;
        self
    }

    pub fn link_images(mut self, v: bool) -> Self {
        self.config.link_images = v;
        self
    }

    pub fn long_alt_threshold(mut self, n: usize) -> Self {
        self.config.long_alt_threshold = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RepairConfig, WarraqError> {
        if self.config.long_alt_threshold == 0 {
            return Err(WarraqError::InvalidConfig(
                "long_alt_threshold must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Default endpoint of the hosted OCR service.
pub const DEFAULT_OCR_URL: &str = "https://www.datalab.to/api/v1/marker";

/// Options for a remote OCR job.
///
/// These map one-to-one onto the form fields of the submit request plus the
/// local polling budget. The defaults are tuned for scanned Arabic documents
/// whose embedded text layer is unreliable: OCR is forced, any existing text
/// layer is stripped, and output is paginated so page markers appear in the
/// Markdown for the image linker to consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOptions {
    /// Submit endpoint. Default: [`DEFAULT_OCR_URL`].
    pub base_url: String,

    /// Re-OCR every page even when the PDF carries a text layer. Default: true.
    pub force_ocr: bool,

    /// Emit `{N}---` page markers between pages. Default: true.
    ///
    /// The image linker resolves empty references through these markers, so
    /// turning this off also disables empty-reference linking downstream.
    pub paginate: bool,

    /// Ask the service to refine output with an LLM (slower, costs more).
    /// Default: false.
    pub use_llm: bool,

    /// Discard the document's existing (often garbled) OCR text layer.
    /// Default: true.
    pub strip_existing_ocr: bool,

    /// Skip image extraction on the service side. Default: false.
    pub disable_image_extraction: bool,

    /// Delay between status polls. Default: 2 s.
    pub poll_interval: Duration,

    /// Maximum number of status polls before giving up. Default: 300
    /// (10 minutes at the default interval).
    pub max_polls: u32,

    /// Per-request HTTP timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OCR_URL.to_string(),
            force_ocr: true,
            paginate: true,
            use_llm: false,
            strip_existing_ocr: true,
            disable_image_extraction: false,
            poll_interval: Duration::from_secs(2),
            max_polls: 300,
            request_timeout_secs: 120,
        }
    }
}

impl OcrOptions {
    /// Create a new builder for `OcrOptions`.
    pub fn builder() -> OcrOptionsBuilder {
        OcrOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`OcrOptions`].
#[derive(Debug)]
pub struct OcrOptionsBuilder {
    options: OcrOptions,
}

impl OcrOptionsBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = url.into();
        self
    }

    pub fn force_ocr(mut self, v: bool) -> Self {
        self.options.force_ocr = v;
        self
    }

    pub fn paginate(mut self, v: bool) -> Self {
        self.options.paginate = v;
        self
    }

    pub fn use_llm(mut self, v: bool) -> Self {
        self.options.use_llm = v;
        self
    }

    pub fn strip_existing_ocr(mut self, v: bool) -> Self {
        self.options.strip_existing_ocr = v;
        self
    }

    pub fn disable_image_extraction(mut self, v: bool) -> Self {
        self.options.disable_image_extraction = v;
        self
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.options.poll_interval = d;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.options.max_polls = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.options.request_timeout_secs = secs;
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<OcrOptions, WarraqError> {
        let o = &self.options;
        if o.base_url.is_empty() {
            return Err(WarraqError::InvalidConfig("base_url must not be empty".into()));
        }
        if o.max_polls == 0 {
            return Err(WarraqError::InvalidConfig("max_polls must be ≥ 1".into()));
        }
        if o.poll_interval.is_zero() {
            return Err(WarraqError::InvalidConfig(
                "poll_interval must be non-zero".into(),
            ));
        }
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_defaults() {
        let c = RepairConfig::default();
        assert!(c.balance_delimiters);
        assert!(c.extract_rtl);
        assert!(c.link_images);
        assert_eq!(c.long_alt_threshold, 50);
        assert!(c.images_dir.is_none());
    }

    #[test]
    fn repair_builder_rejects_zero_threshold() {
        let err = RepairConfig::builder().long_alt_threshold(0).build();
        assert!(err.is_err());
    }

    #[test]
    fn ocr_defaults_target_hosted_service() {
        let o = OcrOptions::default();
        assert_eq!(o.base_url, DEFAULT_OCR_URL);
        assert_eq!(o.max_polls, 300);
        assert_eq!(o.poll_interval, Duration::from_secs(2));
        assert!(o.force_ocr);
        assert!(o.strip_existing_ocr);
        assert!(!o.use_llm);
    }

    #[test]
    fn ocr_builder_rejects_zero_polls() {
        assert!(OcrOptions::builder().max_polls(0).build().is_err());
    }

    #[test]
    fn ocr_builder_overrides() {
        let o = OcrOptions::builder()
            .use_llm(true)
            .max_polls(10)
            .poll_interval(Duration::from_millis(500))
            .build()
            .unwrap();
        assert!(o.use_llm);
        assert_eq!(o.max_polls, 10);
        assert_eq!(o.poll_interval, Duration::from_millis(500));
    }
}
