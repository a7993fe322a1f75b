//! Output types: repair results, OCR job payloads, and run statistics.

use crate::pipeline::link::LinkStats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Counters describing what a repair run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairStats {
    /// Math blocks whose mismatched `\left`/`\right` pairs were stripped.
    pub blocks_balanced: usize,
    /// Arabic text runs hoisted out of math blocks.
    pub rtl_runs_extracted: usize,
    /// Image references rewritten to an existing file.
    pub images_linked: usize,
    /// Image references left unchanged for lack of a candidate file.
    pub images_unresolved: usize,
}

impl RepairStats {
    pub(crate) fn absorb_links(&mut self, links: LinkStats) {
        self.images_linked += links.linked;
        self.images_unresolved += links.unresolved;
    }

    /// True when no pass changed anything.
    pub fn is_noop(&self) -> bool {
        self.blocks_balanced == 0 && self.rtl_runs_extracted == 0 && self.images_linked == 0
    }
}

/// Result of [`crate::repair::repair_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutput {
    /// The repaired Markdown.
    pub markdown: String,
    /// What the passes changed.
    pub stats: RepairStats,
    /// Where the repaired Markdown was written.
    pub output_path: PathBuf,
    /// The image directory used for linking, when it existed.
    pub images_dir: Option<PathBuf>,
}

/// A completed OCR job as returned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrJob {
    /// Request id assigned by the service.
    pub request_id: String,
    /// The recognised document as Markdown.
    pub markdown: String,
    /// Extracted images: filename → base64 payload (possibly a data URI).
    pub images: HashMap<String, String>,
    /// Optional HTML rendition, when the service produced one.
    pub html: Option<String>,
    /// The raw completion response, kept for the metadata sidecar file.
    pub metadata: serde_json::Value,
}

/// Paths written by [`crate::ocr::save_outputs`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedOcrOutputs {
    /// The saved Markdown document.
    pub markdown_path: PathBuf,
    /// Directory the decoded images were written to, when the job had any.
    pub images_dir: Option<PathBuf>,
    /// Number of images successfully decoded and written.
    pub image_count: usize,
    /// Raw service response, saved as JSON for later inspection.
    pub metadata_path: PathBuf,
    /// The service's HTML rendition, when present.
    pub html_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_absorb_link_counters() {
        let mut stats = RepairStats::default();
        stats.absorb_links(LinkStats {
            linked: 3,
            unresolved: 1,
        });
        assert_eq!(stats.images_linked, 3);
        assert_eq!(stats.images_unresolved, 1);
    }

    #[test]
    fn noop_detection() {
        let mut stats = RepairStats::default();
        assert!(stats.is_noop());
        stats.blocks_balanced = 1;
        assert!(!stats.is_noop());
        // Unresolved references alone still count as a no-op run.
        let unresolved_only = RepairStats {
            images_unresolved: 4,
            ..Default::default()
        };
        assert!(unresolved_only.is_noop());
    }

    #[test]
    fn stats_serialize_round_trip() {
        let stats = RepairStats {
            blocks_balanced: 2,
            rtl_runs_extracted: 1,
            images_linked: 5,
            images_unresolved: 0,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: RepairStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }
}
