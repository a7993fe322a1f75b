//! Image reference linker: point Markdown image references at the extracted
//! page images that actually exist on disk.
//!
//! The OCR service emits two kinds of dangling references:
//!
//! * placeholder paths such as `_page_2_Figure_0.jpeg`, carrying a
//!   zero-indexed page number but naming no real file, and
//! * empty paths `![…]()`, whose page is only known from the nearest
//!   preceding `{N}---` pagination marker.
//!
//! Extracted images are named `page{N}_img{M}.{ext}` with a one-indexed page
//! number. The linker maps both reference kinds onto the first image of the
//! resolved page and rewrites the path relative to the Markdown file
//! (`<dir-name>/<file-name>`), so the document stays portable when both move
//! together. A reference whose page has no image is left byte-for-byte
//! unchanged — partial linking beats aborting the repair.

use crate::scan;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `page{N}_` token embedded in extracted image filenames (one-indexed).
static RE_FILE_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"page(\d+)_").unwrap());

/// `_page_{N}_` token inside placeholder reference paths (zero-indexed).
static RE_PLACEHOLDER_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_page_(\d+)_").unwrap());

/// Mapping from one-indexed page number to the ordered image files of that
/// page, built by scanning an image directory's filenames.
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    dir_name: String,
    by_page: BTreeMap<usize, Vec<PathBuf>>,
}

impl ImageIndex {
    /// Build an index from a directory of extracted images.
    ///
    /// A missing or empty directory yields an empty index: linking then
    /// becomes a no-op for every reference, and the repair run continues.
    pub fn scan(dir: &Path) -> Self {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("images directory not readable: {} ({e})", dir.display());
                return Self {
                    dir_name,
                    by_page: BTreeMap::new(),
                };
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        let mut by_page: BTreeMap<usize, Vec<PathBuf>> = BTreeMap::new();
        for file in files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(caps) = RE_FILE_PAGE.captures(&name) {
                if let Ok(page) = caps[1].parse::<usize>() {
                    by_page.entry(page).or_default().push(file);
                }
            }
        }
        debug!(
            pages = by_page.len(),
            dir = %dir.display(),
            "built image index"
        );

        Self { dir_name, by_page }
    }

    /// Name of the scanned directory, used as the relative path prefix.
    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }

    /// True when no page has any image.
    pub fn is_empty(&self) -> bool {
        self.by_page.is_empty()
    }

    /// Pages present in the index, ascending.
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_page.keys().copied()
    }

    /// First image file for a one-indexed page.
    pub fn first_for_page(&self, page: usize) -> Option<&Path> {
        self.by_page.get(&page).and_then(|v| v.first()).map(|p| p.as_path())
    }

    /// `<dir-name>/<file-name>` for the first image of a page.
    pub fn rel_path(&self, page: usize) -> Option<String> {
        self.first_for_page(page).and_then(|p| {
            p.file_name()
                .map(|n| format!("{}/{}", self.dir_name, n.to_string_lossy()))
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(dir_name: &str, pages: &[(usize, &[&str])]) -> Self {
        let by_page = pages
            .iter()
            .map(|(page, names)| {
                (*page, names.iter().map(PathBuf::from).collect::<Vec<_>>())
            })
            .collect();
        Self {
            dir_name: dir_name.to_string(),
            by_page,
        }
    }
}

/// Counters for a linking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    /// References rewritten to an existing image file.
    pub linked: usize,
    /// Placeholder or empty references left unchanged for lack of a match.
    pub unresolved: usize,
}

/// Link every placeholder-path and empty-path image reference in `text`.
pub fn link_document(text: &str, index: &ImageIndex) -> (String, LinkStats) {
    let mut stats = LinkStats::default();
    let linked = link_placeholders(text, index, &mut stats);
    let linked = link_empty_refs(&linked, index, &mut stats);
    (linked, stats)
}

/// Pass 1: references whose path embeds a zero-indexed `_page_{N}_` token.
fn link_placeholders(text: &str, index: &ImageIndex, stats: &mut LinkStats) -> String {
    let replacements: Vec<_> = scan::image_refs(text)
        .into_iter()
        .filter_map(|image| {
            let caps = RE_PLACEHOLDER_PAGE.captures(image.path)?;
            let page = caps[1].parse::<usize>().ok()? + 1;
            match index.rel_path(page) {
                Some(rel) => {
                    stats.linked += 1;
                    let alt = if image.alt.is_empty() { "Image" } else { image.alt };
                    Some((image.span, format!("![{}]({})", alt, rel)))
                }
                None => {
                    stats.unresolved += 1;
                    None
                }
            }
        })
        .collect();
    scan::splice(text, &replacements)
}

/// Pass 2: references with an empty path, resolved through the page-marker
/// fold. Every empty reference under one marker gets the same first image of
/// that page; see DESIGN.md for the open question on advancing through a
/// page's images.
fn link_empty_refs(text: &str, index: &ImageIndex, stats: &mut LinkStats) -> String {
    let had_trailing_newline = text.ends_with('\n');
    let mut out_lines: Vec<String> = Vec::new();

    for (page, line) in scan::fold_pages(text) {
        let replacements: Vec<_> = scan::image_refs(line)
            .into_iter()
            .filter(|image| image.path.is_empty())
            .filter_map(|image| {
                let resolved = page.and_then(|p| index.rel_path(p).map(|rel| (p, rel)));
                match resolved {
                    Some((p, rel)) => {
                        stats.linked += 1;
                        let alt = if image.alt.is_empty() {
                            format!("Image from page {}", p)
                        } else {
                            image.alt.to_string()
                        };
                        Some((image.span, format!("![{}]({})", alt, rel)))
                    }
                    None => {
                        stats.unresolved += 1;
                        None
                    }
                }
            })
            .collect();
        out_lines.push(scan::splice(line, &replacements));
    }

    let mut out = out_lines.join("\n");
    if had_trailing_newline {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ImageIndex {
        ImageIndex::from_parts(
            "doc_images",
            &[
                (3, &["doc_images/page3_img1.png", "doc_images/page3_img2.png"]),
                (16, &["doc_images/page16_img1.jpeg"]),
            ],
        )
    }

    #[test]
    fn placeholder_zero_indexed_page_is_converted() {
        // _page_2_… is zero-indexed page 2 → one-indexed page 3.
        let (out, stats) = link_document("![figure](_page_2_Figure_0.jpeg)", &index());
        assert_eq!(out, "![figure](doc_images/page3_img1.png)");
        assert_eq!(stats, LinkStats { linked: 1, unresolved: 0 });
    }

    #[test]
    fn placeholder_without_candidate_is_untouched() {
        let text = "![figure](_page_8_Figure_0.jpeg)";
        let (out, stats) = link_document(text, &index());
        assert_eq!(out, text);
        assert_eq!(stats, LinkStats { linked: 0, unresolved: 1 });
    }

    #[test]
    fn placeholder_with_empty_alt_gets_default() {
        let (out, _) = link_document("![](_page_2_Figure_0.jpeg)", &index());
        assert_eq!(out, "![Image](doc_images/page3_img1.png)");
    }

    #[test]
    fn empty_ref_resolves_through_page_marker() {
        let text = "{15}------------------\nsome text\n![]()\n";
        let (out, stats) = link_document(text, &index());
        assert!(out.contains("![Image from page 16](doc_images/page16_img1.jpeg)"));
        assert!(out.ends_with('\n'));
        assert_eq!(stats.linked, 1);
    }

    #[test]
    fn empty_ref_keeps_existing_alt() {
        let text = "{2}-----\n![chart]()";
        let (out, _) = link_document(text, &index());
        assert_eq!(out, "{2}-----\n![chart](doc_images/page3_img1.png)");
    }

    #[test]
    fn empty_ref_without_marker_is_untouched() {
        let text = "![]() no marker anywhere";
        let (out, stats) = link_document(text, &index());
        assert_eq!(out, text);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn repeated_empty_refs_share_first_image() {
        let text = "{2}-----\n![]()\nmore\n![]()";
        let (out, stats) = link_document(text, &index());
        assert_eq!(out.matches("doc_images/page3_img1.png").count(), 2);
        assert_eq!(stats.linked, 2);
    }

    #[test]
    fn already_linked_refs_are_ignored() {
        let text = "![ok](doc_images/page3_img1.png)";
        let (out, stats) = link_document(text, &index());
        assert_eq!(out, text);
        assert_eq!(stats, LinkStats::default());
    }

    #[test]
    fn empty_index_is_a_noop() {
        let text = "{0}-----\n![]()\n![f](_page_0_Figure_1.jpeg)";
        let (out, stats) = link_document(text, &ImageIndex::default());
        assert_eq!(out, text);
        assert_eq!(stats.linked, 0);
        assert_eq!(stats.unresolved, 2);
    }

    #[test]
    fn scan_missing_directory_yields_empty_index() {
        let idx = ImageIndex::scan(Path::new("/nonexistent/definitely_missing"));
        assert!(idx.is_empty());
    }

    #[test]
    fn scan_reads_page_numbers_from_filenames() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page3_img1.png"), b"png").unwrap();
        std::fs::write(dir.path().join("page3_img2.png"), b"png").unwrap();
        std::fs::write(dir.path().join("page16_img1.jpeg"), b"jpg").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let idx = ImageIndex::scan(dir.path());
        assert_eq!(idx.pages().collect::<Vec<_>>(), vec![3, 16]);
        // Ordered by filename: img1 before img2.
        assert!(idx
            .rel_path(3)
            .unwrap()
            .ends_with("page3_img1.png"));
    }
}
