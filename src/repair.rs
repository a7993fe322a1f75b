//! Top-level repair entry points.
//!
//! [`repair_markdown`] is the pure core: balance → rtl → link, each stage
//! fully consuming its input before the next runs. [`repair_file`] wraps it
//! with file I/O, derives the sibling image directory, and writes the result
//! to a new path so the original OCR output is never touched.

use crate::config::RepairConfig;
use crate::error::WarraqError;
use crate::output::{RepairOutput, RepairStats};
use crate::pipeline::link::ImageIndex;
use crate::pipeline::{balance, link, rtl};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Repair a Markdown document in memory.
///
/// Never fails: every pass degrades locally (an unresolvable image reference
/// is left unchanged, a balanced math block passes through untouched).
pub fn repair_markdown(
    text: &str,
    index: &ImageIndex,
    config: &RepairConfig,
) -> (String, RepairStats) {
    let mut stats = RepairStats::default();
    let mut current = text.to_string();

    if config.balance_delimiters {
        let (balanced, count) = balance::balance_document(&current);
        current = balanced;
        stats.blocks_balanced = count;
        debug!(count, "delimiter balance pass done");
    }

    if config.extract_rtl {
        let (extracted, count) = rtl::extract_document(&current);
        current = extracted;
        stats.rtl_runs_extracted = count;
        debug!(count, "rtl extraction pass done");
    }

    if config.link_images {
        let (linked, link_stats) = link::link_document(&current, index);
        current = linked;
        stats.absorb_links(link_stats);
        debug!(
            linked = link_stats.linked,
            unresolved = link_stats.unresolved,
            "image link pass done"
        );
    }

    (current, stats)
}

/// Derive the conventional image directory for a Markdown file:
/// `{stem}_images` next to it.
pub fn default_images_dir(md_path: &Path) -> PathBuf {
    let stem = md_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    md_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_images"))
}

/// Derive the output path for a repaired document: `{stem}_repaired.md`
/// next to the input.
pub fn default_output_path(md_path: &Path) -> PathBuf {
    let stem = md_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    md_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}_repaired.md"))
}

/// Repair a Markdown file on disk, writing the result to a new file.
///
/// The image directory is `config.images_dir` when set, otherwise
/// `{stem}_images` beside the input. A missing directory downgrades linking
/// to a no-op; the other passes still run.
///
/// Output goes to `{stem}_repaired.md` beside the input (atomic write:
/// temp file + rename). The input file is never modified.
pub async fn repair_file(
    md_path: impl AsRef<Path>,
    config: &RepairConfig,
) -> Result<RepairOutput, WarraqError> {
    let md_path = md_path.as_ref();
    let text = read_markdown(md_path).await?;

    let images_dir = config
        .images_dir
        .clone()
        .unwrap_or_else(|| default_images_dir(md_path));

    let index = if config.link_images {
        let index = ImageIndex::scan(&images_dir);
        if index.is_empty() {
            warn!(
                "no page images under {}; image linking will be a no-op",
                images_dir.display()
            );
        }
        index
    } else {
        ImageIndex::default()
    };

    let (markdown, stats) = repair_markdown(&text, &index, config);

    let output_path = default_output_path(md_path);
    write_atomic(&output_path, &markdown).await?;
    info!(
        balanced = stats.blocks_balanced,
        rtl = stats.rtl_runs_extracted,
        linked = stats.images_linked,
        unresolved = stats.images_unresolved,
        "repaired {} → {}",
        md_path.display(),
        output_path.display()
    );

    Ok(RepairOutput {
        markdown,
        stats,
        output_path,
        images_dir: images_dir.is_dir().then_some(images_dir),
    })
}

async fn read_markdown(path: &Path) -> Result<String, WarraqError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(WarraqError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(WarraqError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Atomic write: temp file + rename, so readers never see a partial file.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), WarraqError> {
    fn write_failed(path: &Path, source: std::io::Error) -> WarraqError {
        WarraqError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        }
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_failed(path, e))?;
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| write_failed(path, e))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| write_failed(path, e))?;
    Ok(())
}
