//! Remote OCR job client: submit a PDF, poll until done, save the outputs.
//!
//! The OCR service owns everything hard — layout analysis, recognition,
//! image extraction. This module is deliberately thin plumbing around its
//! two endpoints:
//!
//! 1. `POST <base_url>` — multipart submit, returns a request id and a
//!    check URL
//! 2. `GET <check_url>` — poll at a fixed interval with a bounded budget
//!
//! The client is an explicit handle: construct it once with
//! [`OcrClient::new`], reuse it across documents. There is no process-global
//! engine state.
//!
//! A failed job or an exhausted poll budget is **fatal** for that document —
//! no partial Markdown is produced. Transient poll-request errors, by
//! contrast, are logged and the loop keeps going; a dropped connection two
//! minutes into a ten-minute job should not throw the job away.

use crate::config::OcrOptions;
use crate::error::WarraqError;
use crate::output::{OcrJob, SavedOcrOutputs};
use crate::progress::{JobProgress, NoopJobProgress};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    success: bool,
    error: Option<String>,
    request_id: Option<String>,
    request_check_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    status: Option<String>,
    error: Option<String>,
    markdown: Option<String>,
    #[serde(default)]
    images: Option<HashMap<String, String>>,
    html: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Handle to the remote OCR service.
#[derive(Debug)]
pub struct OcrClient {
    http: reqwest::Client,
    api_key: String,
    options: OcrOptions,
}

impl OcrClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, options: OcrOptions) -> Result<Self, WarraqError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WarraqError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .build()
            .map_err(|e| WarraqError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            options,
        })
    }

    /// Create a client from the `DATALAB_API_KEY` environment variable.
    pub fn from_env(options: OcrOptions) -> Result<Self, WarraqError> {
        let key = std::env::var("DATALAB_API_KEY").unwrap_or_default();
        Self::new(key, options)
    }

    /// The options this client was built with.
    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    /// Run a PDF through the OCR service: validate, submit, poll.
    pub async fn process(&self, pdf_path: &Path) -> Result<OcrJob, WarraqError> {
        self.process_with_progress(pdf_path, &NoopJobProgress).await
    }

    /// Like [`process`](Self::process), with progress callbacks.
    pub async fn process_with_progress(
        &self,
        pdf_path: &Path,
        progress: &dyn JobProgress,
    ) -> Result<OcrJob, WarraqError> {
        let bytes = read_pdf(pdf_path).await?;
        let filename = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        info!("submitting {} ({} bytes) for OCR", filename, bytes.len());
        let (request_id, check_url) = self.submit(bytes, &filename).await?;
        progress.on_submitted(&request_id);
        debug!(request_id = %request_id, "job accepted, polling");

        let job = self.poll(&request_id, &check_url, progress).await;
        match &job {
            Ok(job) => progress.on_complete(job.images.len()),
            Err(e) => progress.on_failed(&e.to_string()),
        }
        job
    }

    async fn submit(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<(String, String), WarraqError> {
        let o = &self.options;
        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| WarraqError::Internal(format!("multipart: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("force_ocr", bool_field(o.force_ocr))
            .text("paginate", bool_field(o.paginate))
            .text("output_format", "markdown")
            .text("use_llm", bool_field(o.use_llm))
            .text("strip_existing_ocr", bool_field(o.strip_existing_ocr))
            .text(
                "disable_image_extraction",
                bool_field(o.disable_image_extraction),
            );

        let response = self
            .http
            .post(&o.base_url)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WarraqError::SubmitFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WarraqError::SubmitFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let submitted: SubmitResponse =
            response.json().await.map_err(|e| WarraqError::SubmitFailed {
                reason: format!("malformed response: {e}"),
            })?;

        if !submitted.success {
            return Err(WarraqError::SubmitFailed {
                reason: submitted
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        match (submitted.request_id, submitted.request_check_url) {
            (Some(id), Some(url)) => Ok((id, url)),
            _ => Err(WarraqError::SubmitFailed {
                reason: "response missing request_id or request_check_url".to_string(),
            }),
        }
    }

    async fn poll(
        &self,
        request_id: &str,
        check_url: &str,
        progress: &dyn JobProgress,
    ) -> Result<OcrJob, WarraqError> {
        let o = &self.options;
        for attempt in 1..=o.max_polls {
            sleep(o.poll_interval).await;

            let response = match self
                .http
                .get(check_url)
                .header("X-Api-Key", &self.api_key)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("poll {attempt}/{}: request failed: {e}", o.max_polls);
                    continue;
                }
            };

            let raw: serde_json::Value = match response.json().await {
                Ok(v) => v,
                Err(e) => {
                    warn!("poll {attempt}/{}: malformed body: {e}", o.max_polls);
                    continue;
                }
            };
            let check: CheckResponse =
                serde_json::from_value(raw.clone()).unwrap_or(CheckResponse {
                    status: None,
                    error: None,
                    markdown: None,
                    images: None,
                    html: None,
                });

            let status = check.status.as_deref().unwrap_or("unknown");
            progress.on_poll(attempt, o.max_polls, status);

            match status {
                "complete" => {
                    info!("OCR job {request_id} complete after {attempt} polls");
                    return Ok(OcrJob {
                        request_id: request_id.to_string(),
                        markdown: check.markdown.unwrap_or_default(),
                        images: check.images.unwrap_or_default(),
                        html: check.html,
                        metadata: raw,
                    });
                }
                "failed" => {
                    return Err(WarraqError::JobFailed {
                        detail: check
                            .error
                            .unwrap_or_else(|| "unknown error".to_string()),
                    });
                }
                other => {
                    debug!("poll {attempt}/{}: status {other}", o.max_polls);
                }
            }
        }

        Err(WarraqError::PollTimeout {
            polls: o.max_polls,
            secs: o.poll_interval.as_secs() * o.max_polls as u64,
        })
    }
}

fn bool_field(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

/// Read a PDF file, mapping the usual failure modes and checking the magic.
async fn read_pdf(path: &Path) -> Result<Vec<u8>, WarraqError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(WarraqError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(WarraqError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(WarraqError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    Ok(bytes)
}

// ── Saving outputs ───────────────────────────────────────────────────────

/// Decode an API image payload, tolerating a `data:image/…;base64,` prefix.
fn decode_image_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let b64 = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    BASE64.decode(b64.trim())
}

/// Pick a safe output filename for an API image, sniffing the format when
/// the API name carries no extension.
fn image_filename(api_name: &str, bytes: &[u8]) -> String {
    // Strip any path components the service may have included.
    let name = Path::new(api_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    if name.contains('.') {
        return name;
    }
    match image::guess_format(bytes) {
        Ok(format) => match format.extensions_str().first() {
            Some(ext) => format!("{name}.{ext}"),
            None => name,
        },
        Err(_) => name,
    }
}

/// Write a completed job's Markdown, images, and metadata under `out_dir`.
///
/// Layout matches what the repair pipeline expects to find:
///
/// ```text
/// out_dir/
///   {stem}.md
///   {stem}_images/<image files>
///   {stem}_metadata.json
///   {stem}.html          (only when the service produced HTML)
/// ```
///
/// Image references in the Markdown that name a saved file bare
/// (`(figure.jpeg)`) are rewritten to go through the images directory
/// (`({stem}_images/figure.jpeg)`). A payload that fails to decode is
/// logged and skipped; the rest of the job is still saved.
pub async fn save_outputs(
    job: &OcrJob,
    stem: &str,
    out_dir: &Path,
) -> Result<SavedOcrOutputs, WarraqError> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| WarraqError::OutputWriteFailed {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

    let mut markdown = job.markdown.clone();
    let mut images_dir: Option<PathBuf> = None;
    let mut image_count = 0usize;

    if !job.images.is_empty() {
        let dir_name = format!("{stem}_images");
        let dir = out_dir.join(&dir_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| WarraqError::OutputWriteFailed {
                path: dir.clone(),
                source: e,
            })?;

        for (api_name, payload) in &job.images {
            let bytes = match decode_image_payload(payload) {
                Ok(b) => b,
                Err(e) => {
                    warn!("skipping image {api_name}: bad base64 ({e})");
                    continue;
                }
            };
            let filename = image_filename(api_name, &bytes);
            let path = dir.join(&filename);
            if let Err(e) = tokio::fs::write(&path, &bytes).await {
                warn!("skipping image {api_name}: write failed ({e})");
                continue;
            }
            image_count += 1;
            debug!("saved image {}", path.display());

            // Point bare references at the saved copy.
            markdown = markdown.replace(
                &format!("({api_name})"),
                &format!("({dir_name}/{filename})"),
            );
        }
        info!("saved {image_count} images to {}", dir.display());
        images_dir = Some(dir);
    }

    let markdown_path = out_dir.join(format!("{stem}.md"));
    crate::repair::write_atomic(&markdown_path, &markdown).await?;
    info!("saved Markdown: {}", markdown_path.display());

    let metadata_path = out_dir.join(format!("{stem}_metadata.json"));
    let metadata_json = serde_json::to_string_pretty(&job.metadata)
        .map_err(|e| WarraqError::Internal(format!("metadata serialise: {e}")))?;
    crate::repair::write_atomic(&metadata_path, &metadata_json).await?;

    let html_path = match &job.html {
        Some(html) => {
            let path = out_dir.join(format!("{stem}.html"));
            crate::repair::write_atomic(&path, html).await?;
            Some(path)
        }
        None => None,
    };

    Ok(SavedOcrOutputs {
        markdown_path,
        images_dir,
        image_count,
        metadata_path,
        html_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn submit_response_deserializes() {
        let json = r#"{
            "success": true,
            "error": null,
            "request_id": "abc123",
            "request_check_url": "https://www.datalab.to/api/v1/marker/abc123"
        }"#;
        let r: SubmitResponse = serde_json::from_str(json).unwrap();
        assert!(r.success);
        assert_eq!(r.request_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn check_response_tolerates_missing_fields() {
        let r: CheckResponse = serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        assert_eq!(r.status.as_deref(), Some("processing"));
        assert!(r.markdown.is_none());
        assert!(r.images.is_none());
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = OcrClient::new("  ", OcrOptions::default()).unwrap_err();
        assert!(matches!(err, WarraqError::MissingApiKey));
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        let encoded = BASE64.encode(b"hello");
        let with_prefix = format!("data:image/png;base64,{encoded}");
        assert_eq!(decode_image_payload(&with_prefix).unwrap(), b"hello");
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn filenames_keep_their_extension() {
        assert_eq!(image_filename("figure.jpeg", b""), "figure.jpeg");
    }

    #[test]
    fn extensionless_filenames_are_sniffed() {
        assert_eq!(image_filename("figure", PNG_MAGIC), "figure.png");
    }

    #[test]
    fn path_components_are_stripped_from_api_names() {
        assert_eq!(image_filename("../../evil.png", b""), "evil.png");
    }

    #[tokio::test]
    async fn read_pdf_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        tokio::fs::write(&path, b"hello world").await.unwrap();
        let err = read_pdf(&path).await.unwrap_err();
        assert!(matches!(err, WarraqError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn read_pdf_accepts_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        tokio::fs::write(&path, b"%PDF-1.7 rest").await.unwrap();
        assert!(read_pdf(&path).await.is_ok());
    }

    #[tokio::test]
    async fn save_outputs_writes_the_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = HashMap::new();
        images.insert("figure.jpeg".to_string(), BASE64.encode(b"jpegdata"));

        let job = OcrJob {
            request_id: "abc".into(),
            markdown: "![fig](figure.jpeg)\n".into(),
            images,
            html: Some("<html></html>".into()),
            metadata: serde_json::json!({"status": "complete"}),
        };

        let saved = save_outputs(&job, "doc", dir.path()).await.unwrap();
        assert_eq!(saved.image_count, 1);
        assert_eq!(saved.markdown_path, dir.path().join("doc.md"));
        assert_eq!(saved.images_dir, Some(dir.path().join("doc_images")));
        assert!(saved.html_path.is_some());

        let md = tokio::fs::read_to_string(&saved.markdown_path).await.unwrap();
        assert_eq!(md, "![fig](doc_images/figure.jpeg)\n");
        let img = tokio::fs::read(dir.path().join("doc_images/figure.jpeg"))
            .await
            .unwrap();
        assert_eq!(img, b"jpegdata");
    }

    #[tokio::test]
    async fn save_outputs_skips_undecodable_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut images = HashMap::new();
        images.insert("bad.png".to_string(), "!!not base64!!".to_string());
        images.insert("good.png".to_string(), BASE64.encode(b"png"));

        let job = OcrJob {
            request_id: "abc".into(),
            markdown: String::new(),
            images,
            html: None,
            metadata: serde_json::Value::Null,
        };

        let saved = save_outputs(&job, "doc", dir.path()).await.unwrap();
        assert_eq!(saved.image_count, 1);
    }
}
