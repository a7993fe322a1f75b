//! CLI binary for warraq.
//!
//! A thin shim over the library crate that maps subcommands onto the OCR
//! client, the repair pipeline, and the renderers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use warraq::{
    html_to_pdf, render_html, render_html_mathml, repair_file, save_outputs, scan_document,
    ImageIndex, JobProgress, OcrClient, OcrOptions, PrintOptions, RepairConfig,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── OCR progress spinner ─────────────────────────────────────────────────────

/// Terminal spinner fed by the OCR client's poll events.
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("OCR");
        bar.set_message("Submitting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl JobProgress for SpinnerProgress {
    fn on_submitted(&self, request_id: &str) {
        self.bar.set_message(format!("submitted ({request_id})"));
    }

    fn on_poll(&self, attempt: u32, max: u32, status: &str) {
        self.bar
            .set_message(format!("{status} (poll {attempt}/{max})"));
    }

    fn on_complete(&self, image_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} OCR complete ({} images)",
            green("✔"),
            bold(&image_count.to_string())
        );
    }

    fn on_failed(&self, detail: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} OCR failed: {}", red("✘"), detail);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run a scanned PDF through the OCR service
  warraq ocr thesis.pdf -o ocr_output/

  # Repair the saved Markdown (balance math, hoist Arabic, link images)
  warraq repair ocr_output/thesis.md

  # Render repaired Markdown as an RTL HTML document
  warraq html ocr_output/thesis.md

  # Print to PDF through headless Chromium
  warraq pdf ocr_output/thesis.md

  # Report OCR artefacts without changing anything
  warraq check ocr_output/thesis.md

ENVIRONMENT VARIABLES:
  DATALAB_API_KEY   API key for the OCR service (https://www.datalab.to/)

TYPICAL WORKFLOW:
  1. export DATALAB_API_KEY=...
  2. warraq ocr document.pdf -o out/
  3. warraq repair out/document.md
  4. warraq pdf out/document_repaired.md
"#;

/// Repair and render OCR output for scanned Arabic PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "warraq",
    version,
    about = "Repair and render OCR Markdown for scanned Arabic PDFs",
    long_about = "Submit scanned PDFs to a cloud OCR service, repair the returned Markdown \
(mismatched LaTeX delimiters, embedded RTL text, dangling image references), and render \
it as right-to-left HTML or PDF.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a PDF to the OCR service and save Markdown + images.
    Ocr {
        /// Path to the PDF file.
        pdf: PathBuf,

        /// Directory to save outputs into.
        #[arg(short, long)]
        output: PathBuf,

        /// OCR API key.
        #[arg(long, env = "DATALAB_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Ask the service to refine output with an LLM (slower, costs more).
        #[arg(long)]
        use_llm: bool,

        /// Delay between status polls, in milliseconds.
        #[arg(long, default_value_t = 2000)]
        poll_interval_ms: u64,

        /// Maximum number of status polls before giving up.
        #[arg(long, default_value_t = 300)]
        max_polls: u32,
    },

    /// Repair a Markdown file: balance math, hoist Arabic runs, link images.
    Repair {
        /// Path to the Markdown file.
        input: PathBuf,

        /// Directory of extracted page images (default: {stem}_images).
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },

    /// Render a Markdown file as a right-to-left HTML document.
    Html {
        /// Path to the Markdown file.
        input: PathBuf,

        /// Write HTML here instead of {stem}.html next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Convert math to MathML instead of embedding MathJax.
        #[arg(long)]
        mathml: bool,

        /// Render the file as-is, skipping the repair passes.
        #[arg(long)]
        no_repair: bool,

        /// Directory of extracted page images (default: {stem}_images).
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },

    /// Render a Markdown file to PDF via headless Chromium.
    Pdf {
        /// Path to the Markdown file.
        input: PathBuf,

        /// Write PDF here instead of {stem}.pdf next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Browser binary to invoke.
        #[arg(long, default_value = "chromium-browser")]
        browser: String,

        /// Wall-clock timeout for the print step, in seconds.
        #[arg(long, default_value_t = 30)]
        print_timeout: u64,

        /// Render the file as-is, skipping the repair passes.
        #[arg(long)]
        no_repair: bool,

        /// Directory of extracted page images (default: {stem}_images).
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },

    /// Report OCR artefacts (typos, unbalanced math, suspect images).
    Check {
        /// Path to the Markdown file.
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Ocr {
            pdf,
            output,
            api_key,
            use_llm,
            poll_interval_ms,
            max_polls,
        } => {
            run_ocr(
                &pdf,
                &output,
                api_key,
                use_llm,
                poll_interval_ms,
                max_polls,
                cli.quiet,
            )
            .await
        }
        Command::Repair { input, images_dir } => run_repair(&input, images_dir, cli.quiet).await,
        Command::Html {
            input,
            output,
            mathml,
            no_repair,
            images_dir,
        } => run_html(&input, output, mathml, no_repair, images_dir, cli.quiet).await,
        Command::Pdf {
            input,
            output,
            browser,
            print_timeout,
            no_repair,
            images_dir,
        } => {
            run_pdf(
                &input,
                output,
                browser,
                print_timeout,
                no_repair,
                images_dir,
                cli.quiet,
            )
            .await
        }
        Command::Check { input } => run_check(&input).await,
    }
}

async fn run_ocr(
    pdf: &Path,
    output: &Path,
    api_key: Option<String>,
    use_llm: bool,
    poll_interval_ms: u64,
    max_polls: u32,
    quiet: bool,
) -> Result<()> {
    let options = OcrOptions::builder()
        .use_llm(use_llm)
        .poll_interval(Duration::from_millis(poll_interval_ms))
        .max_polls(max_polls)
        .build()
        .context("Invalid OCR options")?;

    let client = OcrClient::new(api_key.unwrap_or_default(), options)
        .context("Could not create OCR client")?;

    let job = if quiet {
        client.process(pdf).await?
    } else {
        let spinner = SpinnerProgress::new();
        client.process_with_progress(pdf, &spinner).await?
    };

    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let saved = save_outputs(&job, &stem, output)
        .await
        .context("Failed to save OCR outputs")?;

    if !quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&saved.markdown_path.display().to_string()),
            dim(&format!("{} images", saved.image_count)),
        );
        eprintln!(
            "   next: {}",
            dim(&format!("warraq repair {}", saved.markdown_path.display()))
        );
    }
    Ok(())
}

fn repair_config(images_dir: Option<PathBuf>) -> Result<RepairConfig> {
    let mut builder = RepairConfig::builder();
    if let Some(dir) = images_dir {
        builder = builder.images_dir(dir);
    }
    builder.build().context("Invalid repair configuration")
}

async fn run_repair(input: &Path, images_dir: Option<PathBuf>, quiet: bool) -> Result<()> {
    let config = repair_config(images_dir)?;
    let output = repair_file(input, &config).await.context("Repair failed")?;

    if !quiet {
        let s = &output.stats;
        eprintln!(
            "{}  {}",
            green("✔"),
            bold(&output.output_path.display().to_string())
        );
        eprintln!(
            "   {} math blocks balanced, {} RTL runs hoisted, {} images linked{}",
            s.blocks_balanced,
            s.rtl_runs_extracted,
            s.images_linked,
            if s.images_unresolved > 0 {
                red(&format!("  ({} unresolved)", s.images_unresolved))
            } else {
                String::new()
            },
        );
    }
    Ok(())
}

/// Repair (unless told otherwise) and render a Markdown file to HTML text.
async fn render_input(
    input: &Path,
    mathml: bool,
    no_repair: bool,
    images_dir: Option<PathBuf>,
) -> Result<String> {
    let markdown = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let markdown = if no_repair {
        markdown
    } else {
        let config = repair_config(images_dir)?;
        let dir = config
            .images_dir
            .clone()
            .unwrap_or_else(|| warraq::repair::default_images_dir(input));
        let index = ImageIndex::scan(&dir);
        let (repaired, _) = warraq::repair_markdown(&markdown, &index, &config);
        repaired
    };

    let title = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    Ok(if mathml {
        render_html_mathml(&markdown, &title)
    } else {
        render_html(&markdown, &title)
    })
}

async fn run_html(
    input: &Path,
    output: Option<PathBuf>,
    mathml: bool,
    no_repair: bool,
    images_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let html = render_input(input, mathml, no_repair, images_dir).await?;
    let out_path = output.unwrap_or_else(|| input.with_extension("html"));
    tokio::fs::write(&out_path, &html)
        .await
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    if !quiet {
        eprintln!("{}  {}", green("✔"), bold(&out_path.display().to_string()));
    }
    Ok(())
}

async fn run_pdf(
    input: &Path,
    output: Option<PathBuf>,
    browser: String,
    print_timeout: u64,
    no_repair: bool,
    images_dir: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    // The HTML file goes next to the Markdown so relative image paths
    // resolve when the browser loads it over file://.
    let html = render_input(input, false, no_repair, images_dir).await?;
    let html_path = input.with_extension("html");
    tokio::fs::write(&html_path, &html)
        .await
        .with_context(|| format!("Failed to write {}", html_path.display()))?;

    let pdf_path = output.unwrap_or_else(|| input.with_extension("pdf"));
    let options = PrintOptions {
        browser,
        timeout_secs: print_timeout,
        ..PrintOptions::default()
    };
    html_to_pdf(&html_path, &pdf_path, &options)
        .await
        .context("PDF export failed")?;

    if !quiet {
        let size_kb = std::fs::metadata(&pdf_path)
            .map(|m| m.len() as f64 / 1024.0)
            .unwrap_or(0.0);
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&pdf_path.display().to_string()),
            dim(&format!("{size_kb:.1} KB")),
        );
    }
    Ok(())
}

async fn run_check(input: &Path) -> Result<()> {
    let markdown = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let report = scan_document(&markdown, &RepairConfig::default());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{report}").context("Failed to write report")?;

    if !report.is_clean() {
        eprintln!(
            "{} {} finding(s)",
            red("⚠"),
            bold(&report.findings.len().to_string())
        );
    }
    Ok(())
}
