//! CLI binary for pagemill.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, drives each conversion through a [`Job`], and writes
//! results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pagemill::{
    write_output_file, ConversionConfig, ConversionProgressCallback, ImageQuality, Job, JobOutput,
    LayoutThresholds, Operation, PageImageFormat, PageSelection, PageSeparator, ProgressCallback,
    TextLayout,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-page log
/// lines using [indicatif]. Designed to work correctly when pages complete
/// out-of-order (concurrent raster operations).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    /// Count of pages that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_conversion_start` (called before any pages are processed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual page count.
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting conversion of {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, output_len: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{output_len:>7} bytes")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: String) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&page_num)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages converted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract plain text (stdout)
  pagemill text document.pdf

  # Text to a file, one page header per page
  pagemill text document.pdf -o document.txt --structured

  # Pull tables into CSV files
  pagemill tables report.pdf -o report-tables/

  # Page images at 200 DPI, JPEG
  pagemill images slides.pdf --format jpeg --quality high --dpi 200

  # Grayscale copy with boosted contrast
  pagemill grayscale scan.pdf -o scan-gray.pdf --contrast 1.3

  # Specific pages, from a URL
  pagemill text https://arxiv.org/pdf/1706.03762 --pages 1-3

  # Inspect PDF metadata
  pagemill inspect document.pdf --json

PAGE SELECTION:
  --pages all          every page (default)
  --pages 5            a single page
  --pages 3-15         an inclusive range
  --pages 1,3,5,7      a set of pages

ENVIRONMENT VARIABLES:
  PAGEMILL_DPI              Rendering DPI (72–400)
  PAGEMILL_PAGES            Page selection
  PAGEMILL_CONCURRENCY      Concurrent page transforms
  PDFIUM_LIB_PATH           Path to an existing libpdfium build

SETUP:
  pdfium is loaded as a dynamic library. Most systems only need the
  pdfium binary from bblanchon/pdfium-binaries on the library path, or
  PDFIUM_LIB_PATH pointing at it.
"#;

/// Convert PDF files and URLs to text, CSV tables, images, and grayscale PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pagemill",
    version,
    about = "Convert PDF files and URLs to text, CSV tables, images, and grayscale PDFs",
    long_about = "Convert PDF documents (local files or URLs) using their embedded text layer and \
pdfium rendering: plain-text extraction, heuristic table extraction to CSV, page images, and \
grayscale PDF copies.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Rendering DPI (72–400); raster operations only.
    #[arg(long, env = "PAGEMILL_DPI", default_value_t = 150, global = true,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PAGEMILL_PAGES", default_value = "all", global = true)]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAGEMILL_PASSWORD", global = true)]
    password: Option<String>,

    /// Number of pages transformed concurrently (raster operations).
    #[arg(short, long, env = "PAGEMILL_CONCURRENCY", default_value_t = 4, global = true)]
    concurrency: usize,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "PAGEMILL_DOWNLOAD_TIMEOUT", default_value_t = 120, global = true)]
    download_timeout: u64,

    /// Disable the progress bar.
    #[arg(long, env = "PAGEMILL_NO_PROGRESS", global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGEMILL_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGEMILL_QUIET", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract plain text from the PDF's text layer.
    Text {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Write text to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Precede each page with a `Page N` header and a dashed rule.
        #[arg(long)]
        structured: bool,

        /// Flatten each page's whitespace to single spaces.
        #[arg(long)]
        normalize_whitespace: bool,

        /// Page separator: none, formfeed, or a custom string.
        #[arg(long, default_value = "none")]
        separator: String,

        /// Prepend a metadata front-matter block.
        #[arg(long)]
        metadata: bool,

        /// Output structured JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// Extract tables to CSV files (one file per detected table).
    Tables {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Directory for the CSV files. Default: `<input stem>-tables/`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Row-break threshold in page units (default 5).
        #[arg(long)]
        row_break: Option<f32>,

        /// Table-break threshold in page units (default 20).
        #[arg(long)]
        table_break: Option<f32>,

        /// Print the sheets as JSON instead of writing CSV files.
        #[arg(long)]
        json: bool,
    },

    /// Render pages to PNG or JPEG images.
    Images {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Directory for the image files. Default: `<input stem>-pages/`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image format.
        #[arg(long, value_enum, default_value = "png")]
        format: FormatArg,

        /// JPEG quality tier.
        #[arg(long, value_enum, default_value = "medium")]
        quality: QualityArg,

        /// Convert pages to grayscale via the tone transform.
        #[arg(long)]
        grayscale: bool,

        /// Contrast factor (0.0–2.0); only with --grayscale.
        #[arg(long, default_value_t = 1.0)]
        contrast: f32,

        /// Brightness factor (0.0–2.0); only with --grayscale.
        #[arg(long, default_value_t = 1.0)]
        brightness: f32,
    },

    /// Produce a grayscale copy of the PDF.
    Grayscale {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Output PDF path.
        #[arg(short, long, default_value = "grayscale.pdf")]
        output: PathBuf,

        /// Contrast factor (0.0–2.0).
        #[arg(long, default_value_t = 1.0)]
        contrast: f32,

        /// Brightness factor (0.0–2.0).
        #[arg(long, default_value_t = 1.0)]
        brightness: f32,
    },

    /// Print PDF metadata, no conversion.
    Inspect {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for PageImageFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => PageImageFormat::Png,
            FormatArg::Jpeg => PageImageFormat::Jpeg,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum QualityArg {
    High,
    Medium,
    Low,
}

impl From<QualityArg> for ImageQuality {
    fn from(v: QualityArg) -> Self {
        match v {
            QualityArg::High => ImageQuality::High,
            QualityArg::Medium => ImageQuality::Medium,
            QualityArg::Low => ImageQuality::Low,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let json_mode = matches!(
        cli.command,
        Command::Text { json: true, .. }
            | Command::Tables { json: true, .. }
            | Command::Inspect { json: true, .. }
    );
    let show_progress = !cli.common.quiet && !cli.common.no_progress && !json_mode;
    let filter = if cli.common.verbose {
        "debug"
    } else if cli.common.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect is metadata-only, no Job needed ──────────────────────────
    if let Command::Inspect { ref input, json } = cli.command {
        let meta = pagemill::inspect(input).await.context("Failed to inspect PDF")?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config and run through a Job ───────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let (input, operation) = match &cli.command {
        Command::Text { input, .. } => (input.clone(), Operation::Text),
        Command::Tables { input, .. } => (input.clone(), Operation::Tables),
        Command::Images { input, .. } => (input.clone(), Operation::Images),
        Command::Grayscale { input, .. } => (input.clone(), Operation::GrayscalePdf),
        Command::Inspect { .. } => unreachable!("handled above"),
    };

    let mut job = Job::new();
    job.select(input.as_str()).context("Failed to select input")?;
    job.convert(operation, &config)
        .await
        .context("Conversion failed")?;
    let output = job.take_output().context("No output produced")?;

    // ── Write results ────────────────────────────────────────────────────
    match (&cli.command, output) {
        (
            Command::Text {
                output: out_path,
                json,
                ..
            },
            JobOutput::Text(text_output),
        ) => {
            if *json {
                println!("{}", serde_json::to_string_pretty(&text_output)?);
            } else if let Some(path) = out_path {
                write_output_file(path, text_output.text.as_bytes()).await?;
                summary(
                    &cli,
                    &text_output.stats,
                    &format!("→  {}", bold(&path.display().to_string())),
                );
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(text_output.text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !text_output.text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
        }

        (
            Command::Tables {
                output: out_dir,
                json,
                ..
            },
            JobOutput::Tables(table_output),
        ) => {
            if *json {
                println!("{}", serde_json::to_string_pretty(&table_output)?);
            } else {
                let dir = out_dir
                    .clone()
                    .unwrap_or_else(|| default_output_dir(&input, "tables"));
                for sheet in &table_output.sheets {
                    let bytes = pagemill::sheet_to_csv(sheet)?;
                    let path = dir.join(format!("{}.csv", slug(&sheet.name)));
                    write_output_file(&path, &bytes).await?;
                }
                summary(
                    &cli,
                    &table_output.stats,
                    &format!(
                        "{} sheets  →  {}",
                        table_output.sheets.len(),
                        bold(&dir.display().to_string())
                    ),
                );
                if table_output.sheets.is_empty() && !cli.common.quiet {
                    eprintln!("   {}", dim("no tables detected — prose-only document?"));
                }
            }
        }

        (Command::Images { output: out_dir, format, .. }, JobOutput::Images(image_output)) => {
            let dir = out_dir
                .clone()
                .unwrap_or_else(|| default_output_dir(&input, "pages"));
            let ext = PageImageFormat::from(*format).extension();
            let mut written = 0usize;
            for page in image_output.pages.iter().filter(|p| p.error.is_none()) {
                let path = dir.join(format!("page-{:03}.{}", page.page_num, ext));
                write_output_file(&path, &page.bytes).await?;
                written += 1;
            }
            summary(
                &cli,
                &image_output.stats,
                &format!("{} images  →  {}", written, bold(&dir.display().to_string())),
            );
        }

        (Command::Grayscale { output: out_path, .. }, JobOutput::GrayscalePdf(pdf_output)) => {
            write_output_file(out_path, &pdf_output.bytes).await?;
            summary(
                &cli,
                &pdf_output.stats,
                &format!(
                    "{}  →  {}",
                    dim(&format!("{} bytes", pdf_output.bytes.len())),
                    bold(&out_path.display().to_string())
                ),
            );
        }

        // Job::convert guarantees the output variant matches the operation.
        _ => unreachable!("operation/output mismatch"),
    }

    Ok(())
}

/// Print the one-line result summary unless quiet.
fn summary(cli: &Cli, stats: &pagemill::ConversionStats, tail: &str) {
    if cli.common.quiet {
        return;
    }
    let selected = stats.processed_pages + stats.failed_pages + stats.skipped_pages;
    eprintln!(
        "{}  {}/{} pages  {}ms  {}",
        if stats.failed_pages == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.processed_pages,
        selected,
        stats.total_duration_ms,
        tail,
    );
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages = parse_pages(&cli.common.pages)?;

    let mut builder = ConversionConfig::builder()
        .dpi(cli.common.dpi)
        .concurrency(cli.common.concurrency)
        .pages(pages)
        .download_timeout_secs(cli.common.download_timeout);

    if let Some(ref pwd) = cli.common.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder = match &cli.command {
        Command::Text {
            structured,
            normalize_whitespace,
            separator,
            metadata,
            ..
        } => builder
            .text_layout(if *structured {
                TextLayout::Structured
            } else {
                TextLayout::Flowed
            })
            .normalize_whitespace(*normalize_whitespace)
            .page_separator(parse_separator(separator))
            .include_metadata(*metadata),

        Command::Tables {
            row_break,
            table_break,
            ..
        } => {
            let defaults = LayoutThresholds::default();
            builder.thresholds(LayoutThresholds {
                row_break: row_break.unwrap_or(defaults.row_break),
                table_break: table_break.unwrap_or(defaults.table_break),
            })
        }

        Command::Images {
            format,
            quality,
            grayscale,
            contrast,
            brightness,
            ..
        } => builder
            .image_format((*format).into())
            .image_quality((*quality).into())
            .grayscale_images(*grayscale)
            .contrast(*contrast)
            .brightness(*brightness),

        Command::Grayscale {
            contrast,
            brightness,
            ..
        } => builder.contrast(*contrast).brightness(*brightness),

        Command::Inspect { .. } => builder,
    };

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "formfeed" | "ff" => PageSeparator::FormFeed,
        custom => PageSeparator::Custom(custom.to_string()),
    }
}

/// `<input stem>-<suffix>` next to the current directory; URLs fall back to
/// the suffix alone.
fn default_output_dir(input: &str, suffix: &str) -> PathBuf {
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && !input.starts_with("http"))
        .unwrap_or("output");
    PathBuf::from(format!("{stem}-{suffix}"))
}

/// File-system friendly version of a sheet name:
/// `Page 3 Table 2` → `page-3-table-2`.
fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
