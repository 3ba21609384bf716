//! CLI binary for pdf2png.
//!
//! A thin shim over the library crate: picks the document, maps CLI flags to
//! `ConversionConfig`, drives a progress bar and prints the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2png::{
    convert, inspect, is_pdf_path, CancelToken, ConversionConfig, ConversionProgressCallback,
    Pdf2PngError, ProgressCallback, Settings,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
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

/// Terminal progress callback: a live progress bar plus one log line per
/// page. Pages may complete out of order when rendering in parallel.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

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
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_index, Instant::now());
        }
        self.bar.set_message(format!("page {page_index:04}"));
    }

    fn on_page_complete(&self, page_index: usize, total: usize, output: &Path) {
        let elapsed = self.elapsed_secs(page_index);
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.bar.println(format!(
            "  {} Page {:>4}/{:<4}  {}  {}",
            green("✓"),
            page_index + 1,
            total,
            dim(&name),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_index: usize, total: usize, error: &str) {
        let elapsed = self.elapsed_secs(page_index);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>4}/{:<4}  {}  {}",
            red("✗"),
            page_index + 1,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages rendered successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages rendered  ({} failed)",
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
  # Render every page at the default 192 DPI
  pdf2png report.pdf            →  report/report.0000.png, report.0001.png, …

  # Print quality, four pages at a time
  pdf2png --dpi 500 -j 4 scan.pdf

  # Strictly sequential, in page order
  pdf2png -j 1 book.pdf

  # Remove pages left over from an earlier, longer version of the file
  pdf2png --prune-stale slides.pdf

  # Inspect PDF metadata only
  pdf2png --inspect-only report.pdf

SETTINGS:
  Relative paths are resolved against the "directory" entry of
  ~/.config/pdf_to_png/settings.json (or the current directory when the file
  does not exist). --remember stores the document's directory there.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to the pdfium shared library
  RUST_LOG                Override the log filter (e.g. pdf2png=debug)
"#;

/// Convert each page of a PDF into its own PNG image.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Convert each page of a PDF into its own PNG image",
    long_about = "Convert each page of a PDF into a separate PNG image. Given report.pdf, \
pages are written to a sibling directory report/ as report.0000.png, report.0001.png, …",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file (.pdf / .PDF). Relative paths use the settings directory.
    input: PathBuf,

    /// Rendering resolution in dots per inch.
    #[arg(long, env = "PDF2PNG_DPI", default_value_t = 192,
          value_parser = clap::value_parser!(u32).range(1..=1200))]
    dpi: u32,

    /// Maximum number of pages rendered at once.
    #[arg(short = 'j', long, env = "PDF2PNG_PARALLELISM", default_value_t = 12)]
    parallelism: usize,

    /// Cap rendered width and height at this many pixels.
    #[arg(long, env = "PDF2PNG_MAX_PIXELS")]
    max_pixels: Option<u32>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PNG_PASSWORD")]
    password: Option<String>,

    /// Per-page timeout in seconds.
    #[arg(long, env = "PDF2PNG_PAGE_TIMEOUT")]
    page_timeout: Option<u64>,

    /// Delete stale page files beyond the current page count.
    #[arg(long, env = "PDF2PNG_PRUNE_STALE")]
    prune_stale: bool,

    /// Settings file (default: ~/.config/pdf_to_png/settings.json).
    #[arg(long, env = "PDF2PNG_SETTINGS")]
    settings: Option<PathBuf>,

    /// Store the document's directory as the new default.
    #[arg(long)]
    remember: bool,

    /// Print the result as JSON (ConversionOutput).
    #[arg(long, env = "PDF2PNG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PNG_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PNG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PNG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides all the feedback that matters while it is
    // shown, so library INFO logs are suppressed unless --verbose.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Pick the document ────────────────────────────────────────────────
    let settings_path = match cli.settings {
        Some(ref p) => p.clone(),
        None => Settings::default_path().context("Cannot locate settings file")?,
    };
    let settings = Settings::load_from(&settings_path).context("Failed to load settings")?;
    let input = settings.resolve(&cli.input);

    if !is_pdf_path(&input) {
        return Err(Pdf2PngError::NotAPdfPath { path: input }.into());
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing pages in flight (Ctrl-C again to abort)");
                cancel.cancel();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{} aborted", red("✘"));
                std::process::exit(130);
            }
        });
    }

    let config = build_config(&cli, progress_cb, cancel)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match convert(&input, &config).await {
        Ok(output) => output,
        Err(e) => {
            let failed = e.failed_pages();
            if !failed.is_empty() && !cli.quiet {
                let list: Vec<String> = failed.iter().map(|p| format!("{p:04}")).collect();
                eprintln!("{} failed pages: {}", red("✘"), list.join(", "));
            }
            return Err(e).context("Conversion failed");
        }
    };

    if cli.remember {
        if let Some(dir) = input.parent() {
            let updated = Settings {
                directory: dir.to_path_buf(),
            };
            if let Err(e) = updated.save_to(&settings_path) {
                warn!("Could not save settings: {}", e);
            }
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            output.stats.rendered_pages,
            output.stats.total_duration_ms,
            bold(&output.output_dir.display().to_string()),
        );
        if output.stats.pruned_files > 0 {
            eprintln!(
                "   {}",
                dim(&format!("{} stale files removed", output.stats.pruned_files))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .parallelism(cli.parallelism)
        .prune_stale(cli.prune_stale)
        .cancel_token(cancel);

    if let Some(px) = cli.max_pixels {
        builder = builder.max_rendered_pixels(px);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(secs) = cli.page_timeout {
        builder = builder.page_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
