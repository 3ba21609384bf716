//! # pdf2png
//!
//! Convert every page of a PDF document into its own PNG image.
//!
//! Given `/a/b/report.pdf`, the pages are written next to it:
//!
//! ```text
//! /a/b/report/
//!   report.0000.png
//!   report.0001.png
//!   report.0002.png
//! ```
//!
//! Page indices are zero-based and zero-padded to four digits, so a plain
//! lexicographic sort restores page order. That caps a document at
//! [`layout::MAX_PAGES`] (10 000) pages.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the file exists and starts with %PDF
//!  ├─ 2. Layout   derive and create the output directory
//!  ├─ 3. Count    open the document once for its page count
//!  ├─ 4. Render   one pdfium render per page on a bounded pool (spawn_blocking)
//!  ├─ 5. Encode   bitmap → PNG bytes → {base}.NNNN.png
//!  └─ 6. Join     collect every page result; any failure fails the run
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2png::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().dpi(192).parallelism(12).build()?;
//!     let output = convert("report.pdf", &config).await?;
//!     println!("{} pages → {}", output.stats.rendered_pages, output.output_dir.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2png` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2png = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! Rendering uses the pdfium library through `pdfium-render`. The shared
//! library is looked up via `PDFIUM_LIB_PATH`, next to the executable, in the
//! current directory, then on the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod convert;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, inspect};
pub use error::{PageError, Pdf2PngError};
pub use layout::{is_pdf_path, OutputLayout, PageTask, MAX_PAGES};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
pub use pipeline::render::{render_page, RenderOptions, RenderedPage};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use settings::{Settings, SettingsError};
