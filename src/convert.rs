//! Batch conversion entry points.
//!
//! [`convert`] turns every page of a PDF into its own PNG file. It resolves
//! and creates the output directory once, counts the pages, then renders the
//! pages through a bounded pool of blocking tasks and waits for all of them.
//! Every task produces a [`PageResult`]; the run succeeds only if every page
//! does, and otherwise reports each failed page.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2PngError};
use crate::layout::{OutputLayout, PageTask, MAX_PAGES};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::pipeline::render::{self, RenderOptions};
use crate::pipeline::{engine, input};
use futures::stream::{self, StreamExt};
use pdfium_render::prelude::Pdfium;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Convert every page of a PDF into a PNG file.
///
/// Given `/a/b/name.pdf`, pages are written to `/a/b/name/name.NNNN.png`.
/// Existing files with the same names are overwritten.
///
/// # Errors
/// - input problems: not found, unreadable, not a PDF, corrupt, encrypted
/// - the output directory cannot be created
/// - [`Pdf2PngError::PagesFailed`] if any page failed; pages that did
///   succeed stay on disk
/// - [`Pdf2PngError::Cancelled`] if the cancel token fired before every
///   page had started; pages that failed for other reasons are listed in it
pub async fn convert(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PngError> {
    let total_start = Instant::now();
    let source = source.as_ref();
    info!("Starting conversion: {}", source.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    input::validate_source(source)?;

    // ── Step 2: Resolve output directory ─────────────────────────────────
    let layout = OutputLayout::for_source(source)?;
    tokio::fs::create_dir_all(layout.output_dir())
        .await
        .map_err(|e| Pdf2PngError::OutputDirectoryCreateFailed {
            path: layout.output_dir().to_path_buf(),
            source: e,
        })?;
    debug!("Output directory: {}", layout.output_dir().display());

    // ── Step 3: Determine page count ─────────────────────────────────────
    let total_pages = render::page_count(source, config.password.as_deref()).await?;
    if total_pages > MAX_PAGES {
        return Err(Pdf2PngError::PageLimitExceeded {
            pages: total_pages,
            max: MAX_PAGES,
        });
    }
    info!("PDF has {} pages", total_pages);

    // ── Step 4: Build tasks ──────────────────────────────────────────────
    let tasks = layout.tasks(source, total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    // ── Step 5: Dispatch ─────────────────────────────────────────────────
    let pdfium = engine::pdfium()?;
    let mut pages = if config.parallelism == 1 {
        process_sequential(pdfium, tasks, config, total_pages).await
    } else {
        process_concurrent(pdfium, tasks, config, total_pages).await
    };
    pages.sort_by_key(|p| p.page_index);

    // ── Step 6: Join and inspect every result ────────────────────────────
    let rendered = pages.iter().filter(|p| p.is_success()).count();

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_pages, rendered);
    }

    let was_cancelled = pages
        .iter()
        .any(|p| matches!(p.error, Some(PageError::Cancelled { .. })));
    let errors: Vec<PageError> = pages
        .iter()
        .filter_map(|p| p.error.clone())
        .filter(|e| !matches!(e, PageError::Cancelled { .. }))
        .collect();
    for e in &errors {
        warn!("{}", e);
    }

    if was_cancelled {
        warn!("Conversion cancelled after {}/{} pages", rendered, total_pages);
        return Err(Pdf2PngError::Cancelled {
            completed: rendered,
            total: total_pages,
            errors,
        });
    }
    if !errors.is_empty() {
        return Err(Pdf2PngError::PagesFailed {
            failed: errors.len(),
            total: total_pages,
            errors,
        });
    }

    let pruned_files = if config.prune_stale {
        prune_stale_pages(&layout, total_pages).await
    } else {
        0
    };

    let stats = ConversionStats {
        total_pages,
        rendered_pages: rendered,
        failed_pages: 0,
        pruned_files,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages → {} in {}ms",
        rendered,
        layout.output_dir().display(),
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        output_dir: layout.output_dir().to_path_buf(),
        pages,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an async context.
pub fn convert_sync(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PngError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2PngError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, config))
}

/// Extract PDF metadata without rendering anything or touching the
/// output directory. `password` opens encrypted documents.
pub async fn inspect(
    source: impl AsRef<Path>,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2PngError> {
    let source = source.as_ref();
    input::validate_source(source)?;
    render::extract_metadata(source, password).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run one task: honour cancellation and timeout, notify the observer, and
/// turn the outcome into a [`PageResult`].
async fn run_page(
    pdfium: &'static Pdfium,
    task: PageTask,
    config: &ConversionConfig,
    total_pages: usize,
) -> PageResult {
    let page_index = task.page_index;
    let output_path = task.output_path.clone();
    let start = Instant::now();

    let outcome = if config.is_cancelled() {
        Err(PageError::Cancelled { page: page_index })
    } else {
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_index, total_pages);
        }
        let fut = render::render_page_task(pdfium, task, RenderOptions::from(config));
        with_page_timeout(fut, page_index, config.page_timeout_secs).await
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(page) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_complete(page_index, total_pages, &page.output_path);
            }
            PageResult {
                page_index,
                output_path: page.output_path,
                width: page.width,
                height: page.height,
                bytes: page.bytes,
                duration_ms,
                error: None,
            }
        }
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_error(page_index, total_pages, &e.to_string());
            }
            PageResult {
                page_index,
                output_path,
                width: 0,
                height: 0,
                bytes: 0,
                duration_ms,
                error: Some(e),
            }
        }
    }
}

/// Await a page future, turning an expired deadline into
/// [`PageError::Timeout`]. The blocking render behind `fut` cannot be
/// interrupted; on timeout its result is discarded.
async fn with_page_timeout<T>(
    fut: impl Future<Output = Result<T, PageError>>,
    page_index: usize,
    timeout_secs: Option<u64>,
) -> Result<T, PageError> {
    match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .unwrap_or_else(|_| {
                Err(PageError::Timeout {
                    page: page_index,
                    secs,
                })
            }),
        None => fut.await,
    }
}

/// Render pages concurrently, at most `config.parallelism` at a time.
async fn process_concurrent(
    pdfium: &'static Pdfium,
    tasks: Vec<PageTask>,
    config: &ConversionConfig,
    total_pages: usize,
) -> Vec<PageResult> {
    stream::iter(
        tasks
            .into_iter()
            .map(|task| run_page(pdfium, task, config, total_pages)),
    )
    .buffer_unordered(config.parallelism)
    .collect()
    .await
}

/// Render pages one after another in page order.
async fn process_sequential(
    pdfium: &'static Pdfium,
    tasks: Vec<PageTask>,
    config: &ConversionConfig,
    total_pages: usize,
) -> Vec<PageResult> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(run_page(pdfium, task, config, total_pages).await);
    }
    results
}

/// Remove `{base}.NNNN.png` files whose index is beyond the current page
/// count. Failures are logged and skipped.
async fn prune_stale_pages(layout: &OutputLayout, page_count: usize) -> usize {
    let mut entries = match tokio::fs::read_dir(layout.output_dir()).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Cannot list {} for pruning: {}",
                layout.output_dir().display(),
                e
            );
            return 0;
        }
    };

    let mut pruned = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Error while listing output directory: {}", e);
                break;
            }
        };
        let name = entry.file_name();
        let Some(index) = layout.parse_page_index(&name) else {
            continue;
        };
        if index < page_count {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => {
                debug!("Pruned stale page {}", entry.path().display());
                pruned += 1;
            }
            Err(e) => warn!("Failed to prune {}: {}", entry.path().display(), e),
        }
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_source_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ghost.pdf");
        let err = convert(&source, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::SourceNotFound { .. }));
        assert!(!dir.path().join("ghost").exists());
    }

    #[tokio::test]
    async fn non_pdf_is_rejected_before_directory_creation() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.pdf");
        std::fs::write(&source, b"GIF89a").unwrap();
        let err = convert(&source, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::NotAPdf { .. }));
        assert!(!dir.path().join("photo").exists());
    }

    #[tokio::test]
    async fn empty_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("blank.pdf");
        std::fs::write(&source, b"").unwrap();
        let err = convert(&source, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2PngError::NotAPdf { .. }));
        assert!(!dir.path().join("blank").exists());
    }

    #[tokio::test]
    async fn slow_page_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, PageError>(())
        };
        let err = with_page_timeout(slow, 4, Some(1)).await.unwrap_err();
        assert_eq!(err, PageError::Timeout { page: 4, secs: 1 });
    }

    #[tokio::test]
    async fn fast_page_beats_its_timeout() {
        let fast = async { Ok::<_, PageError>(7) };
        assert_eq!(with_page_timeout(fast, 0, Some(30)).await, Ok(7));

        let failing = async {
            Err::<(), _>(PageError::RenderFailed {
                page: 2,
                detail: "boom".into(),
            })
        };
        let err = with_page_timeout(failing, 2, None).await.unwrap_err();
        assert!(matches!(err, PageError::RenderFailed { page: 2, .. }));
    }

    #[tokio::test]
    async fn inspect_rejects_non_pdf_with_password() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.pdf");
        std::fs::write(&source, b"plain text").unwrap();
        let err = inspect(&source, Some("pw")).await.unwrap_err();
        assert!(matches!(err, Pdf2PngError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn prune_removes_only_higher_indices() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::for_source(&dir.path().join("doc.pdf")).unwrap();
        std::fs::create_dir_all(layout.output_dir()).unwrap();
        for i in 0..5 {
            std::fs::write(layout.page_path(i), b"png").unwrap();
        }
        let unrelated = layout.output_dir().join("notes.txt");
        std::fs::write(&unrelated, b"keep").unwrap();

        let pruned = prune_stale_pages(&layout, 3).await;

        assert_eq!(pruned, 2);
        assert!(layout.page_path(2).exists());
        assert!(!layout.page_path(3).exists());
        assert!(!layout.page_path(4).exists());
        assert!(unrelated.exists());
    }

    #[tokio::test]
    async fn prune_on_missing_directory_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::for_source(&dir.path().join("none.pdf")).unwrap();
        assert_eq!(prune_stale_pages(&layout, 0).await, 0);
    }
}
