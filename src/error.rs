//! Error types for the pdf2png library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2PngError`] — **Fatal**: the conversion run as a whole did not
//!   succeed (bad input file, unreadable document, output directory could not
//!   be created, one or more pages failed). Returned as `Err(Pdf2PngError)`
//!   from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Per page**: a single page task failed (render glitch,
//!   write failure). Stored inside [`crate::output::PageResult`] so every
//!   page's outcome is visible, and collected into
//!   [`Pdf2PngError::PagesFailed`] when the run finishes.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2png library.
#[derive(Debug, Error)]
pub enum Pdf2PngError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The path does not carry a `.pdf` extension.
    #[error("Expected a .pdf file, got '{path}'")]
    NotAPdfPath { path: PathBuf },

    /// No output directory can be derived from the path (no file name).
    #[error("Cannot derive an output directory from '{path}'")]
    InvalidSourcePath { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document, or it has no pages.
    #[error("PDF '{path}' is unsupported or corrupt: {detail}")]
    UnsupportedOrCorruptDocument { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Four-digit page numbering cannot represent this many pages.
    #[error("PDF has {pages} pages; at most {max} pages can be numbered with 4 digits")]
    PageLimitExceeded { pages: usize, max: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// At least one page failed. Every failure is listed in `errors`.
    #[error("{failed}/{total} pages failed during conversion (pages: {})", format_pages(.errors))]
    PagesFailed {
        failed: usize,
        total: usize,
        errors: Vec<PageError>,
    },

    /// The run was cancelled before every page was rendered. `errors` holds
    /// the pages that failed for another reason before or while it stopped.
    #[error("Conversion cancelled after {completed}/{total} pages{}", format_cancel_failures(.errors))]
    Cancelled {
        completed: usize,
        total: usize,
        errors: Vec<PageError>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Loading or saving the settings store failed.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform and either:\n\
  • place it next to the executable or in the current directory, or\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2PngError {
    /// Zero-based indices of the pages that failed, if this is a page failure.
    pub fn failed_pages(&self) -> Vec<usize> {
        match self {
            Pdf2PngError::PagesFailed { errors, .. } | Pdf2PngError::Cancelled { errors, .. } => {
                errors.iter().map(PageError::page_index).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn format_pages(errors: &[PageError]) -> String {
    errors
        .iter()
        .map(|e| e.page_index().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_cancel_failures(errors: &[PageError]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(" ({} failed: {})", errors.len(), format_pages(errors))
    }
}

/// Failure of a single page task.
///
/// Page indices are zero-based, matching the numbering of the output files.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The source document disappeared or was never there.
    #[error("Page {page}: source '{path}' not found")]
    SourceNotFound { page: usize, path: PathBuf },

    /// Requested page index is outside `0..total`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageIndexOutOfRange { page: usize, total: usize },

    /// pdfium could not parse the document.
    #[error("Page {page}: document could not be decoded: {detail}")]
    DecodeFailed { page: usize, detail: String },

    /// pdfium failed to rasterise the page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// PNG encoding or writing the output file failed.
    #[error("Page {page}: failed to write '{path}': {detail}")]
    WriteFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// The task ran longer than the configured per-page timeout.
    #[error("Page {page}: timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },

    /// The run was cancelled before this page started.
    #[error("Page {page}: cancelled")]
    Cancelled { page: usize },
}

impl PageError {
    /// Zero-based index of the page this error belongs to.
    pub fn page_index(&self) -> usize {
        match self {
            PageError::SourceNotFound { page, .. }
            | PageError::PageIndexOutOfRange { page, .. }
            | PageError::DecodeFailed { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::WriteFailed { page, .. }
            | PageError::Timeout { page, .. }
            | PageError::Cancelled { page } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_failed_display_lists_indices() {
        let e = Pdf2PngError::PagesFailed {
            failed: 2,
            total: 10,
            errors: vec![
                PageError::RenderFailed {
                    page: 3,
                    detail: "boom".into(),
                },
                PageError::Timeout { page: 7, secs: 5 },
            ],
        };
        let msg = e.to_string();
        assert!(msg.contains("2/10"), "got: {msg}");
        assert!(msg.contains("pages: 3, 7"), "got: {msg}");
        assert_eq!(e.failed_pages(), vec![3, 7]);
    }

    #[test]
    fn failed_pages_empty_for_other_errors() {
        let e = Pdf2PngError::Cancelled {
            completed: 1,
            total: 4,
            errors: Vec::new(),
        };
        assert!(e.failed_pages().is_empty());
        assert!(e.to_string().contains("1/4"));
        assert!(!e.to_string().contains("failed"));

        let e = Pdf2PngError::PageLimitExceeded { pages: 1, max: 0 };
        assert!(e.failed_pages().is_empty());
    }

    #[test]
    fn cancelled_run_keeps_real_failures() {
        let e = Pdf2PngError::Cancelled {
            completed: 2,
            total: 6,
            errors: vec![PageError::WriteFailed {
                page: 0,
                path: PathBuf::from("/tmp/x/x.0000.png"),
                detail: "disk full".into(),
            }],
        };
        assert_eq!(e.failed_pages(), vec![0]);
        let msg = e.to_string();
        assert!(msg.contains("2/6"), "got: {msg}");
        assert!(msg.contains("1 failed: 0"), "got: {msg}");
    }

    #[test]
    fn page_limit_display() {
        let e = Pdf2PngError::PageLimitExceeded {
            pages: 12_000,
            max: 10_000,
        };
        assert!(e.to_string().contains("12000"));
        assert!(e.to_string().contains("10000"));
    }

    #[test]
    fn out_of_range_display() {
        let e = PageError::PageIndexOutOfRange { page: 3, total: 3 };
        assert_eq!(e.page_index(), 3);
        assert!(e.to_string().contains("3 pages"));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::WriteFailed {
            page: 1,
            path: PathBuf::from("/tmp/x/x.0001.png"),
            detail: "permission denied".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("WriteFailed"));
        let back: PageError = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, e);
    }
}
