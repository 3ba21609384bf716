//! Result types returned by the converter.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one page task. Exactly one is produced per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Zero-based page index.
    pub page_index: usize,
    /// Where the page was (or would have been) written.
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Size of the written PNG in bytes.
    pub bytes: usize,
    pub duration_ms: u64,
    /// `None` when the page was written successfully.
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub rendered_pages: usize,
    pub failed_pages: usize,
    /// Stale page files removed from an earlier, longer run.
    pub pruned_files: usize,
    pub total_duration_ms: u64,
}

/// A fully successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Directory holding `{base}.NNNN.png` for every page.
    pub output_dir: PathBuf,
    /// Per-page results, sorted by page index.
    pub pages: Vec<PageResult>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Output files in page order.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.pages.iter().map(|p| &p.output_path)
    }
}

/// Document properties read without rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
