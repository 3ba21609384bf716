//! Output layout: where each page of a document ends up on disk.
//!
//! Given `/a/b/name.pdf` the pages land in `/a/b/name/` as
//! `name.0000.png`, `name.0001.png`, … The index is zero-padded to four
//! digits so a plain lexicographic sort restores page order, which caps a
//! document at [`MAX_PAGES`] pages.

use crate::error::Pdf2PngError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Largest page count whose indices fit in four digits (`0000`..`9999`).
pub const MAX_PAGES: usize = 10_000;

/// Extension of every file written by the converter.
pub const PAGE_EXTENSION: &str = "png";

/// Returns `true` when `path` ends in `.pdf` (any ASCII case).
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Deterministic output locations for one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
    base_name: OsString,
}

impl OutputLayout {
    /// Derive the layout from the source path by stripping its last extension.
    ///
    /// A path without an extension maps onto itself, which would collide with
    /// the source file, so that case is rejected.
    pub fn for_source(source: &Path) -> Result<Self, Pdf2PngError> {
        let invalid = || Pdf2PngError::InvalidSourcePath {
            path: source.to_path_buf(),
        };

        if source.extension().is_none() {
            return Err(invalid());
        }
        let base_name = source
            .file_stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?
            .to_os_string();

        Ok(Self {
            output_dir: source.with_extension(""),
            base_name,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn base_name(&self) -> &OsStr {
        &self.base_name
    }

    /// File name for a page: `{base}.{index:04}.png`.
    pub fn page_file_name(&self, page_index: usize) -> OsString {
        let mut name = self.base_name.clone();
        name.push(format!(".{:04}.{}", page_index, PAGE_EXTENSION));
        name
    }

    /// Full output path for a page.
    pub fn page_path(&self, page_index: usize) -> PathBuf {
        self.output_dir.join(self.page_file_name(page_index))
    }

    /// Parse a file name written by this layout back into its page index.
    ///
    /// Returns `None` for anything that does not match `{base}.NNNN.png`.
    pub fn parse_page_index(&self, file_name: &OsStr) -> Option<usize> {
        let rest = file_name
            .as_encoded_bytes()
            .strip_prefix(self.base_name.as_encoded_bytes())?;
        let suffix = std::str::from_utf8(rest).ok()?;
        let digits = suffix
            .strip_prefix('.')?
            .strip_suffix(PAGE_EXTENSION)?
            .strip_suffix('.')?;
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// One task per page, indices `0..page_count`.
    pub fn tasks(&self, source: &Path, page_count: usize) -> Vec<PageTask> {
        (0..page_count)
            .map(|page_index| PageTask {
                source: source.to_path_buf(),
                page_index,
                output_path: self.page_path(page_index),
            })
            .collect()
    }
}

/// The unit of work: render one page of `source` into `output_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    pub source: PathBuf,
    pub page_index: usize,
    pub output_path: PathBuf,
}
