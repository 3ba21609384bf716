//! PDF rasterisation: render one page to one PNG file via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, whose calls are
//! synchronous and CPU-bound. `tokio::task::spawn_blocking` moves the work
//! onto the blocking thread pool, preventing the Tokio worker threads from
//! stalling while a page is rendered and encoded.
//!
//! ## Resolution
//!
//! PDF page sizes are expressed in points (1/72 inch). A page is scaled by
//! `dpi / 72`, so a US-Letter page at 192 DPI becomes 1632 × 2112 px. An
//! optional pixel cap bounds either edge for oversized pages.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2PngError};
use crate::layout::PageTask;
use crate::output::DocumentMetadata;
use crate::pipeline::{encode, engine};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-page rendering parameters, split out of [`ConversionConfig`] so they
/// can be moved into blocking tasks cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub dpi: u32,
    pub max_rendered_pixels: Option<u32>,
    pub password: Option<String>,
}

impl RenderOptions {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            max_rendered_pixels: None,
            password: None,
        }
    }

    fn render_config(&self) -> PdfRenderConfig {
        let config = PdfRenderConfig::new().scale_page_by_factor(self.dpi as f32 / 72.0);
        match self.max_rendered_pixels {
            Some(px) => config
                .set_maximum_width(px as i32)
                .set_maximum_height(px as i32),
            None => config,
        }
    }
}

impl From<&ConversionConfig> for RenderOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }
}

/// What a successful render produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub page_index: usize,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Render page `page_index` of `source` to a PNG at `output`.
///
/// Blocking. Opens the document itself, so independent calls share nothing
/// but the pdfium binding. An existing file at `output` is overwritten.
pub fn render_page(
    pdfium: &Pdfium,
    source: &Path,
    page_index: usize,
    output: &Path,
    options: &RenderOptions,
) -> Result<RenderedPage, PageError> {
    if !source.is_file() {
        return Err(PageError::SourceNotFound {
            page: page_index,
            path: source.to_path_buf(),
        });
    }

    let document = pdfium
        .load_pdf_from_file(source, options.password.as_deref())
        .map_err(|e| PageError::DecodeFailed {
            page: page_index,
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    let out_of_range = || PageError::PageIndexOutOfRange {
        page: page_index,
        total,
    };
    if page_index >= total {
        return Err(out_of_range());
    }
    let index = u16::try_from(page_index).map_err(|_| out_of_range())?;

    let page = pages.get(index).map_err(|e| PageError::RenderFailed {
        page: page_index,
        detail: format!("{:?}", e),
    })?;

    let bitmap = page
        .render_with_config(&options.render_config())
        .map_err(|e| PageError::RenderFailed {
            page: page_index,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    let write_failed = |detail: String| PageError::WriteFailed {
        page: page_index,
        path: output.to_path_buf(),
        detail,
    };
    let png = encode::encode_png(&image).map_err(|e| write_failed(format!("PNG encoding: {e}")))?;
    std::fs::write(output, &png).map_err(|e| write_failed(e.to_string()))?;

    debug!(
        "Rendered page {} → {}x{} px, {}",
        page_index,
        image.width(),
        image.height(),
        output.display()
    );

    Ok(RenderedPage {
        page_index,
        output_path: output.to_path_buf(),
        width: image.width(),
        height: image.height(),
        bytes: png.len(),
    })
}

/// Async wrapper running [`render_page`] for one task on the blocking pool.
pub async fn render_page_task(
    pdfium: &'static Pdfium,
    task: PageTask,
    options: RenderOptions,
) -> Result<RenderedPage, PageError> {
    let page = task.page_index;
    tokio::task::spawn_blocking(move || {
        render_page(
            pdfium,
            &task.source,
            task.page_index,
            &task.output_path,
            &options,
        )
    })
    .await
    .map_err(|e| PageError::RenderFailed {
        page,
        detail: format!("Render task panicked: {}", e),
    })?
}

/// Open the document, mapping pdfium failures to the fatal error taxonomy.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2PngError> {
    pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, format!("{:?}", e), password.is_some()))
}

/// pdfium reports a missing or wrong password as a password error; anything
/// else means the document could not be parsed.
fn classify_load_error(pdf_path: &Path, detail: String, has_password: bool) -> Pdf2PngError {
    let path = pdf_path.to_path_buf();
    if detail.contains("Password") || detail.contains("password") {
        if has_password {
            Pdf2PngError::WrongPassword { path }
        } else {
            Pdf2PngError::PasswordRequired { path }
        }
    } else {
        Pdf2PngError::UnsupportedOrCorruptDocument { path, detail }
    }
}

/// Open the document once and count its pages.
///
/// A document that opens but has no pages is reported as corrupt.
pub async fn page_count(pdf_path: &Path, password: Option<&str>) -> Result<usize, Pdf2PngError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = engine::pdfium()?;
        let document = load_document(pdfium, &path, pwd.as_deref())?;
        let count = document.pages().len() as usize;
        if count == 0 {
            return Err(Pdf2PngError::UnsupportedOrCorruptDocument {
                path,
                detail: "document has no pages".into(),
            });
        }
        Ok(count)
    })
    .await
    .map_err(|e| Pdf2PngError::Internal(format!("Page count task panicked: {}", e)))?
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2PngError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2PngError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2PngError> {
    let pdfium = engine::pdfium()?;
    let document = load_document(pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_config() {
        let config = ConversionConfig::builder()
            .dpi(80)
            .max_rendered_pixels(2000)
            .password("pw")
            .build()
            .unwrap();
        let opts = RenderOptions::from(&config);
        assert_eq!(opts.dpi, 80);
        assert_eq!(opts.max_rendered_pixels, Some(2000));
        assert_eq!(opts.password.as_deref(), Some("pw"));
        assert_eq!(RenderOptions::new(500).max_rendered_pixels, None);
    }

    #[test]
    fn password_errors_depend_on_whether_one_was_given() {
        let path = Path::new("/tmp/locked.pdf");
        let detail = "PdfiumLibraryInternalError(PasswordError)".to_string();
        assert!(matches!(
            classify_load_error(path, detail.clone(), false),
            Pdf2PngError::PasswordRequired { .. }
        ));
        assert!(matches!(
            classify_load_error(path, detail, true),
            Pdf2PngError::WrongPassword { .. }
        ));
        match classify_load_error(path, "PdfiumLibraryInternalError(FormatError)".into(), true) {
            Pdf2PngError::UnsupportedOrCorruptDocument { detail, .. } => {
                assert!(detail.contains("FormatError"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
