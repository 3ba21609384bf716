//! Configuration types for PDF-to-PNG conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is a plain value handed to
//! [`crate::convert::convert`]; nothing is read from process-wide state.

use crate::cancel::CancelToken;
use crate::error::Pdf2PngError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Lowest accepted rendering resolution.
pub const MIN_DPI: u32 = 1;
/// Highest accepted rendering resolution.
pub const MAX_DPI: u32 = 1200;

/// Configuration for a PDF-to-PNG conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2png::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .parallelism(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering resolution in dots per inch. Range: 1–1200. Default: 192.
    ///
    /// A page is scaled by `dpi / 72` relative to its size in PDF points.
    pub dpi: u32,

    /// Optional cap on the rendered width and height in pixels. Default: none.
    ///
    /// Applied on top of the DPI scale; pages that would exceed it are scaled
    /// down proportionally.
    pub max_rendered_pixels: Option<u32>,

    /// Maximum number of pages rendered at the same time. Default: 12.
    ///
    /// Each in-flight page holds a decoded bitmap in memory, so this bounds
    /// peak memory and disk pressure. `1` renders pages strictly in order.
    pub parallelism: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Per-page timeout in seconds. Default: none.
    ///
    /// A pdfium render cannot be interrupted. A timed-out page is reported as
    /// [`crate::PageError::Timeout`] and frees its slot in the pool, but the
    /// render keeps running in the background: more than `parallelism`
    /// bitmaps may briefly be alive, and the page file may still appear.
    pub page_timeout_secs: Option<u64>,

    /// After a fully successful run, delete `{base}.NNNN.png` files left over
    /// from an earlier run of a longer document. Default: false.
    pub prune_stale: bool,

    /// Observer notified as pages start, complete or fail.
    pub progress_callback: Option<ProgressCallback>,

    /// Token checked before each page task starts.
    pub cancel_token: Option<CancelToken>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 192,
            max_rendered_pixels: None,
            parallelism: 12,
            password: None,
            page_timeout_secs: None,
            prune_stale: false,
            progress_callback: None,
            cancel_token: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("parallelism", &self.parallelism)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("prune_stale", &self.prune_stale)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("cancel_token", &self.cancel_token)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.max(16));
        self
    }

    pub fn parallelism(mut self, n: usize) -> Self {
        self.config.parallelism = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn page_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_timeout_secs = Some(secs);
        self
    }

    pub fn prune_stale(mut self, v: bool) -> Self {
        self.config.prune_stale = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel_token = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2PngError> {
        let c = &self.config;
        if !(MIN_DPI..=MAX_DPI).contains(&c.dpi) {
            return Err(Pdf2PngError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.parallelism == 0 {
            return Err(Pdf2PngError::InvalidConfig(
                "Parallelism must be ≥ 1".into(),
            ));
        }
        if c.page_timeout_secs == Some(0) {
            return Err(Pdf2PngError::InvalidConfig(
                "Page timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 192);
        assert_eq!(c.parallelism, 12);
        assert!(!c.prune_stale);
        assert!(!c.is_cancelled());
    }

    #[test]
    fn builder_sets_fields() {
        let token = CancelToken::new();
        let c = ConversionConfig::builder()
            .dpi(500)
            .parallelism(1)
            .max_rendered_pixels(4000)
            .page_timeout_secs(30)
            .prune_stale(true)
            .cancel_token(token.clone())
            .build()
            .unwrap();
        assert_eq!(c.dpi, 500);
        assert_eq!(c.parallelism, 1);
        assert_eq!(c.max_rendered_pixels, Some(4000));
        assert_eq!(c.page_timeout_secs, Some(30));
        assert!(c.prune_stale);
        token.cancel();
        assert!(c.is_cancelled());
    }

    #[test]
    fn rejects_zero_parallelism() {
        let err = ConversionConfig::builder().parallelism(0).build().unwrap_err();
        assert!(matches!(err, Pdf2PngError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_out_of_range_dpi() {
        assert!(ConversionConfig::builder().dpi(0).build().is_err());
        assert!(ConversionConfig::builder().dpi(5000).build().is_err());
        assert!(ConversionConfig::builder().dpi(80).build().is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder()
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
