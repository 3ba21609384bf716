//! Pipeline stages for PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one step, which keeps each one
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ render ──▶ encode ──▶ file
//! (%PDF)   (pdfium)   (bitmap)    (PNG)
//! ```
//!
//! 1. [`input`]  — check the source exists, is readable and is a PDF
//! 2. [`engine`] — bind the pdfium library once per process
//! 3. [`render`] — rasterise one page; runs in `spawn_blocking` because
//!    pdfium calls are synchronous
//! 4. [`encode`] — PNG-encode the bitmap in memory before it is written

pub mod encode;
pub mod engine;
pub mod input;
pub mod render;
