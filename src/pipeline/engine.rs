//! Process-wide pdfium binding.
//!
//! pdfium may only be initialised once per process, while the converter
//! renders pages from many blocking threads. The library is therefore bound
//! lazily on first use and the resulting [`Pdfium`] is shared as a
//! `&'static` reference. With the `thread_safe` feature of `pdfium-render`
//! every call into pdfium is serialised internally, so sharing is sound.
//!
//! Lookup order (first match wins):
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to the shared library
//! 2. the directory containing the running executable
//! 3. the current working directory
//! 4. the system library search path

use crate::error::Pdf2PngError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// Return the shared pdfium instance, binding the library on first call.
pub fn pdfium() -> Result<&'static Pdfium, Pdf2PngError> {
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    let _guard = INIT
        .lock()
        .map_err(|_| Pdf2PngError::Internal("pdfium init lock poisoned".into()))?;
    if let Some(pdfium) = PDFIUM.get() {
        return Ok(pdfium);
    }

    let bindings = bind()?;
    info!("pdfium bound");
    Ok(PDFIUM.get_or_init(|| Pdfium::new(bindings)))
}

fn bind() -> Result<Box<dyn PdfiumLibraryBindings>, Pdf2PngError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            return Pdfium::bind_to_library(&path).map_err(|e| {
                Pdf2PngError::PdfiumBindingFailed(format!("{path}: {e:?}"))
            });
        }
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from));

    let mut last_err = None;
    for dir in exe_dir.into_iter().chain(std::iter::once(PathBuf::from("./"))) {
        match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", dir.display());
                return Ok(bindings);
            }
            Err(e) => last_err = Some(format!("{}: {e:?}", dir.display())),
        }
    }

    Pdfium::bind_to_system_library().map_err(|e| {
        let tried = last_err.unwrap_or_default();
        Pdf2PngError::PdfiumBindingFailed(format!("{e:?} (also tried {tried})"))
    })
}
