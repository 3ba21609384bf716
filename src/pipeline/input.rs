//! Input validation: make sure the source is a readable PDF before any work.
//!
//! We validate the PDF magic bytes (`%PDF`) up front so callers get a
//! meaningful error rather than an opaque pdfium failure, and so a wrong file
//! never causes an output directory to be created.

use crate::error::Pdf2PngError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Check that `path` exists, is readable and starts with `%PDF`.
pub fn validate_source(path: &Path) -> Result<(), Pdf2PngError> {
    if !path.is_file() {
        return Err(Pdf2PngError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| read_error(path, e))?;
            if head != b"%PDF" {
                // Files shorter than the magic are zero-padded.
                let mut magic = [0u8; 4];
                magic[..head.len()].copy_from_slice(&head);
                return Err(Pdf2PngError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) => return Err(read_error(path, e)),
    }

    debug!("Validated source PDF: {}", path.display());
    Ok(())
}

fn read_error(path: &Path, e: std::io::Error) -> Pdf2PngError {
    let path = path.to_path_buf();
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        Pdf2PngError::PermissionDenied { path }
    } else {
        Pdf2PngError::SourceNotFound { path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_source(&dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2PngError::SourceNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_source(dir.path()).unwrap_err();
        assert!(matches!(err, Pdf2PngError::SourceNotFound { .. }));
    }

    #[test]
    fn wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"\x89PNG....").unwrap();
        match validate_source(&path).unwrap_err() {
            Pdf2PngError::NotAPdf { magic, .. } => assert_eq!(&magic, b"\x89PNG"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_and_truncated_files_are_not_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        match validate_source(&empty).unwrap_err() {
            Pdf2PngError::NotAPdf { magic, .. } => assert_eq!(magic, [0; 4]),
            other => panic!("unexpected error: {other:?}"),
        }

        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"ab").unwrap();
        match validate_source(&short).unwrap_err() {
            Pdf2PngError::NotAPdf { magic, .. } => assert_eq!(&magic, b"ab\0\0"),
            other => panic!("unexpected error: {other:?}"),
        }

        let partial_magic = dir.path().join("partial.pdf");
        std::fs::write(&partial_magic, b"%PD").unwrap();
        assert!(validate_source(&partial_magic).is_err());
    }

    #[test]
    fn pdf_magic_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert!(validate_source(&path).is_ok());
    }
}
