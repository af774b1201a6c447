//! Intake: candidate files and the acceptance rules they must pass.
//!
//! A [`CandidateFile`] is whatever the user dropped or picked: a name, a byte
//! size, and a way to get at the bytes. Files opened from disk are only
//! `stat`ed at intake; their content is read when a request is built, so an
//! oversized file is rejected without ever being loaded. That read is capped
//! at the accepted size and fails if the file has changed length since.

use crate::config::MAX_FILE_SIZE;
use crate::error::{PdfConvError, RejectionReason};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Where a candidate's bytes live.
#[derive(Debug, Clone)]
enum FileSource {
    Memory(Bytes),
    Disk(PathBuf),
}

/// A user-supplied file awaiting validation and conversion.
///
/// Cloning is cheap: in-memory content is reference-counted and on-disk
/// content is just a path.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    name: String,
    size: u64,
    source: FileSource,
}

impl CandidateFile {
    /// Wrap bytes that are already in memory (e.g. from a drop event).
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            source: FileSource::Memory(content),
        }
    }

    /// Describe a local file by its metadata. The content is not read yet.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PdfConvError> {
        let path = path.as_ref().to_path_buf();
        let meta = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(PdfConvError::PermissionDenied { path });
            }
            Err(_) => return Err(PdfConvError::FileNotFound { path }),
        };
        if !meta.is_file() {
            return Err(PdfConvError::FileNotFound { path });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!("Candidate on disk: {} ({} bytes)", path.display(), meta.len());
        Ok(Self {
            name,
            size: meta.len(),
            source: FileSource::Disk(path),
        })
    }

    /// File name as shown to the user (no directory part).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Load the file's content.
    ///
    /// On-disk files must still be exactly [`Self::size`] bytes long;
    /// otherwise [`PdfConvError::FileChanged`] is returned and nothing past
    /// the accepted size is loaded.
    pub async fn read(&self) -> Result<Bytes, PdfConvError> {
        let path = match &self.source {
            FileSource::Memory(b) => return Ok(b.clone()),
            FileSource::Disk(path) => path,
        };
        let io_err = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                PdfConvError::PermissionDenied { path: path.clone() }
            }
            _ => PdfConvError::FileRead {
                path: path.clone(),
                source: e,
            },
        };

        let file = tokio::fs::File::open(path).await.map_err(io_err)?;
        let mut content = Vec::with_capacity(self.size as usize);
        file.take(self.size.saturating_add(1))
            .read_to_end(&mut content)
            .await
            .map_err(io_err)?;

        let read = content.len() as u64;
        if read != self.size {
            let actual = match tokio::fs::metadata(path).await {
                Ok(m) => m.len(),
                Err(_) => read,
            };
            warn!(
                "{} changed since selection: {} bytes accepted, {} now",
                path.display(),
                self.size,
                actual
            );
            return Err(PdfConvError::FileChanged {
                path: path.clone(),
                expected: self.size,
                actual,
            });
        }
        Ok(Bytes::from(content))
    }
}

/// Proof that a file passed [`validate`].
#[derive(Debug, Clone)]
pub struct Accepted(CandidateFile);

impl Accepted {
    pub fn file(&self) -> &CandidateFile {
        &self.0
    }

    pub fn into_inner(self) -> CandidateFile {
        self.0
    }
}

/// Check a candidate against the default acceptance rules.
///
/// Rules, first failure wins:
/// 1. the name ends with `.pdf`, case-insensitive
/// 2. the size is at most [`MAX_FILE_SIZE`] bytes
pub fn validate(file: CandidateFile) -> Result<Accepted, RejectionReason> {
    validate_with_limit(file, MAX_FILE_SIZE)
}

/// [`validate`] with an explicit size limit in bytes.
pub fn validate_with_limit(file: CandidateFile, max_size: u64) -> Result<Accepted, RejectionReason> {
    if !file.name.to_lowercase().ends_with(".pdf") {
        return Err(RejectionReason::WrongFileType);
    }
    if file.size > max_size {
        return Err(RejectionReason::FileTooLarge { limit: max_size });
    }
    Ok(Accepted(file))
}

/// Human-readable byte count: `512 B`, `1.50 KB`, `2.00 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A candidate with an arbitrary claimed size and no real content.
    fn sized(name: &str, size: u64) -> CandidateFile {
        CandidateFile {
            name: name.to_string(),
            size,
            source: FileSource::Memory(Bytes::new()),
        }
    }

    #[test]
    fn rejects_non_pdf_names_regardless_of_size() {
        for name in ["invoice.docx", "invoice", "pdf", "invoice.pdf.txt", "invoicepdf"] {
            for size in [0, 1024, MAX_FILE_SIZE + 1] {
                assert_eq!(
                    validate(sized(name, size)).unwrap_err(),
                    RejectionReason::WrongFileType,
                    "{name} / {size}"
                );
            }
        }
    }

    #[test]
    fn size_limit_boundary() {
        assert!(validate(sized("a.pdf", MAX_FILE_SIZE)).is_ok());
        assert_eq!(
            validate(sized("a.pdf", MAX_FILE_SIZE + 1)).unwrap_err(),
            RejectionReason::FileTooLarge { limit: MAX_FILE_SIZE }
        );
        assert_eq!(
            validate(sized("report.pdf", 12 * 1024 * 1024)).unwrap_err(),
            RejectionReason::FileTooLarge { limit: MAX_FILE_SIZE }
        );
    }

    #[test]
    fn accepts_any_case_extension() {
        for name in ["a.pdf", "A.PDF", "scan.Pdf", ".pdf"] {
            let accepted = validate(sized(name, 2 * 1024 * 1024)).expect(name);
            assert_eq!(accepted.file().name(), name);
        }
    }

    #[test]
    fn custom_limit() {
        assert!(validate_with_limit(sized("a.pdf", 100), 100).is_ok());
        assert!(validate_with_limit(sized("a.pdf", 101), 100).is_err());
    }

    #[test]
    fn from_bytes_takes_length_as_size() {
        let f = CandidateFile::from_bytes("x.pdf", vec![0u8; 42]);
        assert_eq!(f.size(), 42);
    }

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.00 MB");
    }

    #[tokio::test]
    async fn from_path_reads_metadata_then_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        tokio::fs::write(&path, b"%PDF-1.7 test").await.unwrap();

        let f = CandidateFile::from_path(&path).await.unwrap();
        assert_eq!(f.name(), "invoice.pdf");
        assert_eq!(f.size(), 13);
        assert_eq!(&f.read().await.unwrap()[..], b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = CandidateFile::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, PdfConvError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn read_fails_when_file_grew_after_intake() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        tokio::fs::write(&path, vec![b'x'; 10]).await.unwrap();

        let f = CandidateFile::from_path(&path).await.unwrap();
        assert!(validate(f.clone()).is_ok());
        tokio::fs::write(&path, vec![b'x'; 11 * 1024 * 1024]).await.unwrap();

        match f.read().await.unwrap_err() {
            PdfConvError::FileChanged {
                expected, actual, ..
            } => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 11 * 1024 * 1024);
            }
            other => panic!("expected FileChanged, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_fails_when_file_shrank_after_intake() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        tokio::fs::write(&path, b"%PDF-1.7 test").await.unwrap();

        let f = CandidateFile::from_path(&path).await.unwrap();
        tokio::fs::write(&path, b"%PDF").await.unwrap();

        assert!(matches!(
            f.read().await,
            Err(PdfConvError::FileChanged { expected: 13, actual: 4, .. })
        ));
    }
}
