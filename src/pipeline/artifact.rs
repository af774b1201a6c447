//! Artifact handling: turn a service response into a saved file.
//!
//! Saving goes through a staged temporary file created next to the final
//! destination. The bytes are written and flushed there, then the staged
//! file is atomically renamed to the derived name. The staging handle is a
//! [`tempfile::NamedTempFile`], so any early return (write error, rename
//! error) removes it on drop and nothing half-written is left behind.

use crate::config::OutputFormat;
use crate::error::PdfConvError;
use crate::pipeline::transfer::ConversionResponse;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A converted document held in memory, ready to be saved.
#[derive(Debug, Clone)]
pub struct Artifact {
    file_name: String,
    format: OutputFormat,
    content_type: Option<String>,
    data: Bytes,
}

/// Wrap a successful response as an [`Artifact`] named after the source file.
pub fn materialize(response: ConversionResponse, original_name: &str, format: OutputFormat) -> Artifact {
    let file_name = derive_file_name(original_name, format);
    debug!(
        "Materialised {} ({} bytes, content-type {:?})",
        file_name,
        response.data.len(),
        response.content_type
    );
    Artifact {
        file_name,
        format,
        content_type: response.content_type,
        data: response.data,
    }
}

/// Replace the source's extension with the one for `format`.
///
/// `invoice.pdf` → `invoice.md`; `q3.report.PDF` → `q3.report.xlsx`.
/// A name with no usable stem becomes `converted.<ext>`.
pub fn derive_file_name(original_name: &str, format: OutputFormat) -> String {
    let base = Path::new(original_name)
        .file_name()
        .map(Path::new)
        .unwrap_or_else(|| Path::new(original_name));
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .unwrap_or_else(|| "converted".to_string());
    format!("{stem}.{}", format.extension())
}

impl Artifact {
    /// Derived download name, e.g. `invoice.md`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// `content-type` reported by the service.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Leading text of a Markdown artifact, at most `max_chars` characters.
    ///
    /// Spreadsheets are binary and have no preview.
    pub fn preview(&self, max_chars: usize) -> Option<String> {
        match self.format {
            OutputFormat::Markdown => {
                let text = String::from_utf8_lossy(&self.data);
                Some(text.chars().take(max_chars).collect())
            }
            OutputFormat::Spreadsheet => None,
        }
    }

    /// Save the artifact into `dir` under its derived name.
    ///
    /// An existing file of the same name is replaced. Returns the final path.
    pub async fn download_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, PdfConvError> {
        let dir = dir.as_ref().to_path_buf();
        let dest = dir.join(&self.file_name);
        let data = self.data.clone();

        let saved = tokio::task::spawn_blocking(move || save_staged(&dir, &dest, &data))
            .await
            .map_err(|e| PdfConvError::Internal(format!("save task: {e}")))??;

        info!("Saved {} ({} bytes)", saved.display(), self.data.len());
        Ok(saved)
    }
}

/// Stage `data` in `dir`, then rename the staged file onto `dest`.
fn save_staged(dir: &Path, dest: &Path, data: &[u8]) -> Result<PathBuf, PdfConvError> {
    let write_err = |source| PdfConvError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".pdfconv-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(write_err)?;
    staged.write_all(data).map_err(write_err)?;
    staged.as_file().sync_all().map_err(write_err)?;

    staged.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(dest.to_path_buf())
}
