//! Serialisable report of a finished conversion.

use crate::config::{OutputFormat, SortOption};
use serde::Serialize;
use std::path::PathBuf;

/// What was converted, how, and where the result went.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    /// Name of the source PDF.
    pub source: String,
    /// Size of the source PDF in bytes.
    pub source_bytes: u64,
    pub format: OutputFormat,
    pub sort: SortOption,
    pub custom_format: bool,
    /// Derived download name.
    pub file_name: String,
    /// Size of the artifact in bytes.
    pub bytes: usize,
    /// `content-type` reported by the service.
    pub content_type: Option<String>,
    /// Where the artifact was saved, if it was.
    pub saved_to: Option<PathBuf>,
}
