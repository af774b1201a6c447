//! Error types for the pdfconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RejectionReason`] - **Local**: a candidate file failed intake
//!   validation. Nothing was sent anywhere and the previous selection is
//!   untouched; the user simply picks another file.
//!
//! * [`PdfConvError`] - **Operational**: an intake, submission, or save step
//!   could not complete. Service and transport failures leave the workflow
//!   in a retryable state (see [`PdfConvError::is_retryable`]).

use crate::pipeline::input::format_file_size;
use std::path::PathBuf;
use thiserror::Error;

/// Why a candidate file was not accepted.
///
/// The `Display` form is the short machine-facing reason; use
/// [`RejectionReason::notification_text`] for what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The file name does not end with `.pdf` (any case).
    #[error("wrong file type")]
    WrongFileType,

    /// The file is larger than `limit` bytes.
    #[error("file too large")]
    FileTooLarge { limit: u64 },
}

impl RejectionReason {
    /// User-facing notification text for this rejection.
    ///
    /// Whole-megabyte limits read as `10MB`; anything else goes through
    /// [`format_file_size`].
    pub fn notification_text(&self) -> String {
        match self {
            RejectionReason::WrongFileType => "Please select a PDF file".to_string(),
            RejectionReason::FileTooLarge { limit } => {
                const MB: u64 = 1024 * 1024;
                let shown = if *limit >= MB && limit % MB == 0 {
                    format!("{}MB", limit / MB)
                } else {
                    format_file_size(*limit)
                };
                format!("File size must be less than {shown}")
            }
        }
    }
}

/// All operational errors returned by the pdfconv library.
#[derive(Debug, Error)]
pub enum PdfConvError {
    // ── Intake errors ─────────────────────────────────────────────────────
    /// The candidate file failed validation.
    #[error("File rejected: {0}")]
    Rejected(#[from] RejectionReason),

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was accepted but its bytes could not be loaded for upload.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file on disk no longer has the size it was accepted with.
    #[error("'{path}' changed since it was selected ({expected} bytes, now {actual})\nSelect the file again.")]
    FileChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    // ── Workflow errors ───────────────────────────────────────────────────
    /// An operation needs a selected file and there is none.
    #[error("No file selected")]
    NoFileSelected,

    /// Submission needs an output format and none was chosen.
    #[error("No output format selected")]
    NoFormatSelected,

    /// A conversion request is already in flight.
    #[error("A conversion is already in progress")]
    Busy,

    /// Download requested before a conversion succeeded.
    #[error("No converted file is available to download")]
    NoArtifact,

    // ── Service errors ────────────────────────────────────────────────────
    /// The conversion endpoint answered with a non-success status.
    #[error("Conversion service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    /// The request never produced a usable response (network failure,
    /// truncated body, unreadable payload).
    #[error("Conversion request failed: {reason}")]
    Transport { reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the downloaded artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfConvError {
    /// Whether resubmitting the same selection may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PdfConvError::Service { .. } | PdfConvError::Transport { .. }
        )
    }

    /// The message carried into the user-visible failure notification.
    ///
    /// Service errors surface the server's own text verbatim; everything
    /// else uses the error's display form.
    pub fn user_message(&self) -> String {
        match self {
            PdfConvError::Service { message, .. } => message.clone(),
            PdfConvError::Rejected(reason) => reason.notification_text(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for PdfConvError {
    fn from(e: reqwest::Error) -> Self {
        PdfConvError::Transport {
            reason: e.to_string(),
        }
    }
}
