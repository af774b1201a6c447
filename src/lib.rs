//! # pdfconv
//!
//! Client-side workflow for turning a PDF into Markdown or a spreadsheet
//! through a remote conversion service.
//!
//! The heavy lifting (PDF parsing, Markdown generation, XLSX encoding)
//! happens on the service. This crate owns everything around it: accepting
//! and validating the file, collecting the output choices, sending one
//! request at a time, and saving the returned artifact under a sensible name.
//!
//! ## Workflow Overview
//!
//! ```text
//! file (drop / picker)
//!  │
//!  ├─ 1. Validate  `.pdf` name, ≤ 10 MiB
//!  ├─ 2. Choose    format (markdown | excel), sort order, custom format
//!  ├─ 3. Submit    multipart POST to the conversion endpoint
//!  ├─ 4. Receive   artifact bytes, or {"error": "..."}
//!  └─ 5. Save      invoice.pdf → invoice.md / invoice.xlsx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfconv::{CandidateFile, OutputFormat, SortOption, WorkflowConfig, WorkflowController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkflowConfig::builder()
//!         .endpoint("http://localhost:3000/api/process")
//!         .output_dir("./out")
//!         .build()?;
//!     let mut workflow = WorkflowController::new(config)?;
//!
//!     workflow.select_file(CandidateFile::from_path("invoice.pdf").await?)?;
//!     workflow.set_format(OutputFormat::Spreadsheet)?;
//!     workflow.set_sort_option(SortOption::UnitPrice)?;
//!
//!     if workflow.submit().await?.is_some() {
//!         let path = workflow.download().await?;
//!         println!("saved {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod events;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod selection;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    OutputFormat, SortOption, WorkflowConfig, WorkflowConfigBuilder, DEFAULT_ENDPOINT,
    MAX_FILE_SIZE, NOTIFICATION_TTL,
};
pub use error::{PdfConvError, RejectionReason};
pub use events::{NoopCallback, SharedCallback, WorkflowCallback};
pub use notify::{Notification, Notifier, Severity};
pub use output::ConversionSummary;
pub use pipeline::artifact::{derive_file_name, materialize, Artifact};
pub use pipeline::input::{format_file_size, validate, validate_with_limit, Accepted, CandidateFile};
pub use pipeline::transfer::{
    ConversionRequest, ConversionResponse, ConversionService, HttpConversionService,
};
pub use selection::SelectionState;
pub use workflow::{WorkflowController, WorkflowState};
