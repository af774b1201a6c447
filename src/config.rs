//! Configuration types for the conversion workflow.
//!
//! All workflow behaviour is controlled through [`WorkflowConfig`], built via
//! its [`WorkflowConfigBuilder`]. The user-facing option enums
//! ([`OutputFormat`], [`SortOption`]) live here too, together with their wire
//! encodings for the conversion endpoint.

use crate::error::PdfConvError;
use crate::events::WorkflowCallback;
use crate::pipeline::transfer::ConversionService;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default conversion endpoint: the `POST /api/process` route of a locally
/// running conversion server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/process";

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Configuration for a conversion workflow.
///
/// Built via [`WorkflowConfig::builder()`] or using
/// [`WorkflowConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfconv::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .endpoint("https://convert.example.com/api/process")
///     .output_dir("./out")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_file_size, 10 * 1024 * 1024);
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Absolute http(s) URL of the conversion endpoint.
    pub endpoint: String,

    /// Largest candidate file accepted by the validator, in bytes. Default: 10 MiB.
    pub max_file_size: u64,

    /// Visible lifetime of a notification. Default: 5 s.
    pub notification_ttl: Duration,

    /// Directory downloaded artifacts are saved into. Default: current directory.
    pub output_dir: PathBuf,

    /// `User-Agent` header sent with each request.
    pub user_agent: String,

    /// Pre-constructed conversion service. Takes precedence over `endpoint`.
    pub service: Option<Arc<dyn ConversionService>>,

    /// Observer notified of intake, transitions, and outcomes.
    pub callback: Option<Arc<dyn WorkflowCallback>>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_file_size: MAX_FILE_SIZE,
            notification_ttl: NOTIFICATION_TTL,
            output_dir: PathBuf::from("."),
            user_agent: concat!("pdfconv/", env!("CARGO_PKG_VERSION")).to_string(),
            service: None,
            callback: None,
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("endpoint", &self.endpoint)
            .field("max_file_size", &self.max_file_size)
            .field("notification_ttl", &self.notification_ttl)
            .field("output_dir", &self.output_dir)
            .field("user_agent", &self.user_agent)
            .field("service", &self.service.as_ref().map(|_| "<dyn ConversionService>"))
            .field("callback", &self.callback.as_ref().map(|_| "<dyn WorkflowCallback>"))
            .finish()
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn notification_ttl(mut self, ttl: Duration) -> Self {
        self.config.notification_ttl = ttl;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn service(mut self, service: Arc<dyn ConversionService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn callback(mut self, callback: Arc<dyn WorkflowCallback>) -> Self {
        self.config.callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, PdfConvError> {
        let c = &self.config;
        if c.service.is_none() {
            let url = reqwest::Url::parse(&c.endpoint).map_err(|e| {
                PdfConvError::InvalidConfig(format!("endpoint '{}' is not a URL: {e}", c.endpoint))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(PdfConvError::InvalidConfig(format!(
                    "endpoint must use http or https, got '{}'",
                    url.scheme()
                )));
            }
        }
        if c.max_file_size == 0 {
            return Err(PdfConvError::InvalidConfig(
                "max_file_size must be ≥ 1 byte".into(),
            ));
        }
        if c.notification_ttl.is_zero() {
            return Err(PdfConvError::InvalidConfig(
                "notification_ttl must be non-zero".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which artifact the conversion service should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Markdown document (`.md`).
    #[serde(rename = "markdown")]
    Markdown,
    /// Spreadsheet workbook (`.xlsx`).
    #[serde(rename = "excel")]
    Spreadsheet,
}

impl OutputFormat {
    /// Value of the `format` form field.
    pub fn as_wire(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Spreadsheet => "excel",
        }
    }

    /// Parse a `format` form value.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "excel" | "xlsx" | "spreadsheet" => Some(OutputFormat::Spreadsheet),
            _ => None,
        }
    }

    /// File extension of the produced artifact, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Spreadsheet => "xlsx",
        }
    }

    /// Media type the service is expected to answer with.
    pub fn media_type(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// How tabular rows in the output are ordered (ascending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOption {
    /// Keep the document's own order. (default)
    #[default]
    #[serde(rename = "default")]
    Default,
    /// By line total.
    #[serde(rename = "price", alias = "amount")]
    TotalAmount,
    /// By unit price.
    #[serde(rename = "unit_price")]
    UnitPrice,
    /// By quantity.
    #[serde(rename = "quantity")]
    Quantity,
}

impl SortOption {
    /// Value of the `sortBy` form field.
    pub fn as_wire(&self) -> &'static str {
        match self {
            SortOption::Default => "default",
            SortOption::TotalAmount => "price",
            SortOption::UnitPrice => "unit_price",
            SortOption::Quantity => "quantity",
        }
    }

    /// Parse a `sortBy` value. `"amount"` is accepted as a legacy alias of
    /// [`SortOption::TotalAmount`].
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Some(SortOption::Default),
            "price" | "amount" => Some(SortOption::TotalAmount),
            "unit_price" => Some(SortOption::UnitPrice),
            "quantity" => Some(SortOption::Quantity),
            _ => None,
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}
