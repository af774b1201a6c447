//! Transfer: ship a conversion request to the remote service.
//!
//! ## Wire contract
//!
//! ```text
//! POST <endpoint>            multipart/form-data
//!   file          <pdf bytes>          (filename = candidate name)
//!   format        markdown | excel
//!   sortBy        default | price | unit_price | quantity
//!   customFormat  true | false
//!
//! 2xx  → body is the artifact, content-type describes it
//! else → {"error": "<message>"}
//! ```
//!
//! One attempt per submission; a failure is returned as-is and never
//! retried here. No client-side timeout is set, the call waits on the
//! transport.

use crate::config::{OutputFormat, SortOption, WorkflowConfig};
use crate::error::PdfConvError;
use crate::pipeline::input::CandidateFile;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Message used when a failed response carries no readable `error` field.
pub const GENERIC_FAILURE: &str = "Processing failed";

/// Everything the service needs for one conversion attempt.
///
/// Built fresh for every submission; a successful one is kept with its
/// artifact so reports describe what was actually sent.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub file: CandidateFile,
    pub format: OutputFormat,
    pub sort: SortOption,
    pub custom_format: bool,
}

impl ConversionRequest {
    pub fn new(file: CandidateFile, format: OutputFormat) -> Self {
        Self {
            file,
            format,
            sort: SortOption::default(),
            custom_format: false,
        }
    }

    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_custom_format(mut self, on: bool) -> Self {
        self.custom_format = on;
        self
    }

    /// The text fields of the multipart body, in send order.
    pub fn text_fields(&self) -> [(&'static str, String); 3] {
        [
            ("format", self.format.as_wire().to_string()),
            ("sortBy", self.sort.as_wire().to_string()),
            ("customFormat", self.custom_format.to_string()),
        ]
    }
}

/// A successful service answer.
#[derive(Debug, Clone)]
pub struct ConversionResponse {
    /// Raw artifact bytes.
    pub data: Bytes,
    /// `content-type` header, if the service sent one.
    pub content_type: Option<String>,
}

/// The remote conversion engine, seen from the client.
///
/// [`HttpConversionService`] is the real implementation; tests and embedders
/// can plug in their own through
/// [`crate::config::WorkflowConfigBuilder::service`].
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Perform one conversion attempt.
    async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse, PdfConvError>;
}

/// Body of a failed response.
#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

/// Extract the `error` text from a failure body, or fall back to
/// [`GENERIC_FAILURE`].
pub fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorPayload>(body)
        .ok()
        .and_then(|p| p.error)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

/// [`ConversionService`] over HTTP multipart.
#[derive(Debug, Clone)]
pub struct HttpConversionService {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpConversionService {
    /// Client for `endpoint` with a default `User-Agent`.
    pub fn new(endpoint: &str) -> Result<Self, PdfConvError> {
        Self::with_user_agent(endpoint, concat!("pdfconv/", env!("CARGO_PKG_VERSION")))
    }

    /// Client built from the endpoint and user agent in `config`.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, PdfConvError> {
        Self::with_user_agent(&config.endpoint, &config.user_agent)
    }

    fn with_user_agent(endpoint: &str, user_agent: &str) -> Result<Self, PdfConvError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| {
            PdfConvError::InvalidConfig(format!("endpoint '{endpoint}' is not a URL: {e}"))
        })?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| PdfConvError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    async fn build_form(request: &ConversionRequest) -> Result<Form, PdfConvError> {
        let content = request.file.read().await?;
        let len = content.len() as u64;
        let part = Part::stream_with_length(content, len)
            .file_name(request.file.name().to_string())
            .mime_str("application/pdf")?;

        let mut form = Form::new().part("file", part);
        for (name, value) in request.text_fields() {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

#[async_trait]
impl ConversionService for HttpConversionService {
    async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse, PdfConvError> {
        debug!(
            "Request fields: file={} format={} sortBy={} customFormat={}",
            request.file.name(),
            request.format,
            request.sort,
            request.custom_format
        );

        let form = Self::build_form(request).await?;
        info!("POST {} ({})", self.endpoint, request.file.name());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = error_message(&body);
            warn!("Conversion service returned {}: {}", status, message);
            return Err(PdfConvError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await?;
        debug!(
            "Response: content-type={:?}, {} bytes",
            content_type,
            data.len()
        );

        Ok(ConversionResponse { data, content_type })
    }
}
