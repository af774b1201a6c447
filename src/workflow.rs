//! The conversion workflow state machine.
//!
//! ```text
//!   Idle ──file accepted──▶ FileSelected ──format──▶ FormatSelected
//!    ▲                                                     │ submit
//!    │ reset                                               ▼
//!  Succeeded ◀──────service ok────── Processing ──service error──▶ Failed
//!                                                                  │
//!                                             (back to FormatSelected, retry)
//! ```
//!
//! [`WorkflowController`] owns the selection, the in-flight flag, and the
//! last result, and funnels every mutation through its methods. While a
//! request is in flight every mutating call fails with
//! [`PdfConvError::Busy`]; that is what keeps at most one request
//! outstanding. `Failed` is reported to observers but never rests: the
//! controller returns to `FormatSelected` so the same file can be resubmitted.
//! A [`WorkflowController::submit`] future dropped before the service answers
//! (timeout, cancellation, task abort) also returns it to `FormatSelected`.

use crate::config::{OutputFormat, SortOption, WorkflowConfig};
use crate::error::PdfConvError;
use crate::events::WorkflowCallback;
use crate::notify::Notifier;
use crate::output::ConversionSummary;
use crate::pipeline::artifact::{materialize, Artifact};
use crate::pipeline::input::CandidateFile;
use crate::pipeline::transfer::{
    ConversionRequest, ConversionResponse, ConversionService, HttpConversionService,
};
use crate::selection::SelectionState;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text of the notification shown after a successful conversion.
pub const SUCCESS_TEXT: &str = "file has been processed";

/// Prefix of the notification shown after a failed conversion.
pub const FAILURE_PREFIX: &str = "Error processing file: ";

/// Observable workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WorkflowState {
    /// No file selected.
    Idle,
    /// A valid file is selected, no format yet.
    FileSelected,
    /// File and format selected; ready to submit.
    FormatSelected,
    /// A request is in flight.
    Processing,
    /// The last request produced an artifact.
    Succeeded,
    /// The last request failed. Transient: only seen by observers.
    Failed,
}

enum Stage {
    Editing {
        last_failure: Option<String>,
    },
    Processing,
    Succeeded {
        artifact: Artifact,
        request: ConversionRequest,
    },
}

/// Holds a submission's claim on `Processing` across the service call.
///
/// Dropped while still armed, it puts the stage back to editing.
struct InFlight<'a> {
    stage: Option<&'a mut Stage>,
    callback: Option<Arc<dyn WorkflowCallback>>,
}

impl InFlight<'_> {
    fn complete(mut self) {
        self.stage = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(stage) = self.stage.take() else {
            return;
        };
        if matches!(stage, Stage::Processing) {
            warn!("Conversion abandoned before the service answered");
            *stage = Stage::Editing { last_failure: None };
            if let Some(cb) = &self.callback {
                cb.on_transition(WorkflowState::Processing, WorkflowState::FormatSelected);
            }
        }
    }
}

/// Drives one file at a time from intake to a saved artifact.
pub struct WorkflowController {
    config: WorkflowConfig,
    service: Arc<dyn ConversionService>,
    selection: SelectionState,
    stage: Stage,
    notifier: Notifier,
    dragging: bool,
}

impl WorkflowController {
    /// Build a controller, creating an HTTP service for `config.endpoint`
    /// unless `config.service` is set.
    pub fn new(config: WorkflowConfig) -> Result<Self, PdfConvError> {
        let service: Arc<dyn ConversionService> = match config.service {
            Some(ref s) => Arc::clone(s),
            None => Arc::new(HttpConversionService::from_config(&config)?),
        };
        Ok(Self {
            selection: SelectionState::new(config.max_file_size),
            notifier: Notifier::new(config.notification_ttl),
            stage: Stage::Editing { last_failure: None },
            dragging: false,
            service,
            config,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn state(&self) -> WorkflowState {
        match &self.stage {
            Stage::Processing => WorkflowState::Processing,
            Stage::Succeeded { .. } => WorkflowState::Succeeded,
            Stage::Editing { .. } => match (self.selection.file(), self.selection.format()) {
                (None, _) => WorkflowState::Idle,
                (Some(_), None) => WorkflowState::FileSelected,
                (Some(_), Some(_)) => WorkflowState::FormatSelected,
            },
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The artifact of the last successful conversion.
    pub fn artifact(&self) -> Option<&Artifact> {
        match &self.stage {
            Stage::Succeeded { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// Message of the last failed conversion, until the selection changes.
    pub fn last_failure(&self) -> Option<&str> {
        match &self.stage {
            Stage::Editing { last_failure } => last_failure.as_deref(),
            _ => None,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Whether something is being dragged over the drop target.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ── Intake ───────────────────────────────────────────────────────────

    /// Validate `file` and select it; the file-picker path.
    ///
    /// Acceptance discards any chosen format and previous result. Rejection
    /// shows an error notification and leaves everything as it was.
    pub fn select_file(&mut self, file: CandidateFile) -> Result<(), PdfConvError> {
        self.ensure_not_busy()?;
        let before = self.state();
        let name = file.name().to_string();
        let size = file.size();

        match self.selection.set_file(file) {
            Ok(()) => {
                info!("Selected {} ({} bytes)", name, size);
                self.stage = Stage::Editing { last_failure: None };
                if let Some(cb) = &self.config.callback {
                    cb.on_file_accepted(&name, size);
                }
                self.emit(before);
                Ok(())
            }
            Err(reason) => {
                warn!("Rejected {}: {}", name, reason);
                self.notifier.error(reason.notification_text());
                if let Some(cb) = &self.config.callback {
                    cb.on_file_rejected(&name, reason);
                }
                Err(reason.into())
            }
        }
    }

    /// Something entered the drop target.
    pub fn drag_enter(&mut self) {
        if !matches!(self.stage, Stage::Processing) {
            self.dragging = true;
        }
    }

    /// The drag left the drop target without dropping.
    pub fn drag_leave(&mut self) {
        self.dragging = false;
    }

    /// Files were dropped; the first one goes through [`Self::select_file`].
    ///
    /// An empty drop is ignored.
    pub fn drop_files<I>(&mut self, files: I) -> Result<(), PdfConvError>
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        self.dragging = false;
        match files.into_iter().next() {
            Some(file) => self.select_file(file),
            None => Ok(()),
        }
    }

    // ── Choices ──────────────────────────────────────────────────────────

    /// Choose the output format. A stale result is discarded.
    pub fn set_format(&mut self, format: OutputFormat) -> Result<(), PdfConvError> {
        self.ensure_not_busy()?;
        let before = self.state();
        self.selection.set_format(format)?;
        self.stage = Stage::Editing { last_failure: None };
        self.emit(before);
        Ok(())
    }

    pub fn set_sort_option(&mut self, sort: SortOption) -> Result<(), PdfConvError> {
        self.ensure_not_busy()?;
        self.selection.set_sort_option(sort);
        Ok(())
    }

    /// Flip the spreadsheet custom-format flag; returns its new value.
    pub fn toggle_custom_format(&mut self) -> Result<bool, PdfConvError> {
        self.ensure_not_busy()?;
        Ok(self.selection.toggle_custom_format())
    }

    /// Drop the selected file along with every choice made for it.
    pub fn remove_file(&mut self) -> Result<(), PdfConvError> {
        self.reset()
    }

    /// Start over ("process another").
    pub fn reset(&mut self) -> Result<(), PdfConvError> {
        self.ensure_not_busy()?;
        let before = self.state();
        self.selection.reset();
        self.stage = Stage::Editing { last_failure: None };
        self.dragging = false;
        self.emit(before);
        Ok(())
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Submit the current selection and wait for the outcome.
    ///
    /// Returns `Ok(None)` without contacting the service when the selection
    /// is incomplete. Otherwise returns the artifact or the service error;
    /// either way exactly one notification is shown. Dropping the future
    /// before it resolves leaves the controller in `FormatSelected`.
    pub async fn submit(&mut self) -> Result<Option<Artifact>, PdfConvError> {
        let Some(request) = self.begin_submit()? else {
            return Ok(None);
        };
        let service = Arc::clone(&self.service);
        let guard = InFlight {
            stage: Some(&mut self.stage),
            callback: self.config.callback.clone(),
        };
        let result = service.convert(&request).await;
        guard.complete();
        self.finish_submit(&request, result).map(Some)
    }

    /// Enter `Processing` and hand out the request to send.
    ///
    /// For hosts that run the request themselves while keeping the
    /// controller responsive; pair with [`Self::finish_submit`].
    /// `Ok(None)` means the selection is incomplete and nothing changed.
    pub fn begin_submit(&mut self) -> Result<Option<ConversionRequest>, PdfConvError> {
        self.ensure_not_busy()?;
        let Some(request) = self.selection.to_request() else {
            debug!("Submit ignored: selection incomplete");
            return Ok(None);
        };

        let before = self.state();
        info!(
            "Submitting {} as {} (sort {}, custom format {})",
            request.file.name(),
            request.format,
            request.sort,
            request.custom_format
        );
        self.stage = Stage::Processing;
        self.dragging = false;
        if let Some(cb) = &self.config.callback {
            cb.on_submit(&request);
        }
        self.emit(before);
        Ok(Some(request))
    }

    /// Leave `Processing` with the service's answer for `request`.
    pub fn finish_submit(
        &mut self,
        request: &ConversionRequest,
        result: Result<ConversionResponse, PdfConvError>,
    ) -> Result<Artifact, PdfConvError> {
        if !matches!(self.stage, Stage::Processing) {
            return Err(PdfConvError::Internal(
                "finish_submit called with no conversion in flight".into(),
            ));
        }

        match result {
            Ok(response) => {
                let artifact = materialize(response, request.file.name(), request.format);
                info!(
                    "Conversion succeeded: {} ({} bytes)",
                    artifact.file_name(),
                    artifact.len()
                );
                self.notifier.success(SUCCESS_TEXT);
                if let Some(cb) = &self.config.callback {
                    cb.on_complete(artifact.file_name(), artifact.len());
                }
                self.stage = Stage::Succeeded {
                    artifact: artifact.clone(),
                    request: request.clone(),
                };
                self.emit(WorkflowState::Processing);
                Ok(artifact)
            }
            Err(e) => {
                let message = e.user_message();
                warn!("Conversion failed: {}", e);
                let text = format!("{FAILURE_PREFIX}{message}");
                self.notifier.error(text.clone());
                if let Some(cb) = &self.config.callback {
                    cb.on_failure(&text);
                    cb.on_transition(WorkflowState::Processing, WorkflowState::Failed);
                }
                self.stage = Stage::Editing {
                    last_failure: Some(message),
                };
                self.emit(WorkflowState::Failed);
                Err(e)
            }
        }
    }

    // ── Output ───────────────────────────────────────────────────────────

    /// Save the current artifact into the configured output directory.
    pub async fn download(&self) -> Result<PathBuf, PdfConvError> {
        let artifact = self.artifact().ok_or(PdfConvError::NoArtifact)?;
        artifact.download_to(&self.config.output_dir).await
    }

    /// Report of the current artifact, built from the request that
    /// produced it rather than the live selection.
    pub fn summary(&self, saved_to: Option<PathBuf>) -> Option<ConversionSummary> {
        let Stage::Succeeded { artifact, request } = &self.stage else {
            return None;
        };
        Some(ConversionSummary {
            source: request.file.name().to_string(),
            source_bytes: request.file.size(),
            format: request.format,
            sort: request.sort,
            custom_format: request.custom_format,
            file_name: artifact.file_name().to_string(),
            bytes: artifact.len(),
            content_type: artifact.content_type().map(str::to_string),
            saved_to,
        })
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn ensure_not_busy(&self) -> Result<(), PdfConvError> {
        if matches!(self.stage, Stage::Processing) {
            return Err(PdfConvError::Busy);
        }
        Ok(())
    }

    fn emit(&self, from: WorkflowState) {
        let to = self.state();
        if from == to {
            return;
        }
        debug!("Workflow {:?} → {:?}", from, to);
        if let Some(cb) = &self.config.callback {
            cb.on_transition(from, to);
        }
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("state", &self.state())
            .field("selection", &self.selection)
            .field("dragging", &self.dragging)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct Unreachable;

    #[async_trait]
    impl ConversionService for Unreachable {
        async fn convert(&self, _r: &ConversionRequest) -> Result<ConversionResponse, PdfConvError> {
            Err(PdfConvError::Transport {
                reason: "connection refused".into(),
            })
        }
    }

    fn controller() -> WorkflowController {
        let config = WorkflowConfig::builder()
            .service(Arc::new(Unreachable))
            .build()
            .unwrap();
        WorkflowController::new(config).unwrap()
    }

    fn pdf(name: &str) -> CandidateFile {
        CandidateFile::from_bytes(name, vec![0u8; 16])
    }

    #[test]
    fn state_follows_selection() {
        let mut c = controller();
        assert_eq!(c.state(), WorkflowState::Idle);
        c.select_file(pdf("a.pdf")).unwrap();
        assert_eq!(c.state(), WorkflowState::FileSelected);
        c.set_format(OutputFormat::Markdown).unwrap();
        assert_eq!(c.state(), WorkflowState::FormatSelected);
        c.remove_file().unwrap();
        assert_eq!(c.state(), WorkflowState::Idle);
    }

    #[test]
    fn busy_while_processing() {
        let mut c = controller();
        c.select_file(pdf("a.pdf")).unwrap();
        c.set_format(OutputFormat::Markdown).unwrap();
        let req = c.begin_submit().unwrap().expect("complete selection");
        assert_eq!(c.state(), WorkflowState::Processing);

        assert!(matches!(c.begin_submit(), Err(PdfConvError::Busy)));
        assert!(matches!(c.select_file(pdf("b.pdf")), Err(PdfConvError::Busy)));
        assert!(matches!(c.set_format(OutputFormat::Spreadsheet), Err(PdfConvError::Busy)));
        assert!(matches!(c.set_sort_option(SortOption::Quantity), Err(PdfConvError::Busy)));
        assert!(matches!(c.toggle_custom_format(), Err(PdfConvError::Busy)));
        assert!(matches!(c.reset(), Err(PdfConvError::Busy)));

        c.drag_enter();
        assert!(!c.is_dragging());

        let artifact = c
            .finish_submit(
                &req,
                Ok(ConversionResponse {
                    data: Bytes::from_static(b"# a"),
                    content_type: None,
                }),
            )
            .unwrap();
        assert_eq!(artifact.file_name(), "a.md");
        assert_eq!(c.state(), WorkflowState::Succeeded);
    }

    #[test]
    fn finish_without_begin_is_an_error() {
        let mut c = controller();
        let req = ConversionRequest::new(pdf("a.pdf"), OutputFormat::Markdown);
        let res = c.finish_submit(
            &req,
            Ok(ConversionResponse {
                data: Bytes::new(),
                content_type: None,
            }),
        );
        assert!(matches!(res, Err(PdfConvError::Internal(_))));
        assert_eq!(c.state(), WorkflowState::Idle);
    }

    #[test]
    fn drag_flag_and_empty_drop() {
        let mut c = controller();
        c.drag_enter();
        assert!(c.is_dragging());
        c.drag_leave();
        assert!(!c.is_dragging());

        c.drag_enter();
        c.drop_files(Vec::new()).unwrap();
        assert!(!c.is_dragging());
        assert_eq!(c.state(), WorkflowState::Idle);
    }

    #[test]
    fn drop_takes_first_file() {
        let mut c = controller();
        c.drop_files(vec![pdf("first.pdf"), pdf("second.pdf")]).unwrap();
        assert_eq!(c.selection().file().unwrap().name(), "first.pdf");
    }

    #[tokio::test]
    async fn transport_failure_returns_to_format_selected() {
        let mut c = controller();
        c.select_file(pdf("a.pdf")).unwrap();
        c.set_format(OutputFormat::Spreadsheet).unwrap();

        let err = c.submit().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(c.state(), WorkflowState::FormatSelected);
        assert!(c.last_failure().unwrap().contains("connection refused"));

        let note = c.notifier().current().unwrap();
        assert!(note.text().starts_with(FAILURE_PREFIX));
    }

    struct Hanging;

    #[async_trait]
    impl ConversionService for Hanging {
        async fn convert(&self, _r: &ConversionRequest) -> Result<ConversionResponse, PdfConvError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_releases_processing() {
        let config = WorkflowConfig::builder()
            .service(Arc::new(Hanging))
            .build()
            .unwrap();
        let mut c = WorkflowController::new(config).unwrap();
        c.select_file(pdf("a.pdf")).unwrap();
        c.set_format(OutputFormat::Markdown).unwrap();

        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), c.submit()).await;
        assert!(timed_out.is_err());
        assert_eq!(c.state(), WorkflowState::FormatSelected);
        assert!(c.last_failure().is_none());

        c.select_file(pdf("b.pdf")).unwrap();
        assert_eq!(c.state(), WorkflowState::FileSelected);
        c.reset().unwrap();
        assert_eq!(c.state(), WorkflowState::Idle);
    }

    #[test]
    fn summary_reports_submitted_choices() {
        let mut c = controller();
        c.select_file(pdf("a.pdf")).unwrap();
        c.set_format(OutputFormat::Spreadsheet).unwrap();
        let req = c.begin_submit().unwrap().unwrap();
        c.finish_submit(
            &req,
            Ok(ConversionResponse {
                data: Bytes::from_static(b"PK"),
                content_type: None,
            }),
        )
        .unwrap();

        c.set_sort_option(SortOption::Quantity).unwrap();
        assert!(c.toggle_custom_format().unwrap());
        assert_eq!(c.state(), WorkflowState::Succeeded);

        let summary = c.summary(None).unwrap();
        assert_eq!(summary.format, OutputFormat::Spreadsheet);
        assert_eq!(summary.sort, SortOption::Default);
        assert!(!summary.custom_format);
        assert_eq!(summary.source, "a.pdf");
        assert_eq!(summary.file_name, "a.xlsx");
    }

    #[tokio::test]
    async fn download_without_artifact() {
        let c = controller();
        assert!(matches!(c.download().await, Err(PdfConvError::NoArtifact)));
        assert!(c.summary(None).is_none());
    }
}
