//! The user's current choices: file, output format, sort order, and the
//! spreadsheet-only custom-format flag.
//!
//! Absent values are `None`, never placeholders. The cross-field rules live
//! here so every caller gets them:
//!
//! * a format can only be chosen once a file is selected
//! * a newly accepted file clears the format
//! * leaving the spreadsheet format clears the custom-format flag

use crate::config::{OutputFormat, SortOption, MAX_FILE_SIZE};
use crate::error::{PdfConvError, RejectionReason};
use crate::pipeline::input::{validate_with_limit, CandidateFile};
use crate::pipeline::transfer::ConversionRequest;

/// Current selection for a single conversion.
#[derive(Debug, Clone)]
pub struct SelectionState {
    file: Option<CandidateFile>,
    format: Option<OutputFormat>,
    sort: SortOption,
    custom_format: bool,
    max_file_size: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl SelectionState {
    /// Empty selection enforcing `max_file_size` on intake.
    pub fn new(max_file_size: u64) -> Self {
        Self {
            file: None,
            format: None,
            sort: SortOption::default(),
            custom_format: false,
            max_file_size,
        }
    }

    pub fn file(&self) -> Option<&CandidateFile> {
        self.file.as_ref()
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn custom_format(&self) -> bool {
        self.custom_format
    }

    /// Whether sort and custom-format choices apply yet.
    pub fn options_visible(&self) -> bool {
        self.file.is_some() && self.format.is_some()
    }

    /// Validate `file` and make it the selection.
    ///
    /// On acceptance the previous format is cleared. On rejection nothing
    /// changes.
    pub fn set_file(&mut self, file: CandidateFile) -> Result<(), RejectionReason> {
        let accepted = validate_with_limit(file, self.max_file_size)?;
        self.file = Some(accepted.into_inner());
        self.format = None;
        self.custom_format = false;
        Ok(())
    }

    /// Choose the output format. Requires a selected file.
    pub fn set_format(&mut self, format: OutputFormat) -> Result<(), PdfConvError> {
        if self.file.is_none() {
            return Err(PdfConvError::NoFileSelected);
        }
        self.format = Some(format);
        if format != OutputFormat::Spreadsheet {
            self.custom_format = false;
        }
        Ok(())
    }

    pub fn set_sort_option(&mut self, sort: SortOption) {
        self.sort = sort;
    }

    /// Flip the custom-format flag and return its new value.
    ///
    /// The flag only exists for spreadsheets; with any other format (or none)
    /// this is a no-op returning `false`.
    pub fn toggle_custom_format(&mut self) -> bool {
        if self.format == Some(OutputFormat::Spreadsheet) {
            self.custom_format = !self.custom_format;
        }
        self.custom_format
    }

    /// Back to the initial, empty selection.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_file_size);
    }

    /// A request for the current selection, if it is complete.
    pub fn to_request(&self) -> Option<ConversionRequest> {
        let file = self.file.clone()?;
        let format = self.format?;
        Some(
            ConversionRequest::new(file, format)
                .with_sort(self.sort)
                .with_custom_format(self.custom_format && format == OutputFormat::Spreadsheet),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, size: usize) -> CandidateFile {
        CandidateFile::from_bytes(name, vec![0u8; size])
    }

    #[test]
    fn format_requires_file() {
        let mut s = SelectionState::default();
        assert!(matches!(
            s.set_format(OutputFormat::Markdown),
            Err(PdfConvError::NoFileSelected)
        ));
        assert!(s.format().is_none());
    }

    #[test]
    fn new_file_clears_format() {
        let mut s = SelectionState::default();
        s.set_file(pdf("a.pdf", 10)).unwrap();
        s.set_format(OutputFormat::Spreadsheet).unwrap();
        s.toggle_custom_format();

        s.set_file(pdf("b.pdf", 10)).unwrap();
        assert_eq!(s.file().unwrap().name(), "b.pdf");
        assert!(s.format().is_none());
        assert!(!s.custom_format());
        assert!(s.to_request().is_none());
    }

    #[test]
    fn rejected_file_keeps_previous_selection() {
        let mut s = SelectionState::default();
        s.set_file(pdf("a.pdf", 10)).unwrap();
        s.set_format(OutputFormat::Markdown).unwrap();

        assert_eq!(
            s.set_file(pdf("notes.txt", 10)).unwrap_err(),
            RejectionReason::WrongFileType
        );
        assert_eq!(s.file().unwrap().name(), "a.pdf");
        assert_eq!(s.format(), Some(OutputFormat::Markdown));
    }

    #[test]
    fn switching_away_from_spreadsheet_clears_custom_format() {
        let mut s = SelectionState::default();
        s.set_file(pdf("a.pdf", 10)).unwrap();
        s.set_format(OutputFormat::Spreadsheet).unwrap();
        assert!(s.toggle_custom_format());
        s.set_format(OutputFormat::Markdown).unwrap();
        assert!(!s.custom_format());
    }

    #[test]
    fn toggle_is_noop_without_spreadsheet() {
        let mut s = SelectionState::default();
        assert!(!s.toggle_custom_format());
        s.set_file(pdf("a.pdf", 10)).unwrap();
        s.set_format(OutputFormat::Markdown).unwrap();
        assert!(!s.toggle_custom_format());
    }

    #[test]
    fn request_carries_all_choices() {
        let mut s = SelectionState::default();
        s.set_file(pdf("invoice.pdf", 10)).unwrap();
        assert!(!s.options_visible());
        s.set_format(OutputFormat::Spreadsheet).unwrap();
        assert!(s.options_visible());
        s.set_sort_option(SortOption::Quantity);
        s.toggle_custom_format();

        let req = s.to_request().unwrap();
        assert_eq!(req.file.name(), "invoice.pdf");
        assert_eq!(req.format, OutputFormat::Spreadsheet);
        assert_eq!(req.sort, SortOption::Quantity);
        assert!(req.custom_format);
    }

    #[test]
    fn reset_restores_initial_values_but_keeps_limit() {
        let mut s = SelectionState::new(100);
        s.set_file(pdf("a.pdf", 50)).unwrap();
        s.set_format(OutputFormat::Markdown).unwrap();
        s.set_sort_option(SortOption::UnitPrice);
        s.reset();

        assert!(s.file().is_none());
        assert!(s.format().is_none());
        assert_eq!(s.sort(), SortOption::Default);
        assert_eq!(
            s.set_file(pdf("a.pdf", 101)).unwrap_err(),
            RejectionReason::FileTooLarge { limit: 100 }
        );
    }
}
