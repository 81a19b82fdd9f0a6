use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A problem found while reading a spec. Parsing always yields a document;
/// these describe the parts of it that cannot behave as the author intended.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    /// A step kept `<param>` tokens because no scenario or document table
    /// has all of them as columns.
    pub fn unresolved_params(params: &[String], span: Range<usize>, file_id: usize) -> Self {
        ParseError::warning(
            format!("no table defines the parameters {}", params.join(", ")),
            span,
            file_id,
        )
        .with_note("the step will be reported as pending")
    }

    pub fn ragged_row(expected: usize, got: usize, span: Range<usize>, file_id: usize) -> Self {
        ParseError::warning(
            format!("table row has {} cells but the header has {}", got, expected),
            span,
            file_id,
        )
    }

    pub fn nested_list(span: Range<usize>, file_id: usize) -> Self {
        ParseError::warning("nested list items are not steps and are ignored", span, file_id)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Bug)
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
