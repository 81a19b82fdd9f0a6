pub mod error;
pub mod expansion;
mod inline;
mod structural;

pub use error::ParseError;

use crate::document::SpecDocument;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    path: String,
}

/// The outcome of parsing one spec: the document and anything worth a warning.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: SpecDocument,
    pub warnings: Vec<ParseError>,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            path: String::new(),
        }
    }

    /// Record where the source came from; it becomes `SpecDocument::path`.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Parse the source Markdown into a spec document.
    pub fn parse(&self) -> Parsed {
        let (document, warnings) =
            structural::parse_document(&self.source, self.file_id, &self.path);
        tracing::debug!(
            path = %self.path,
            scenarios = document.scenarios.len(),
            warnings = warnings.len(),
            "parsed spec document"
        );
        Parsed { document, warnings }
    }
}

/// Parse a source string that did not come from a file.
pub fn parse_str(source: &str) -> SpecDocument {
    Parser::new(source.to_string(), 0).parse().document
}
