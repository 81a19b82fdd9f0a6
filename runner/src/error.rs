use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::hooks::HookPoint;

/// Why a step or transform registration was rejected. The entry is not
/// added; every other registration still applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("registered step {pattern:?} has an invalid regular expression: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error(
        "registered step {pattern:?} => [{signature}] has an invalid implementation: the first parameter must be the step context"
    )]
    MissingContext { pattern: String, signature: String },

    #[error(
        "registered step {pattern:?} => [{signature}] has an invalid implementation: table and text block parameters must come after every captured parameter"
    )]
    MisplacedAttachment { pattern: String, signature: String },

    #[error(
        "registered step {pattern:?} => [{signature}] captures {captures} parameter{} but the implementation takes {params}",
        plural(.captures)
    )]
    ParamCountMismatch {
        pattern: String,
        signature: String,
        captures: usize,
        params: usize,
    },

    #[error("transform {pattern:?} targets {target}, which cannot be produced from a captured string")]
    UnsupportedTarget { pattern: String, target: String },

    #[error("registered step {pattern:?} has a parameter type {param} for which no transforms exist")]
    NoTransform { pattern: String, param: String },
}

impl RegistrationError {
    /// `NoTransform` does not reject the registration; the step just can
    /// never match.
    pub fn is_warning(&self) -> bool {
        matches!(self, RegistrationError::NoTransform { .. })
    }
}

/// A failure local to one document, scenario or step. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("panic during step: {message}")]
    Panicked { message: String },

    #[error("{point} hook failed: {message}")]
    HookFailed { point: HookPoint, message: String },

    #[error("step has unresolved parameters {}", .params.join(", "))]
    UnresolvedParams { params: Vec<String> },

    #[error("no matching step implementation")]
    NoMatch,

    #[error("step is ambiguous:\n{}", indent_lines(.candidates))]
    Ambiguous { candidates: Vec<String> },
}

/// An execution error tagged with the unit it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// `path/document`, `path/document/scenario` or `path/document/scenario/step`.
    pub location: String,
    pub error: ExecutionError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

impl std::error::Error for Diagnostic {}

fn plural(n: &usize) -> &'static str {
    if *n == 1 { "" } else { "s" }
}

fn indent_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
