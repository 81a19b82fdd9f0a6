//! Results and the outcome tree a run produces.

use std::fmt;

use crate::error::{Diagnostic, RegistrationError};

/// Verdict of a document, scenario or step, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepResult {
    Passed,
    Skipped,
    Pending,
    Failed,
    Panicked,
}

impl StepResult {
    /// The worst of `results`, or `Pending` when there are none.
    pub fn aggregate(results: impl IntoIterator<Item = StepResult>) -> StepResult {
        results.into_iter().max().unwrap_or(StepResult::Pending)
    }

    /// Anything past `Skipped` fails a run.
    pub fn is_failure(self) -> bool {
        self >= StepResult::Failed
    }

    pub fn marker(self) -> char {
        match self {
            StepResult::Passed => '✓',
            StepResult::Skipped => '⤹',
            StepResult::Pending => '?',
            StepResult::Failed => '✘',
            StepResult::Panicked => '⚡',
        }
    }

    pub const ALL: [StepResult; 5] = [
        StepResult::Passed,
        StepResult::Skipped,
        StepResult::Pending,
        StepResult::Failed,
        StepResult::Panicked,
    ];
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepResult::Passed => "passed",
            StepResult::Skipped => "skipped",
            StepResult::Pending => "pending",
            StepResult::Failed => "failed",
            StepResult::Panicked => "panicked",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub text: String,
    pub result: StepResult,
    /// Context messages followed by captured standard output.
    pub log: Vec<String>,
    /// Ran only because it was forced, after the scenario had degraded.
    pub forced: bool,
    pub tables: usize,
    pub text_blocks: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: StepResult,
    pub steps: Vec<StepOutcome>,
}

impl ScenarioOutcome {
    pub fn step(&self, text: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.text == text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub path: String,
    pub name: String,
    pub result: StepResult,
    /// Output of the document-level hooks.
    pub log: Vec<String>,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl DocumentOutcome {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// How many scenarios ended with each result, in `StepResult::ALL` order.
    pub fn counts(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for scenario in &self.scenarios {
            counts[scenario.result as usize] += 1;
        }
        counts
    }
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub documents: Vec<DocumentOutcome>,
    pub diagnostics: Vec<Diagnostic>,
    pub registration_errors: Vec<RegistrationError>,
    /// Descriptions of step implementations no step selected.
    pub unused_steps: Vec<String>,
}

impl RunSummary {
    pub fn result(&self) -> StepResult {
        StepResult::aggregate(self.documents.iter().map(|d| d.result))
    }

    /// No document failed or panicked.
    pub fn is_success(&self) -> bool {
        !self.documents.iter().any(|d| d.result.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_order() {
        assert!(StepResult::Passed < StepResult::Skipped);
        assert!(StepResult::Skipped < StepResult::Pending);
        assert!(StepResult::Pending < StepResult::Failed);
        assert!(StepResult::Failed < StepResult::Panicked);
    }

    #[test]
    fn aggregate_takes_worst_and_empty_is_pending() {
        use StepResult::*;
        assert_eq!(StepResult::aggregate([Passed, Skipped, Passed]), Skipped);
        assert_eq!(StepResult::aggregate([Failed, Pending]), Failed);
        assert_eq!(StepResult::aggregate([]), Pending);
    }

    #[test]
    fn counts_follow_result_order() {
        let scenario = |result| ScenarioOutcome {
            name: String::new(),
            result,
            steps: Vec::new(),
        };
        let doc = DocumentOutcome {
            path: String::new(),
            name: "D".into(),
            result: StepResult::Failed,
            log: Vec::new(),
            scenarios: vec![
                scenario(StepResult::Passed),
                scenario(StepResult::Failed),
                scenario(StepResult::Passed),
            ],
        };
        assert_eq!(doc.counts(), [2, 0, 0, 1, 0]);
    }
}
