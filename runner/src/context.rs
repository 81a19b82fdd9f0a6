use std::fmt::Display;

use crate::outcome::StepResult;

/// Handed to every step implementation as its first argument.
///
/// A step passes by returning normally. `fail` and `skip` record a verdict
/// without unwinding; the implementation decides whether to keep going.
#[derive(Debug, Default)]
pub struct StepContext {
    log: Vec<String>,
    failed: bool,
    skipped: bool,
}

impl StepContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the step failed and record why.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failed = true;
        self.log.push(message.into());
    }

    /// Mark the step skipped and record why. A failure recorded earlier or
    /// later still wins.
    pub fn skip(&mut self, message: impl Into<String>) {
        self.skipped = true;
        self.log.push(message.into());
    }

    /// Append a line to the step's log.
    pub fn log(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// The verdict for an implementation that returned normally.
    pub(crate) fn verdict(&self) -> StepResult {
        if self.failed {
            StepResult::Failed
        } else if self.skipped {
            StepResult::Skipped
        } else {
            StepResult::Passed
        }
    }

    pub(crate) fn into_log(self) -> Vec<String> {
        self.log
    }
}

/// Return types a step implementation may have.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), String>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}
