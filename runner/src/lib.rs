//! Executing spec documents against Rust step implementations.
//!
//! Steps are bound to implementations by regular expression. Captured
//! strings are converted to the implementation's parameter types through a
//! registry of transforms keyed by type. The engine walks documents,
//! scenarios and steps, decides each unit's result and streams the verdicts
//! to reporters and a host test runner.

pub mod capture;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod host;
pub mod matcher;
pub mod outcome;
pub mod pattern;
pub mod report;
pub mod step_impl;
pub mod suite;
pub mod transform;
pub mod value;

pub use config::{ColorMode, RunConfig};
pub use context::{IntoOutcome, StepContext};
pub use error::{ConfigError, Diagnostic, ExecutionError, RegistrationError};
pub use executor::Engine;
pub use hooks::{HookPoint, Hooks};
pub use host::{HostUnit, TestHost};
pub use matcher::{BoundStep, Matcher, Resolution};
pub use outcome::{DocumentOutcome, RunSummary, ScenarioOutcome, StepOutcome, StepResult};
pub use report::{Annotations, EventLog, ReportEvent, Reporter, TextReporter, UnitKind};
pub use step_impl::{Handler, StepFn, StepImplementation, StepRegistry, Steps};
pub use suite::Suite;
pub use transform::{TransformRegistry, Transforms};
pub use value::{Arg, ParamType, StepArg, TypeTag};

pub use elicit::{Table, TextBlock};
