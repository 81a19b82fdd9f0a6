//! The fluent entry point tying parsing, registration and execution
//! together.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use codespan_reporting::term::termcolor::{NoColor, StandardStream};
use elicit::{ParseError, Parser, SpecDocument};

use crate::config::RunConfig;
use crate::context::IntoOutcome;
use crate::discovery::discover;
use crate::error::RegistrationError;
use crate::executor::Engine;
use crate::hooks::{HookPoint, Hooks};
use crate::host::{HostUnit, TestHost};
use crate::outcome::{RunSummary, StepResult};
use crate::report::{Reporter, TextReporter, events_for};
use crate::step_impl::{StepFn, StepRegistry, Steps};
use crate::transform::{TransformRegistry, Transforms};
use crate::value::StepArg;

/// Documents, step implementations, transforms and hooks for one run.
///
/// ```no_run
/// use runner::{StepContext, Suite};
///
/// Suite::new()
///     .with_specs_folder("specs")
///     .with_step(
///         r"The sum of (-?\d+) and (-?\d+) is (-?\d+)",
///         |ctx: &mut StepContext, a: i64, b: i64, sum: i64| {
///             if a + b != sum {
///                 ctx.fail(format!("expected {}, got {}", sum, a + b));
///             }
///         },
///     )
///     .run_tests();
/// ```
pub struct Suite {
    config: RunConfig,
    documents: Vec<SpecDocument>,
    parse_warnings: Vec<ParseError>,
    steps: StepRegistry,
    transforms: TransformRegistry,
    hooks: Hooks,
    reporters: Vec<Box<dyn Reporter>>,
    registration_errors: Vec<RegistrationError>,
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite {
    pub fn new() -> Self {
        Suite {
            config: RunConfig::default(),
            documents: Vec::new(),
            parse_warnings: Vec::new(),
            steps: StepRegistry::new(),
            transforms: TransformRegistry::new(),
            hooks: Hooks::new(),
            reporters: Vec::new(),
            registration_errors: Vec::new(),
        }
    }

    /// A suite using `config`, with its spec folder already discovered.
    pub fn from_config(config: RunConfig) -> Self {
        let specs = config.specs.clone();
        Suite::new().with_config(config).with_specs_folder(specs)
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse every spec document under `path`.
    pub fn with_specs_folder(mut self, path: impl AsRef<Path>) -> Self {
        for file in discover(path.as_ref(), &self.config) {
            match fs::read_to_string(&file) {
                Ok(source) => self.add_source(source, file.to_string_lossy().replace('\\', "/")),
                Err(error) => {
                    tracing::warn!(path = %file.display(), %error, "cannot read spec document");
                }
            }
        }
        self
    }

    /// Parse a document held in memory. `path` only labels it.
    pub fn with_source(mut self, path: &str, source: &str) -> Self {
        self.add_source(source.to_string(), path.to_string());
        self
    }

    pub fn with_document(mut self, document: SpecDocument) -> Self {
        self.documents.push(document);
        self
    }

    fn add_source(&mut self, source: String, path: String) {
        let parsed = Parser::new(source, self.documents.len())
            .with_path(path)
            .parse();
        for warning in &parsed.warnings {
            tracing::warn!(path = %parsed.document.path, "{}", warning);
        }
        self.parse_warnings.extend(parsed.warnings);
        self.documents.push(parsed.document);
    }

    pub fn with_step<Args, F>(mut self, pattern: &str, f: F) -> Self
    where
        F: StepFn<Args>,
    {
        if let Err(error) = self.steps.register(pattern, f) {
            self.rejected(error);
        }
        self
    }

    pub fn with_steps(mut self, steps: Steps) -> Self {
        for error in steps.register_into(&mut self.steps) {
            self.rejected(error);
        }
        self
    }

    pub fn with_transform<T, F>(mut self, pattern: &str, convert: F) -> Self
    where
        T: StepArg,
        F: Fn(&[&str]) -> Option<T> + 'static,
    {
        if let Err(error) = self.transforms.register::<T, F>(pattern, convert) {
            self.rejected(error);
        }
        self
    }

    pub fn with_transforms(mut self, transforms: Transforms) -> Self {
        for error in transforms.register_into(&mut self.transforms) {
            self.rejected(error);
        }
        self
    }

    fn rejected(&mut self, error: RegistrationError) {
        tracing::warn!(%error, "registration rejected");
        self.registration_errors.push(error);
    }

    pub fn before_spec<R: IntoOutcome>(self, hook: impl Fn() -> R + 'static) -> Self {
        self.with_hook(HookPoint::BeforeSpec, hook)
    }

    pub fn after_spec<R: IntoOutcome>(self, hook: impl Fn() -> R + 'static) -> Self {
        self.with_hook(HookPoint::AfterSpec, hook)
    }

    pub fn before_step<R: IntoOutcome>(self, hook: impl Fn() -> R + 'static) -> Self {
        self.with_hook(HookPoint::BeforeStep, hook)
    }

    pub fn after_step<R: IntoOutcome>(self, hook: impl Fn() -> R + 'static) -> Self {
        self.with_hook(HookPoint::AfterStep, hook)
    }

    fn with_hook<R: IntoOutcome>(mut self, point: HookPoint, hook: impl Fn() -> R + 'static) -> Self {
        self.hooks.add(point, hook);
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn documents(&self) -> &[SpecDocument] {
        &self.documents
    }

    pub fn parse_warnings(&self) -> &[ParseError] {
        &self.parse_warnings
    }

    pub fn registration_errors(&self) -> &[RegistrationError] {
        &self.registration_errors
    }

    /// Run every document as a unit of `host`, feeding each registered
    /// reporter as documents complete.
    pub fn run(&mut self, host: &mut dyn TestHost) -> RunSummary {
        let mut summary = RunSummary {
            registration_errors: self.registration_errors.clone(),
            ..RunSummary::default()
        };
        for warning in self.steps.check_transforms(&self.transforms) {
            tracing::warn!(%warning, "step can never match");
            summary.registration_errors.push(warning);
        }

        let mut engine = Engine::new(&self.steps, &self.transforms, &self.hooks)
            .capture_output(self.config.capture_output);

        for document in &self.documents {
            let outcome = engine.run_document(document, host);
            for event in events_for(&outcome) {
                for reporter in &mut self.reporters {
                    if let Err(error) = reporter.report(&event) {
                        tracing::warn!(%error, "reporter failed");
                    }
                }
            }
            summary.documents.push(outcome);
        }
        for reporter in &mut self.reporters {
            if let Err(error) = reporter.finish() {
                tracing::warn!(%error, "reporter failed");
            }
        }

        summary.diagnostics = engine.take_diagnostics();
        summary.unused_steps = engine.unused_steps();
        for unused in &summary.unused_steps {
            tracing::warn!(step = %unused, "step implementation was never used");
        }

        let nothing_ran = summary
            .documents
            .iter()
            .all(|d| matches!(d.result, StepResult::Skipped | StepResult::Pending));
        if nothing_ran {
            host.skip_now();
        }
        summary
    }

    /// Run under a [`HostUnit`], print the report, write the report file if
    /// one is configured, then panic if anything failed or a registration
    /// was rejected.
    pub fn run_tests(&mut self) -> RunSummary {
        let mut host = HostUnit::new("elicit");
        let summary = self.run(&mut host);

        let console = StandardStream::stdout(self.config.color.choice());
        if let Err(error) = write_report(&summary, TextReporter::new(console, self.config.verbose)) {
            tracing::warn!(%error, "cannot print report");
        }
        if let Some(path) = &self.config.report {
            if let Err(error) = write_report_file(&summary, path) {
                tracing::warn!(path = %path.display(), %error, "cannot write report file");
            }
        }

        let rejected: Vec<String> = summary
            .registration_errors
            .iter()
            .filter(|e| !e.is_warning())
            .map(ToString::to_string)
            .collect();
        if !rejected.is_empty() {
            panic!(
                "{} registration(s) rejected:\n  {}",
                rejected.len(),
                rejected.join("\n  ")
            );
        }
        host.assert_passed();
        summary
    }
}

fn write_report<R: Reporter>(summary: &RunSummary, mut reporter: R) -> io::Result<()> {
    for document in &summary.documents {
        for event in events_for(document) {
            reporter.report(&event)?;
        }
    }
    reporter.finish()
}

/// Always verbose and never coloured.
pub fn write_report_file(summary: &RunSummary, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_report(summary, TextReporter::new(NoColor::new(file), true))
}
