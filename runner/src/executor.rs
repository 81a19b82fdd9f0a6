//! Walking parsed documents and deciding every unit's result.

use std::collections::HashSet;

use elicit::{Scenario, SpecDocument, Step};

use crate::capture::OutputCapture;
use crate::context::StepContext;
use crate::error::{Diagnostic, ExecutionError};
use crate::hooks::{HookPoint, Hooks, catch_panic};
use crate::host::TestHost;
use crate::matcher::{Matcher, Resolution};
use crate::outcome::{DocumentOutcome, ScenarioOutcome, StepOutcome, StepResult};
use crate::step_impl::{StepImplementation, StepRegistry};
use crate::transform::TransformRegistry;
use crate::value::Arg;

/// Runs documents against a step registry.
///
/// Steps are resolved when they run, so registrations made after parsing
/// apply. Nothing a step or hook does can abort the run: failures and
/// panics become results and diagnostics.
pub struct Engine<'r> {
    steps: &'r StepRegistry,
    transforms: &'r TransformRegistry,
    hooks: &'r Hooks,
    capture_output: bool,
    used: HashSet<usize>,
    diagnostics: Vec<Diagnostic>,
}

/// What the scenario loop does after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// A before-step hook failed; nothing else in the scenario runs.
    Abort,
}

struct StepRun {
    result: StepResult,
    log: Vec<String>,
    flow: Flow,
}

impl StepRun {
    fn settled(result: StepResult, log: Vec<String>) -> Self {
        StepRun {
            result,
            log,
            flow: Flow::Continue,
        }
    }
}

impl<'r> Engine<'r> {
    pub fn new(steps: &'r StepRegistry, transforms: &'r TransformRegistry, hooks: &'r Hooks) -> Self {
        Engine {
            steps,
            transforms,
            hooks,
            capture_output: true,
            used: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Whether standard output written by steps goes into their logs.
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Run one document as a unit of `host`, with a sub-unit per scenario.
    pub fn run_document(&mut self, document: &SpecDocument, host: &mut dyn TestHost) -> DocumentOutcome {
        let location = document.qualified_name();
        tracing::info!(document = %location, scenarios = document.scenarios.len(), "running document");

        let mut outcome = None;
        host.run(&location, &mut |doc_host| {
            let doc = self.document_body(document, &location, doc_host);
            report_to_host(doc_host, doc.result);
            outcome = Some(doc);
        });

        // A host that never invokes the body still gets a verdict.
        let outcome = outcome.unwrap_or_else(|| skipped_document(document));
        tracing::info!(document = %location, result = %outcome.result, "finished document");
        outcome
    }

    fn document_body(
        &mut self,
        document: &SpecDocument,
        location: &str,
        host: &mut dyn TestHost,
    ) -> DocumentOutcome {
        let mut log = Vec::new();
        let mut hook_failed = false;

        let scenarios: Vec<ScenarioOutcome> = match self.hooks.invoke(HookPoint::BeforeSpec) {
            Ok(()) => document
                .scenarios
                .iter()
                .map(|scenario| {
                    let mut outcome = None;
                    host.run(&scenario.name, &mut |scenario_host| {
                        let s = self.run_scenario(document, scenario, location);
                        report_to_host(scenario_host, s.result);
                        outcome = Some(s);
                    });
                    outcome.unwrap_or_else(|| skipped_scenario(document, scenario))
                })
                .collect(),
            Err(message) => {
                hook_failed = true;
                self.hook_failed(location, HookPoint::BeforeSpec, &message, &mut log);
                document
                    .scenarios
                    .iter()
                    .map(|scenario| {
                        host.run(&scenario.name, &mut |scenario_host| scenario_host.skip_now());
                        skipped_scenario(document, scenario)
                    })
                    .collect()
            }
        };

        if let Err(message) = self.hooks.invoke(HookPoint::AfterSpec) {
            hook_failed = true;
            self.hook_failed(location, HookPoint::AfterSpec, &message, &mut log);
        }

        let mut result = StepResult::aggregate(scenarios.iter().map(|s| s.result));
        if hook_failed {
            result = StepResult::Panicked;
        }

        DocumentOutcome {
            path: document.path.clone(),
            name: document.name.clone(),
            result,
            log,
            scenarios,
        }
    }

    /// Run a scenario's effective steps in order.
    ///
    /// Once the running result is worse than passed, remaining steps are
    /// skipped unless forced. A forced step that runs in that state is
    /// marked `forced`; its result still counts toward the scenario's.
    pub fn run_scenario(
        &mut self,
        document: &SpecDocument,
        scenario: &Scenario,
        document_location: &str,
    ) -> ScenarioOutcome {
        let location = format!("{}/{}", document_location, scenario.name);
        let mut steps = Vec::with_capacity(document.effective_step_count(scenario));
        // `None` until the first step is decided.
        let mut running: Option<StepResult> = None;
        let mut aborted = false;

        for step in document.effective_steps(scenario) {
            let degraded = running.is_some_and(|r| r > StepResult::Passed);
            if aborted || (degraded && !step.force) {
                steps.push(step_outcome(step, StepResult::Skipped, Vec::new(), false));
                continue;
            }

            let run = self.run_step(step, &location);
            if run.flow == Flow::Abort {
                aborted = true;
            }
            if !degraded {
                running = Some(running.map_or(run.result, |r| r.max(run.result)));
            }
            steps.push(step_outcome(step, run.result, run.log, degraded));
        }

        let result = StepResult::aggregate(steps.iter().map(|s| s.result));
        tracing::debug!(scenario = %location, %result, "finished scenario");
        ScenarioOutcome {
            name: scenario.name.clone(),
            result,
            steps,
        }
    }

    fn run_step(&mut self, step: &Step, scenario_location: &str) -> StepRun {
        let location = format!("{}/{}", scenario_location, step.text);

        if step.is_pending() {
            let error = ExecutionError::UnresolvedParams {
                params: step.params.clone(),
            };
            let log = vec![error.to_string()];
            self.diagnose(&location, error);
            return StepRun::settled(StepResult::Pending, log);
        }

        let matcher = Matcher::new(self.steps, self.transforms);
        let bound = match matcher.resolve(&step.text, &step.tables, &step.text_blocks) {
            Resolution::Bound(bound) => bound,
            Resolution::Unmatched => {
                tracing::warn!(step = %location, "no matching step implementation");
                let error = ExecutionError::NoMatch;
                let log = vec![error.to_string()];
                self.diagnose(&location, error);
                return StepRun::settled(StepResult::Pending, log);
            }
            Resolution::Ambiguous(candidates) => {
                tracing::warn!(step = %location, candidates = candidates.len(), "ambiguous step");
                let error = ExecutionError::Ambiguous { candidates };
                let log = vec![error.to_string()];
                self.diagnose(&location, error);
                return StepRun::settled(StepResult::Pending, log);
            }
        };

        self.used.insert(bound.index);
        let implementation = bound.implementation;

        let mut log = Vec::new();
        if let Err(message) = self.hooks.invoke(HookPoint::BeforeStep) {
            self.hook_failed(&location, HookPoint::BeforeStep, &message, &mut log);
            return StepRun {
                result: StepResult::Panicked,
                log,
                flow: Flow::Abort,
            };
        }

        tracing::debug!(step = %location, implementation = implementation.pattern(), "executing step");
        let (mut result, step_log) = self.invoke(implementation, bound.args, &location);
        log.extend(step_log);

        if let Err(message) = self.hooks.invoke(HookPoint::AfterStep) {
            self.hook_failed(&location, HookPoint::AfterStep, &message, &mut log);
            result = StepResult::Panicked;
        }

        StepRun::settled(result, log)
    }

    /// Call the implementation with panics contained and output captured.
    fn invoke(
        &mut self,
        implementation: &StepImplementation,
        args: Vec<Arg>,
        location: &str,
    ) -> (StepResult, Vec<String>) {
        let mut ctx = StepContext::new();

        let capture = if self.capture_output {
            OutputCapture::begin()
                .map_err(|error| tracing::warn!(%error, "cannot capture step output"))
                .ok()
        } else {
            None
        };

        let returned = catch_panic(|| implementation.call(&mut ctx, args));

        let captured = capture.and_then(|capture| {
            capture
                .finish()
                .map_err(|error| tracing::warn!(%error, "lost captured step output"))
                .ok()
        });

        let result = match returned {
            Ok(Ok(())) => ctx.verdict(),
            Ok(Err(message)) => {
                ctx.fail(message);
                StepResult::Failed
            }
            Err(message) => {
                ctx.log(format!("panic: {}", message));
                self.diagnose(location, ExecutionError::Panicked { message });
                StepResult::Panicked
            }
        };

        let mut log = ctx.into_log();
        if let Some(output) = captured {
            log.extend(output.lines().map(str::to_string));
        }
        (result, log)
    }

    fn hook_failed(&mut self, location: &str, point: HookPoint, message: &str, log: &mut Vec<String>) {
        tracing::warn!(unit = %location, %point, error = message, "hook failed");
        let error = ExecutionError::HookFailed {
            point,
            message: message.to_string(),
        };
        log.push(error.to_string());
        self.diagnose(location, error);
    }

    fn diagnose(&mut self, location: &str, error: ExecutionError) {
        self.diagnostics.push(Diagnostic {
            location: location.to_string(),
            error,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Descriptions of implementations no step has selected so far.
    pub fn unused_steps(&self) -> Vec<String> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.used.contains(index))
            .map(|(_, step)| step.description())
            .collect()
    }
}

fn step_outcome(step: &Step, result: StepResult, log: Vec<String>, forced: bool) -> StepOutcome {
    StepOutcome {
        text: step.text.clone(),
        result,
        log,
        forced,
        tables: step.tables.len(),
        text_blocks: step.text_blocks.len(),
    }
}

fn skipped_scenario(document: &SpecDocument, scenario: &Scenario) -> ScenarioOutcome {
    ScenarioOutcome {
        name: scenario.name.clone(),
        result: StepResult::Skipped,
        steps: document
            .effective_steps(scenario)
            .map(|step| step_outcome(step, StepResult::Skipped, Vec::new(), false))
            .collect(),
    }
}

fn skipped_document(document: &SpecDocument) -> DocumentOutcome {
    DocumentOutcome {
        path: document.path.clone(),
        name: document.name.clone(),
        result: StepResult::Skipped,
        log: Vec::new(),
        scenarios: document
            .scenarios
            .iter()
            .map(|scenario| skipped_scenario(document, scenario))
            .collect(),
    }
}

/// Failed and panicked units fail the host unit; skipped and pending ones
/// skip it.
fn report_to_host(host: &mut dyn TestHost, result: StepResult) {
    match result {
        StepResult::Passed => {}
        StepResult::Skipped | StepResult::Pending => host.skip_now(),
        StepResult::Failed | StepResult::Panicked => host.fail(),
    }
}
