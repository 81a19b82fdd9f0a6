//! The reporting event stream and its two stock consumers.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use codespan_reporting::term::termcolor::{Color, ColorSpec, WriteColor};

use crate::outcome::{DocumentOutcome, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Document,
    Scenario,
    Step,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Step ran only because it was forced.
    pub forced: bool,
    /// Tables attached to the step.
    pub tables: usize,
    /// Text blocks attached to the step.
    pub text_blocks: usize,
    /// Scenario results of a document, counted in `StepResult::ALL` order.
    pub scenario_counts: [usize; 5],
}

/// One unit's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEvent {
    pub kind: UnitKind,
    pub name: String,
    pub result: StepResult,
    pub log: Vec<String>,
    pub annotations: Annotations,
}

/// Consumer of report events. Events arrive document by document, each
/// document followed by its scenarios, each scenario by its steps.
pub trait Reporter {
    fn report(&mut self, event: &ReportEvent) -> io::Result<()>;

    /// Called once after the last document.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Lets a caller keep a handle on a reporter it hands to a suite.
impl<R: Reporter> Reporter for Rc<RefCell<R>> {
    fn report(&mut self, event: &ReportEvent) -> io::Result<()> {
        self.borrow_mut().report(event)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.borrow_mut().finish()
    }
}

/// Flatten a document outcome into its events, in reporting order.
pub fn events_for(document: &DocumentOutcome) -> Vec<ReportEvent> {
    let mut events = vec![ReportEvent {
        kind: UnitKind::Document,
        name: document.name.clone(),
        result: document.result,
        log: document.log.clone(),
        annotations: Annotations {
            scenario_counts: document.counts(),
            ..Annotations::default()
        },
    }];
    for scenario in &document.scenarios {
        events.push(ReportEvent {
            kind: UnitKind::Scenario,
            name: scenario.name.clone(),
            result: scenario.result,
            log: Vec::new(),
            annotations: Annotations::default(),
        });
        for step in &scenario.steps {
            events.push(ReportEvent {
                kind: UnitKind::Step,
                name: step.text.clone(),
                result: step.result,
                log: step.log.clone(),
                annotations: Annotations {
                    forced: step.forced,
                    tables: step.tables,
                    text_blocks: step.text_blocks,
                    ..Annotations::default()
                },
            });
        }
    }
    events
}

/// Keeps every event it receives.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<ReportEvent>,
    pub finished: bool,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_kind(&self, kind: UnitKind) -> impl Iterator<Item = &ReportEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}

impl Reporter for EventLog {
    fn report(&mut self, event: &ReportEvent) -> io::Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Renders events as a plain-text tree:
///
/// ```text
/// Calculator
/// ==========
/// passed: 1
/// failed: 1
///
/// Add numbers
/// -----------
/// failed
///
///     ✓ The sum of 2 and 3 is 5
///     ✘ The sum of 10 and -1 is 9
///         expected 9, got 11
/// ```
///
/// Unless verbose, passing documents and scenarios are left out.
pub struct TextReporter<W> {
    out: W,
    verbose: bool,
    showing_document: bool,
    showing_scenario: bool,
}

impl<W: WriteColor> TextReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        TextReporter {
            out,
            verbose,
            showing_document: false,
            showing_scenario: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn shows(&self, result: StepResult) -> bool {
        self.verbose || result != StepResult::Passed
    }

    fn colour_for(result: StepResult) -> Option<Color> {
        match result {
            StepResult::Passed => None,
            StepResult::Skipped => Some(Color::Blue),
            StepResult::Pending => Some(Color::Yellow),
            StepResult::Failed | StepResult::Panicked => Some(Color::Red),
        }
    }

    fn write_coloured(&mut self, colour: Option<Color>, text: &str) -> io::Result<()> {
        match colour {
            Some(colour) => {
                self.out.set_color(ColorSpec::new().set_fg(Some(colour)))?;
                write!(self.out, "{}", text)?;
                self.out.reset()
            }
            None => write!(self.out, "{}", text),
        }
    }

    fn write_header(&mut self, event: &ReportEvent, underline: char) -> io::Result<()> {
        let colour = Self::colour_for(event.result);
        let rule: String = std::iter::repeat_n(underline, event.name.chars().count()).collect();
        self.write_coloured(colour, &event.name)?;
        writeln!(self.out)?;
        self.write_coloured(colour, &rule)?;
        writeln!(self.out)
    }

    fn write_document(&mut self, event: &ReportEvent) -> io::Result<()> {
        writeln!(self.out)?;
        self.write_header(event, '=')?;
        for (result, count) in StepResult::ALL.iter().zip(event.annotations.scenario_counts) {
            if count > 0 {
                writeln!(self.out, "{}: {}", result, count)?;
            }
        }
        self.write_log(&event.log)
    }

    fn write_scenario(&mut self, event: &ReportEvent) -> io::Result<()> {
        writeln!(self.out)?;
        self.write_header(event, '-')?;
        writeln!(self.out, "{}", event.result)?;
        writeln!(self.out)
    }

    fn write_step(&mut self, event: &ReportEvent) -> io::Result<()> {
        let marker = event.result.marker().to_string();
        write!(self.out, "    ")?;
        match event.result {
            StepResult::Passed => self.write_coloured(Some(Color::Green), &marker)?,
            result => self.write_coloured(Self::colour_for(result), &marker)?,
        }
        write!(self.out, " ")?;
        self.write_coloured(Self::colour_for(event.result), &event.name)?;

        let annotations = &event.annotations;
        write!(
            self.out,
            "{}{}",
            " ☰".repeat(annotations.text_blocks),
            " ☷".repeat(annotations.tables)
        )?;
        if annotations.forced {
            write!(self.out, " (forced)")?;
        }
        writeln!(self.out)?;
        self.write_log(&event.log)
    }

    fn write_log(&mut self, log: &[String]) -> io::Result<()> {
        for line in log.iter().flat_map(|entry| entry.trim_end_matches('\n').lines()) {
            writeln!(self.out, "        {}", line)?;
        }
        Ok(())
    }
}

impl<W: WriteColor> Reporter for TextReporter<W> {
    fn report(&mut self, event: &ReportEvent) -> io::Result<()> {
        match event.kind {
            UnitKind::Document => {
                self.showing_document = self.shows(event.result);
                self.showing_scenario = false;
                if self.showing_document {
                    self.write_document(event)?;
                }
            }
            UnitKind::Scenario => {
                self.showing_scenario = self.showing_document && self.shows(event.result);
                if self.showing_scenario {
                    self.write_scenario(event)?;
                }
            }
            UnitKind::Step => {
                if self.showing_scenario {
                    self.write_step(event)?;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
