use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::document::{Scenario, SpecDocument, Step};
use crate::parser::error::ParseError;
use crate::parser::expansion::expand_steps;
use crate::parser::inline::{StepText, normalize_whitespace};
use crate::table::{Table, TextBlock};

type Events<'e> = [(Event<'e>, Range<usize>)];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse Markdown source text into a spec document plus warnings.
pub fn parse_document(
    source: &str,
    file_id: usize,
    path: &str,
) -> (SpecDocument, Vec<ParseError>) {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = CmarkParser::new_ext(source, options);
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut state = ParseState::new(file_id);
    state.process_events(&events);
    state.finalize(path)
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// Where the most recent step lives, so trailing tables and code blocks can
/// find it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepSlot {
    Before(usize),
    Scenario(usize, usize),
    After(usize),
}

struct ParseState {
    file_id: usize,
    name: String,
    before_steps: Vec<Step>,
    scenarios: Vec<Scenario>,
    after_steps: Vec<Step>,
    tables: Vec<Table>,
    /// True between a `##` heading and the next `#` heading or `---`.
    in_scenario: bool,
    current_step: Option<StepSlot>,
    warnings: Vec<ParseError>,
}

impl ParseState {
    fn new(file_id: usize) -> Self {
        ParseState {
            file_id,
            name: String::new(),
            before_steps: Vec::new(),
            scenarios: Vec::new(),
            after_steps: Vec::new(),
            tables: Vec::new(),
            in_scenario: false,
            current_step: None,
            warnings: Vec::new(),
        }
    }

    fn process_events(&mut self, events: &Events<'_>) {
        let mut i = 0;

        while i < events.len() {
            let (ref ev, ref range) = events[i];

            match ev {
                Event::Start(Tag::Heading { level, .. }) => {
                    i += 1;
                    let name = collect_heading_text(events, &mut i);
                    self.open_heading(*level, normalize_whitespace(&name), range.clone());
                }

                // `---` leaves the current scenario: later steps are shared.
                Event::Rule => {
                    self.in_scenario = false;
                    self.current_step = None;
                    i += 1;
                }

                Event::Start(Tag::List(_)) => {
                    i += 1;
                    self.process_list(events, &mut i);
                }

                // Prose between steps ends the step's claim on trailing tables.
                Event::Start(Tag::Paragraph) => {
                    i += 1;
                    skip_container(events, &mut i);
                    self.current_step = None;
                }

                Event::Start(Tag::CodeBlock(kind)) => {
                    i += 1;
                    let block = collect_code_block(kind, events, &mut i);
                    if let Some(step) = self.current_step_mut() {
                        step.text_blocks.push(block);
                    }
                }

                Event::Start(Tag::Table(_)) => {
                    i += 1;
                    let table = self.collect_table(events, &mut i);
                    self.attach_table(table);
                }

                Event::Start(Tag::BlockQuote(_)) | Event::Start(Tag::HtmlBlock) => {
                    i += 1;
                    skip_container(events, &mut i);
                    self.current_step = None;
                }

                _ => {
                    i += 1;
                }
            }
        }
    }

    fn open_heading(&mut self, level: HeadingLevel, name: String, span: Range<usize>) {
        self.current_step = None;
        match level {
            HeadingLevel::H1 => {
                self.name = name;
                self.in_scenario = false;
            }
            HeadingLevel::H2 => {
                self.scenarios.push(Scenario {
                    name,
                    span,
                    ..Scenario::default()
                });
                self.in_scenario = true;
            }
            _ => {}
        }
    }

    /// Every top-level item of the list becomes a step of the current container.
    fn process_list(&mut self, events: &Events<'_>, i: &mut usize) {
        while *i < events.len() {
            let (ref ev, ref range) = events[*i];
            match ev {
                Event::End(TagEnd::List(_)) => {
                    *i += 1;
                    break;
                }
                Event::Start(Tag::Item) => {
                    *i += 1;
                    let step = self.collect_item(events, i, range.clone());
                    let slot = self.push_step(step);
                    self.current_step = Some(slot);
                }
                _ => {
                    *i += 1;
                }
            }
        }
    }

    /// Collect one list item: its text, and any code blocks or tables nested
    /// inside it.
    fn collect_item(&mut self, events: &Events<'_>, i: &mut usize, span: Range<usize>) -> Step {
        let mut text = StepText::default();
        let mut tables = Vec::new();
        let mut text_blocks = Vec::new();

        while *i < events.len() {
            let (ref ev, ref range) = events[*i];
            match ev {
                Event::End(TagEnd::Item) => {
                    *i += 1;
                    break;
                }
                Event::Start(Tag::Paragraph) => {
                    if !text.is_empty() {
                        text.push_break();
                    }
                    *i += 1;
                }
                Event::Text(s) | Event::InlineHtml(s) | Event::Html(s) => {
                    text.push_text(s);
                    *i += 1;
                }
                Event::Code(s) => {
                    text.push_code(s);
                    *i += 1;
                }
                Event::SoftBreak | Event::HardBreak => {
                    text.push_break();
                    *i += 1;
                }
                Event::Start(Tag::Emphasis) | Event::Start(Tag::Strong) => {
                    text.mark_forced();
                    *i += 1;
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    *i += 1;
                    text_blocks.push(collect_code_block(kind, events, i));
                }
                Event::Start(Tag::Table(_)) => {
                    *i += 1;
                    tables.push(self.collect_table(events, i));
                }
                Event::Start(Tag::List(_)) => {
                    self.warnings
                        .push(ParseError::nested_list(range.clone(), self.file_id));
                    *i += 1;
                    skip_container(events, i);
                }
                _ => {
                    *i += 1;
                }
            }
        }

        let finished = text.finish();
        Step {
            text: finished.text,
            params: finished.params,
            tables,
            text_blocks,
            force: finished.force,
            span,
        }
    }

    /// Collect table headers and rows.
    fn collect_table(&mut self, events: &Events<'_>, i: &mut usize) -> Table {
        let mut headers: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut in_head = false;
        let mut current_row: Vec<String> = Vec::new();

        while *i < events.len() {
            let (ref ev, ref range) = events[*i];
            match ev {
                Event::End(TagEnd::Table) => {
                    *i += 1;
                    break;
                }
                Event::Start(Tag::TableHead) => {
                    in_head = true;
                    *i += 1;
                }
                Event::End(TagEnd::TableHead) => {
                    in_head = false;
                    headers = std::mem::take(&mut current_row);
                    *i += 1;
                }
                Event::Start(Tag::TableRow) => {
                    current_row = Vec::new();
                    *i += 1;
                }
                Event::End(TagEnd::TableRow) => {
                    if !in_head {
                        if current_row.len() != headers.len() {
                            self.warnings.push(ParseError::ragged_row(
                                headers.len(),
                                current_row.len(),
                                range.clone(),
                                self.file_id,
                            ));
                        }
                        rows.push(std::mem::take(&mut current_row));
                    }
                    *i += 1;
                }
                Event::Start(Tag::TableCell) => {
                    *i += 1;
                    current_row.push(collect_cell_text(events, i));
                }
                _ => {
                    *i += 1;
                }
            }
        }

        Table::from_rows(headers, rows)
    }

    fn push_step(&mut self, step: Step) -> StepSlot {
        if self.in_scenario {
            if let Some(index) = self.scenarios.len().checked_sub(1) {
                let steps = &mut self.scenarios[index].steps;
                steps.push(step);
                return StepSlot::Scenario(index, steps.len() - 1);
            }
        }
        if self.scenarios.is_empty() {
            self.before_steps.push(step);
            StepSlot::Before(self.before_steps.len() - 1)
        } else {
            self.after_steps.push(step);
            StepSlot::After(self.after_steps.len() - 1)
        }
    }

    fn current_step_mut(&mut self) -> Option<&mut Step> {
        match self.current_step? {
            StepSlot::Before(i) => self.before_steps.get_mut(i),
            StepSlot::Scenario(s, i) => self.scenarios.get_mut(s)?.steps.get_mut(i),
            StepSlot::After(i) => self.after_steps.get_mut(i),
        }
    }

    /// A table belongs to the step right above it, else the open scenario,
    /// else the document.
    fn attach_table(&mut self, table: Table) {
        if let Some(step) = self.current_step_mut() {
            step.tables.push(table);
        } else if let Some(scenario) = self.scenarios.last_mut().filter(|_| self.in_scenario) {
            scenario.tables.push(table);
        } else {
            self.tables.push(table);
        }
    }

    fn finalize(mut self, path: &str) -> (SpecDocument, Vec<ParseError>) {
        let file_id = self.file_id;
        let mut warnings = std::mem::take(&mut self.warnings);

        let before_steps =
            expand_steps(self.before_steps, &[], &self.tables, file_id, &mut warnings);
        let after_steps = expand_steps(self.after_steps, &[], &self.tables, file_id, &mut warnings);
        let scenarios = self
            .scenarios
            .into_iter()
            .map(|mut scenario| {
                let steps = std::mem::take(&mut scenario.steps);
                scenario.steps =
                    expand_steps(steps, &scenario.tables, &self.tables, file_id, &mut warnings);
                scenario
            })
            .collect();

        let document = SpecDocument {
            path: path.to_string(),
            name: self.name,
            before_steps,
            scenarios,
            after_steps,
            tables: self.tables,
        };
        (document, warnings)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Skip the rest of a container whose Start event was just consumed.
fn skip_container(events: &Events<'_>, i: &mut usize) {
    let mut depth = 1u32;
    while *i < events.len() {
        match events[*i].0 {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            _ => {}
        }
        *i += 1;
        if depth == 0 {
            break;
        }
    }
}

/// Collect heading text (all Text and Code events until End(Heading)).
fn collect_heading_text(events: &Events<'_>, i: &mut usize) -> String {
    let mut name = String::new();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::Heading(_)) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::Code(s) => {
                name.push_str(s);
                *i += 1;
            }
            Event::SoftBreak | Event::HardBreak => {
                name.push(' ');
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    name
}

/// Cell text follows the step text rules: code spans keep their backticks.
fn collect_cell_text(events: &Events<'_>, i: &mut usize) -> String {
    let mut text = StepText::default();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::TableCell) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::InlineHtml(s) => text.push_text(s),
            Event::Code(s) => text.push_code(s),
            _ => {}
        }
        *i += 1;
    }
    text.finish().text
}

fn collect_code_block(kind: &CodeBlockKind<'_>, events: &Events<'_>, i: &mut usize) -> TextBlock {
    let language = match kind {
        CodeBlockKind::Fenced(info) => info.trim().to_string(),
        CodeBlockKind::Indented => String::new(),
    };
    let mut content = String::new();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::CodeBlock) => {
                *i += 1;
                break;
            }
            Event::Text(s) => content.push_str(s),
            _ => {}
        }
        *i += 1;
    }
    TextBlock { language, content }
}
