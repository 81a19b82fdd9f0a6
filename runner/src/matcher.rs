//! Resolving step text to exactly one implementation.

use std::fmt;

use elicit::{Table, TextBlock};

use crate::pattern::capture_groups;
use crate::step_impl::{StepImplementation, StepRegistry};
use crate::transform::TransformRegistry;
use crate::value::{Arg, ParamType};

/// An implementation together with its converted arguments.
pub struct BoundStep<'r> {
    /// Position of the implementation in the step registry.
    pub index: usize,
    pub implementation: &'r StepImplementation,
    /// Captures, then tables, then text blocks, in declared order.
    pub args: Vec<Arg>,
}

impl fmt::Debug for BoundStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundStep")
            .field("index", &self.index)
            .field("implementation", &self.implementation.description())
            .field("args", &self.args)
            .finish()
    }
}

#[derive(Debug)]
pub enum Resolution<'r> {
    Bound(BoundStep<'r>),
    Unmatched,
    /// Descriptions of every viable implementation.
    Ambiguous(Vec<String>),
}

pub struct Matcher<'r> {
    steps: &'r StepRegistry,
    transforms: &'r TransformRegistry,
}

impl<'r> Matcher<'r> {
    pub fn new(steps: &'r StepRegistry, transforms: &'r TransformRegistry) -> Self {
        Matcher { steps, transforms }
    }

    pub fn resolve(&self, text: &str, tables: &[Table], text_blocks: &[TextBlock]) -> Resolution<'r> {
        let steps: &'r StepRegistry = self.steps;
        let mut viable: Vec<BoundStep<'r>> = Vec::new();

        for (index, implementation) in steps.iter().enumerate() {
            if let Some(args) = self.bind(implementation, text, tables, text_blocks) {
                viable.push(BoundStep {
                    index,
                    implementation,
                    args,
                });
            }
        }

        match viable.len() {
            0 => Resolution::Unmatched,
            1 => Resolution::Bound(viable.remove(0)),
            _ => Resolution::Ambiguous(
                viable
                    .iter()
                    .map(|bound| bound.implementation.description())
                    .collect(),
            ),
        }
    }

    /// Arguments for `step`, or `None` when it is not viable for this text.
    fn bind(
        &self,
        step: &StepImplementation,
        text: &str,
        tables: &[Table],
        text_blocks: &[TextBlock],
    ) -> Option<Vec<Arg>> {
        if step.table_count() != tables.len() || step.text_block_count() != text_blocks.len() {
            return None;
        }
        let groups = capture_groups(step.regex(), text)?;

        let mut args = Vec::with_capacity(step.signature().len() - 1);
        for (raw, target) in groups[1..].iter().zip(step.captured_params()) {
            args.push(self.transforms.convert(raw, target)?);
        }

        let mut tables = tables.iter();
        let mut text_blocks = text_blocks.iter();
        for param in step.attachment_params() {
            let arg = match param {
                ParamType::Table => Arg::Table(tables.next()?.clone()),
                ParamType::TextBlock => Arg::TextBlock(text_blocks.next()?.clone()),
                _ => return None,
            };
            args.push(arg);
        }
        Some(args)
    }
}
