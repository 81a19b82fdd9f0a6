use std::ops::Range;

use crate::table::{Table, TextBlock};

/// One parsed spec file: a title, shared before/after steps and scenarios.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecDocument {
    /// Where the document was loaded from (empty for in-memory sources).
    pub path: String,
    /// Text of the last level-1 heading.
    pub name: String,
    /// Steps declared before the first scenario. Prefixed to every scenario.
    pub before_steps: Vec<Step>,
    pub scenarios: Vec<Scenario>,
    /// Steps declared after a `---` once a scenario exists. Appended to every scenario.
    pub after_steps: Vec<Step>,
    /// Tables declared at document scope.
    pub tables: Vec<Table>,
}

impl SpecDocument {
    /// The steps a scenario actually runs: before steps, its own steps, after steps.
    pub fn effective_steps<'a>(&'a self, scenario: &'a Scenario) -> impl Iterator<Item = &'a Step> {
        self.before_steps
            .iter()
            .chain(scenario.steps.iter())
            .chain(self.after_steps.iter())
    }

    pub fn effective_step_count(&self, scenario: &Scenario) -> usize {
        self.before_steps.len() + scenario.steps.len() + self.after_steps.len()
    }

    /// `path/name`, the identity used in diagnostics and host units.
    pub fn qualified_name(&self) -> String {
        match (self.path.is_empty(), self.name.is_empty()) {
            (true, _) => self.name.clone(),
            (false, true) => self.path.clone(),
            (false, false) => format!("{}/{}", self.path, self.name),
        }
    }
}

/// A named, ordered list of steps under a level-2 heading.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
    pub tables: Vec<Table>,
    /// Byte span of the heading in the source.
    pub span: Range<usize>,
}

/// One list item of a spec.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    /// Step text after table substitution. Code spans keep their backticks.
    pub text: String,
    /// `<name>` tokens no enclosing table could resolve.
    pub params: Vec<String>,
    pub tables: Vec<Table>,
    pub text_blocks: Vec<TextBlock>,
    /// Set when the item carried emphasis; the step runs even after a failure.
    pub force: bool,
    /// Byte span of the list item in the source.
    pub span: Range<usize>,
}

impl Step {
    /// Parameter names without the surrounding angle brackets.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| param_name(p))
    }

    /// A step with unresolved parameters can never run.
    pub fn is_pending(&self) -> bool {
        !self.params.is_empty()
    }
}

/// Strip the `<`/`>` decoration from a parameter token.
pub fn param_name(token: &str) -> &str {
    token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(text: &str) -> Step {
        Step {
            text: text.to_string(),
            ..Step::default()
        }
    }

    #[test]
    fn effective_steps_wrap_scenario_steps() {
        let scenario = Scenario {
            name: "S".into(),
            steps: vec![step("middle")],
            ..Scenario::default()
        };
        let doc = SpecDocument {
            before_steps: vec![step("first")],
            after_steps: vec![step("last")],
            scenarios: vec![scenario.clone()],
            ..SpecDocument::default()
        };
        let texts: Vec<&str> = doc.effective_steps(&scenario).map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["first", "middle", "last"]);
        assert_eq!(doc.effective_step_count(&scenario), 3);
    }

    #[test]
    fn param_names_drop_brackets() {
        let mut s = step("The <a> and <b>");
        s.params = vec!["<a>".into(), "<b>".into()];
        assert_eq!(s.param_names().collect::<Vec<_>>(), ["a", "b"]);
        assert!(s.is_pending());
    }

    #[test]
    fn qualified_name_joins_path_and_title() {
        let doc = SpecDocument {
            path: "specs/a.spec".into(),
            name: "Adding".into(),
            ..SpecDocument::default()
        };
        assert_eq!(doc.qualified_name(), "specs/a.spec/Adding");
    }
}
