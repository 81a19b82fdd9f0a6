use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z_][A-Za-z0-9_]*>").expect("placeholder pattern is valid"));

/// Accumulates the text of one list item or table cell.
///
/// Plain text is buffered in `run` so that a placeholder split across several
/// Markdown events (`<`, `first_name>`) is still recognised; code spans flush
/// the run and are never scanned for placeholders.
#[derive(Debug, Default)]
pub(crate) struct StepText {
    text: String,
    run: String,
    params: Vec<String>,
    force: bool,
}

impl StepText {
    pub fn push_text(&mut self, s: &str) {
        self.run.push_str(s);
    }

    pub fn push_code(&mut self, s: &str) {
        self.flush_run();
        self.text.push('`');
        self.text.push_str(s);
        self.text.push('`');
    }

    pub fn push_break(&mut self) {
        self.run.push(' ');
    }

    pub fn mark_forced(&mut self) {
        self.force = true;
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.run.trim().is_empty()
    }

    fn flush_run(&mut self) {
        for token in PLACEHOLDER.find_iter(&self.run) {
            let token = token.as_str();
            if !self.params.iter().any(|p| p == token) {
                self.params.push(token.to_string());
            }
        }
        self.text.push_str(&self.run);
        self.run.clear();
    }

    pub fn finish(mut self) -> FinishedText {
        self.flush_run();
        FinishedText {
            text: normalize_whitespace(&self.text),
            params: self.params,
            force: self.force,
        }
    }
}

pub(crate) struct FinishedText {
    pub text: String,
    pub params: Vec<String>,
    pub force: bool,
}

/// Trim and collapse runs of whitespace (soft breaks arrive as spaces).
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_recorded_once() {
        let mut t = StepText::default();
        t.push_text("The sum of ");
        t.push_text("<a>");
        t.push_text(" and <a> is <sum>");
        let done = t.finish();
        assert_eq!(done.text, "The sum of <a> and <a> is <sum>");
        assert_eq!(done.params, ["<a>", "<sum>"]);
    }

    #[test]
    fn split_placeholder_is_joined() {
        let mut t = StepText::default();
        t.push_text("Hello <");
        t.push_text("first_name>");
        assert_eq!(t.finish().params, ["<first_name>"]);
    }

    #[test]
    fn code_spans_keep_backticks_and_hide_placeholders() {
        let mut t = StepText::default();
        t.push_text("Create a ");
        t.push_code("<file>");
        t.push_text(" file:");
        let done = t.finish();
        assert_eq!(done.text, "Create a `<file>` file:");
        assert!(done.params.is_empty());
    }

    #[test]
    fn breaks_collapse_to_single_spaces() {
        let mut t = StepText::default();
        t.push_text("one");
        t.push_break();
        t.push_text("  two ");
        assert_eq!(t.finish().text, "one two");
    }
}
