//! Table-driven step expansion.
//!
//! A step such as `The sum of <a> and <b> is <sum>` is replaced by one
//! concrete step per data row of the first table whose columns cover all of
//! its parameters. Scenario tables are searched before document tables.

use crate::document::{Step, param_name};
use crate::parser::error::ParseError;
use crate::table::Table;

/// Expand every parameterised step in `steps`, in place and in order.
pub(crate) fn expand_steps(
    steps: Vec<Step>,
    scenario_tables: &[Table],
    document_tables: &[Table],
    file_id: usize,
    warnings: &mut Vec<ParseError>,
) -> Vec<Step> {
    let mut expanded = Vec::with_capacity(steps.len());
    for step in steps {
        if !step.is_pending() {
            expanded.push(step);
            continue;
        }
        match expand_step(&step, scenario_tables, document_tables) {
            Some(rows) => expanded.extend(rows),
            None => {
                warnings.push(ParseError::unresolved_params(
                    &step.params,
                    step.span.clone(),
                    file_id,
                ));
                expanded.push(step);
            }
        }
    }
    expanded
}

/// One concrete step per data row, or `None` when no table covers the
/// step's parameters.
pub fn expand_step(
    step: &Step,
    scenario_tables: &[Table],
    document_tables: &[Table],
) -> Option<Vec<Step>> {
    let table = find_table(step, scenario_tables).or_else(|| find_table(step, document_tables))?;

    let steps = table
        .rows
        .iter()
        .map(|row| {
            let text = step
                .text
                .split('`')
                .enumerate()
                .map(|(i, segment)| {
                    // Odd segments sit inside code spans and stay literal.
                    if i % 2 == 1 {
                        return segment.to_string();
                    }
                    step.params.iter().fold(segment.to_string(), |text, token| {
                        let value = row.get(param_name(token)).map(String::as_str).unwrap_or("");
                        text.replace(token.as_str(), value)
                    })
                })
                .collect::<Vec<_>>()
                .join("`");
            Step {
                text,
                params: Vec::new(),
                ..step.clone()
            }
        })
        .collect();
    Some(steps)
}

fn find_table<'t>(step: &Step, tables: &'t [Table]) -> Option<&'t Table> {
    tables
        .iter()
        .find(|table| table.has_columns(step.param_names()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn param_step(text: &str, params: &[&str]) -> Step {
        Step {
            text: text.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            ..Step::default()
        }
    }

    #[test]
    fn one_step_per_row() {
        let step = param_step("The sum of <a> and <b> is <sum>", &["<a>", "<b>", "<sum>"]);
        let t = table(&["a", "b", "sum"], &[&["2", "3", "5"], &["10", "-1", "9"]]);
        let steps = expand_step(&step, &[t], &[]).unwrap();
        let texts: Vec<&str> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["The sum of 2 and 3 is 5", "The sum of 10 and -1 is 9"]);
        assert!(steps.iter().all(|s| s.params.is_empty()));
    }

    #[test]
    fn scenario_tables_win_over_document_tables() {
        let step = param_step("x is <x>", &["<x>"]);
        let scenario = table(&["x"], &[&["scenario"]]);
        let document = table(&["x"], &[&["document"]]);
        let steps = expand_step(&step, &[scenario], &[document]).unwrap();
        assert_eq!(steps[0].text, "x is scenario");
    }

    #[test]
    fn first_superset_table_is_used() {
        let step = param_step("<a> <b>", &["<a>", "<b>"]);
        let partial = table(&["a"], &[&["no"]]);
        let full = table(&["b", "a", "extra"], &[&["2", "1", "-"]]);
        let steps = expand_step(&step, &[partial, full], &[]).unwrap();
        assert_eq!(steps[0].text, "1 2");
    }

    #[test]
    fn missing_table_keeps_the_step_and_warns() {
        let step = param_step("x is <x>", &["<x>"]);
        let mut warnings = Vec::new();
        let steps = expand_steps(vec![step.clone()], &[], &[table(&["y"], &[])], 0, &mut warnings);
        assert_eq!(steps, vec![step]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn code_spans_keep_their_placeholders() {
        let step = param_step("Use `<a>` literally with <a>", &["<a>"]);
        let steps = expand_step(&step, &[table(&["a"], &[&["7"]])], &[]).unwrap();
        assert_eq!(steps[0].text, "Use `<a>` literally with 7");
    }

    #[test]
    fn header_only_table_expands_to_nothing() {
        let step = param_step("x is <x>", &["<x>"]);
        let steps = expand_step(&step, &[table(&["x"], &[])], &[]).unwrap();
        assert!(steps.is_empty());
    }
}
