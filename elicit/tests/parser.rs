use elicit::{Parser, SpecDocument, parse_str};

fn texts(steps: &[elicit::Step]) -> Vec<&str> {
    steps.iter().map(|s| s.text.as_str()).collect()
}

fn parse_with_warnings(source: &str) -> (SpecDocument, usize) {
    let parsed = Parser::new(source.to_string(), 0).parse();
    (parsed.document, parsed.warnings.len())
}

#[test]
fn title_and_scenarios() {
    let doc = parse_str("# Calculator\n\n## Add numbers\n\n- Step one\n- Step two\n\n## Empty\n");
    assert_eq!(doc.name, "Calculator");
    assert_eq!(doc.scenarios.len(), 2);
    assert_eq!(doc.scenarios[0].name, "Add numbers");
    assert_eq!(texts(&doc.scenarios[0].steps), ["Step one", "Step two"]);
    assert!(doc.scenarios[1].steps.is_empty());
}

#[test]
fn ordered_items_are_steps_too() {
    let doc = parse_str("## S\n\n1. First\n2. Second\n");
    assert_eq!(texts(&doc.scenarios[0].steps), ["First", "Second"]);
}

#[test]
fn rule_separates_before_and_after_steps() {
    let src = "# Doc\n\n- Setup\n\n## A\n\n- In A\n\n## B\n\n- In B\n\n---\n\n- Teardown\n";
    let doc = parse_str(src);
    assert_eq!(texts(&doc.before_steps), ["Setup"]);
    assert_eq!(texts(&doc.scenarios[0].steps), ["In A"]);
    assert_eq!(texts(&doc.scenarios[1].steps), ["In B"]);
    assert_eq!(texts(&doc.after_steps), ["Teardown"]);

    let effective: Vec<&str> = doc
        .effective_steps(&doc.scenarios[1])
        .map(|s| s.text.as_str())
        .collect();
    assert_eq!(effective, ["Setup", "In B", "Teardown"]);
}

#[test]
fn rule_before_any_scenario_keeps_before_steps() {
    let doc = parse_str("- a\n\n---\n\n- b\n");
    assert_eq!(texts(&doc.before_steps), ["a", "b"]);
    assert!(doc.after_steps.is_empty());
}

#[test]
fn table_rows_expand_parameterised_step() {
    let src = r#"# Calc

## Add numbers

| a  | b  | sum |
|----|----|-----|
| 2  | 3  | 5   |
| 10 | -1 | 9   |

- The sum of <a> and <b> is <sum>
"#;
    let (doc, warnings) = parse_with_warnings(src);
    let scenario = &doc.scenarios[0];
    assert_eq!(scenario.tables.len(), 1);
    assert_eq!(
        texts(&scenario.steps),
        ["The sum of 2 and 3 is 5", "The sum of 10 and -1 is 9"]
    );
    assert!(scenario.steps.iter().all(|s| s.params.is_empty()));
    assert_eq!(warnings, 0);
}

#[test]
fn document_tables_resolve_parameters() {
    let src = "# Doc\n\nValues:\n\n| x |\n|---|\n| 1 |\n| 2 |\n\n## S\n\n- x is <x>\n";
    let doc = parse_str(src);
    assert_eq!(doc.tables.len(), 1);
    assert_eq!(texts(&doc.scenarios[0].steps), ["x is 1", "x is 2"]);
}

#[test]
fn unresolved_parameters_stay_on_the_step() {
    let (doc, warnings) = parse_with_warnings("## S\n\n- Hello <name>\n");
    let step = &doc.scenarios[0].steps[0];
    assert_eq!(step.text, "Hello <name>");
    assert_eq!(step.params, ["<name>"]);
    assert_eq!(warnings, 1);
}

#[test]
fn table_after_step_attaches_to_step() {
    let src = "## S\n\n- Given users:\n\n| name |\n|------|\n| ann  |\n| bob  |\n";
    let doc = parse_str(src);
    let step = &doc.scenarios[0].steps[0];
    assert_eq!(step.tables.len(), 1);
    assert_eq!(step.tables[0].columns, ["name"]);
    assert_eq!(step.tables[0].cell(1, "name"), Some("bob"));
    assert!(doc.scenarios[0].tables.is_empty());
}

#[test]
fn paragraph_closes_the_current_step() {
    let src = "## S\n\n- A step\n\nSome prose.\n\n| x |\n|---|\n| 1 |\n";
    let doc = parse_str(src);
    assert!(doc.scenarios[0].steps[0].tables.is_empty());
    assert_eq!(doc.scenarios[0].tables.len(), 1);
}

#[test]
fn fenced_code_after_item_attaches_as_text_block() {
    let src = "## S\n\n- Create a `config.toml` file:\n\n```toml\nkey = 1\n```\n";
    let doc = parse_str(src);
    let step = &doc.scenarios[0].steps[0];
    assert_eq!(step.text, "Create a `config.toml` file:");
    assert_eq!(step.text_blocks.len(), 1);
    assert_eq!(step.text_blocks[0].language, "toml");
    assert_eq!(step.text_blocks[0].content, "key = 1\n");
}

#[test]
fn fenced_code_inside_item_attaches_to_that_item() {
    let src = "## S\n\n- First:\n\n  ```\n  body\n  ```\n\n- Second\n";
    let doc = parse_str(src);
    let steps = &doc.scenarios[0].steps;
    assert_eq!(texts(steps), ["First:", "Second"]);
    assert_eq!(steps[0].text_blocks.len(), 1);
    assert_eq!(steps[0].text_blocks[0].content, "body\n");
    assert!(steps[1].text_blocks.is_empty());
}

#[test]
fn expansion_leaves_code_spans_alone() {
    let src = "## S\n\n| a |\n|---|\n| 7 |\n\n- Use `<a>` literally with <a>\n";
    let doc = parse_str(src);
    assert_eq!(texts(&doc.scenarios[0].steps), ["Use `<a>` literally with 7"]);
}

#[test]
fn emphasis_forces_the_step() {
    let doc = parse_str("## S\n\n- *Always* clean up\n- __Really__ always\n- Plain\n");
    let steps = &doc.scenarios[0].steps;
    assert_eq!(steps[0].text, "Always clean up");
    assert!(steps[0].force);
    assert!(steps[1].force);
    assert!(!steps[2].force);
}

#[test]
fn nested_lists_are_ignored_with_a_warning() {
    let (doc, warnings) = parse_with_warnings("## S\n\n- Outer\n  - Inner\n- Next\n");
    assert_eq!(texts(&doc.scenarios[0].steps), ["Outer", "Next"]);
    assert_eq!(warnings, 1);
}

#[test]
fn heading_resets_to_document_scope() {
    let src = "## A\n\n- a\n\n# Renamed\n\n| x |\n|---|\n| 1 |\n";
    let doc = parse_str(src);
    assert_eq!(doc.name, "Renamed");
    assert_eq!(doc.tables.len(), 1);
    assert!(doc.scenarios[0].tables.is_empty());
}

#[test]
fn path_is_recorded() {
    let parsed = Parser::new("# T\n".to_string(), 3).with_path("specs/t.spec").parse();
    assert_eq!(parsed.document.path, "specs/t.spec");
    assert_eq!(parsed.document.qualified_name(), "specs/t.spec/T");
}
