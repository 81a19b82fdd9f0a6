use std::path::{Path, PathBuf};

use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use elicit::{Parsed, Parser, SpecDocument, Step};
use runner::RunConfig;
use runner::discovery::discover;

/// A spec file read from disk and parsed.
struct Loaded {
    path: PathBuf,
    parsed: Parsed,
}

/// Read and parse every spec under `root`, registering each source with
/// `files` so warnings can point into it.
fn load_all(
    root: &Path,
    config: &RunConfig,
    files: &mut SimpleFiles<String, String>,
) -> Result<Vec<Loaded>, String> {
    let paths = discover(root, config);
    if paths.is_empty() {
        return Err(format!("no spec documents found in {}", root.display()));
    }

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let source = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let name = path.to_string_lossy().replace('\\', "/");
        let file_id = files.add(name.clone(), source.clone());
        let parsed = Parser::new(source, file_id).with_path(name).parse();
        tracing::debug!(
            path = %path.display(),
            scenarios = parsed.document.scenarios.len(),
            warnings = parsed.warnings.len(),
            "parsed spec document"
        );
        loaded.push(Loaded { path, parsed });
    }
    Ok(loaded)
}

/// Parse everything, print warnings with source context.
/// Returns exit code: 0 = clean, 1 = unreadable input, or warnings under
/// `deny_warnings`.
pub fn check(root: &Path, config: &RunConfig, color: ColorChoice, deny_warnings: bool) -> i32 {
    let mut files = SimpleFiles::new();
    let loaded = match load_all(root, config, &mut files) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let writer = StandardStream::stderr(color);
    let term_config = term::Config::default();
    let mut warnings = 0usize;
    let mut errors = 0usize;

    for file in &loaded {
        for warning in &file.parsed.warnings {
            if warning.is_error() {
                errors += 1;
            } else {
                warnings += 1;
            }
            let diagnostic = warning.to_diagnostic();
            let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
        }
        let doc = &file.parsed.document;
        eprintln!(
            "ok: {} ({} scenario{}, {} warning{})",
            file.path.display(),
            doc.scenarios.len(),
            plural(doc.scenarios.len()),
            file.parsed.warnings.len(),
            plural(file.parsed.warnings.len()),
        );
    }

    if errors > 0 || (deny_warnings && warnings > 0) {
        1
    } else {
        0
    }
}

pub fn dump_ast(root: &Path, config: &RunConfig) -> i32 {
    let mut files = SimpleFiles::new();
    match load_all(root, config, &mut files) {
        Ok(loaded) => {
            for file in &loaded {
                println!("{:#?}", file.parsed.document);
            }
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

pub fn list(root: &Path, config: &RunConfig) -> i32 {
    let mut files = SimpleFiles::new();
    match load_all(root, config, &mut files) {
        Ok(loaded) => {
            for file in &loaded {
                print!("{}", render_listing(&file.parsed.document));
            }
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

/// Each scenario with the steps it runs, shared steps included.
fn render_listing(doc: &SpecDocument) -> String {
    let mut out = String::new();
    let title = if doc.name.is_empty() { "(untitled)" } else { doc.name.as_str() };
    out.push_str(&format!("# {}  [{}]\n", title, doc.path));
    if doc.scenarios.is_empty() {
        out.push_str("  (no scenarios)\n");
    }
    for scenario in &doc.scenarios {
        out.push_str(&format!("  ## {}\n", scenario.name));
        for step in doc.effective_steps(scenario) {
            out.push_str(&format!("    {}\n", describe_step(step)));
        }
    }
    out
}

fn describe_step(step: &Step) -> String {
    let mut line = String::new();
    line.push_str(if step.is_pending() { "? " } else { "- " });
    if step.force {
        line.push_str("! ");
    }
    line.push_str(&step.text);
    line.push_str(&" ☰".repeat(step.text_blocks.len()));
    line.push_str(&" ☷".repeat(step.tables.len()));
    line
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_includes_shared_steps_and_markers() {
        let source = "# Doc\n\n- setup\n\n## First\n\n- *must run*\n\n| a |\n|---|\n| 1 |\n\n- uses <missing>\n";
        let doc = Parser::new(source.to_string(), 0)
            .with_path("doc.spec")
            .parse()
            .document;
        assert_eq!(
            render_listing(&doc),
            "# Doc  [doc.spec]\n  ## First\n    - setup\n    - ! must run ☷\n    ? uses <missing>\n"
        );
    }

    #[test]
    fn check_counts_warnings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.spec"), "## S\n\n- uses <missing>\n").unwrap();
        let config = RunConfig::default();
        assert_eq!(check(dir.path(), &config, ColorChoice::Never, false), 0);
        assert_eq!(check(dir.path(), &config, ColorChoice::Never, true), 1);
    }

    #[test]
    fn empty_folders_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(list(dir.path(), &RunConfig::default()), 1);
    }
}
