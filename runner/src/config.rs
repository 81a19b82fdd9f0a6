use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::ColorChoice;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Settings for a run, usually kept in an `elicit.toml` next to the specs.
///
/// ```toml
/// specs = "tests/specs"
/// report = "target/elicit/report.txt"
/// verbose = true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Folder searched recursively for spec documents.
    pub specs: PathBuf,

    /// File name suffixes that mark a spec document.
    pub extensions: Vec<String>,

    /// Plain-text report written after the run.
    pub report: Option<PathBuf>,

    /// Render passing documents and scenarios too.
    pub verbose: bool,

    pub color: ColorMode,

    /// Collect what steps print into their logs.
    pub capture_output: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            specs: PathBuf::from("specs"),
            extensions: vec!["spec".to_string(), "spec.md".to_string()],
            report: None,
            verbose: false,
            color: ColorMode::Auto,
            capture_output: true,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Whether `file_name` ends with one of the configured extensions.
    pub fn matches_extension(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(RunConfig::from_toml_str("").unwrap(), RunConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
            specs = "tests/specs"
            extensions = ["feature.md"]
            report = "target/report.txt"
            verbose = true
            color = "never"
            capture_output = false
            "#,
        )
        .unwrap();
        assert_eq!(config.specs, PathBuf::from("tests/specs"));
        assert_eq!(config.extensions, ["feature.md"]);
        assert_eq!(config.report, Some(PathBuf::from("target/report.txt")));
        assert!(config.verbose);
        assert_eq!(config.color.choice(), ColorChoice::Never);
        assert!(!config.capture_output);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RunConfig::from_toml_str("colour = \"never\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = RunConfig::load("/definitely/not/here/elicit.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/elicit.toml"));
    }

    #[test]
    fn extensions_need_a_stem_and_a_dot() {
        let config = RunConfig::default();
        assert!(config.matches_extension("calc.spec"));
        assert!(config.matches_extension("calc.spec.md"));
        assert!(!config.matches_extension("calc.md"));
        assert!(!config.matches_extension("inspect"));
        assert!(!config.matches_extension(".spec"));
    }
}
