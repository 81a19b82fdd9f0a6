//! Converting captured strings into typed step arguments.
//!
//! Transforms are grouped by target type and tried in registration order.
//! A transform is only offered strings its guard pattern fully matches; the
//! first one that produces a value wins.

use std::collections::HashMap;

use regex::Regex;

use crate::error::RegistrationError;
use crate::pattern::{capture_groups, compile_anchored};
use crate::value::{Arg, ParamType, StepArg};

type Converter = Box<dyn Fn(&[&str], &ParamType, &TransformRegistry) -> Option<Arg>>;

struct TransformEntry {
    guard: Regex,
    convert: Converter,
}

pub struct TransformRegistry {
    by_target: HashMap<ParamType, Vec<TransformEntry>>,
    /// Transforms that build any `Vec<T>` out of its element transforms.
    any_list: Vec<TransformEntry>,
}

impl TransformRegistry {
    /// A registry holding the built-in transforms.
    pub fn new() -> Self {
        let mut registry = TransformRegistry::empty();
        if let Err(err) = registry.register_builtins() {
            tracing::error!(%err, "built-in transform rejected");
        }
        registry
    }

    /// A registry with no transforms at all.
    pub fn empty() -> Self {
        TransformRegistry {
            by_target: HashMap::new(),
            any_list: Vec::new(),
        }
    }

    fn register_builtins(&mut self) -> Result<(), RegistrationError> {
        self.register::<String, _>(r"(?s:.*)", |g| Some(g[0].to_string()))?;
        self.register::<i32, _>(r"-?\d+", |g| g[0].parse().ok())?;
        self.register::<i64, _>(r"-?\d+", |g| g[0].parse().ok())?;
        self.register::<u32, _>(r"-?\d+", |g| g[0].parse().ok())?;
        self.register::<u64, _>(r"-?\d+", |g| g[0].parse().ok())?;
        self.register::<usize, _>(r"-?\d+", |g| g[0].parse().ok())?;
        self.register::<f64, _>(r"-?\d+(?:\.\d+)?", |g| g[0].parse().ok())?;
        self.register::<bool, _>(r"(?:true|false)", |g| g[0].parse().ok())?;
        self.register_any_list(r"(?:.+,\s*)*.+", Box::new(comma_list))
    }

    /// Register a transform producing `T`.
    ///
    /// `convert` receives the guard's full match followed by the guard's own
    /// capture groups, so one transform can assemble a composite value.
    pub fn register<T, F>(&mut self, pattern: &str, convert: F) -> Result<(), RegistrationError>
    where
        T: StepArg,
        F: Fn(&[&str]) -> Option<T> + 'static,
    {
        let target = T::param_type();
        if matches!(
            target,
            ParamType::Context | ParamType::Table | ParamType::TextBlock
        ) {
            return Err(RegistrationError::UnsupportedTarget {
                pattern: pattern.to_string(),
                target: target.to_string(),
            });
        }
        let guard = compile_guard(pattern)?;
        let convert: Converter = Box::new(
            move |groups: &[&str], _: &ParamType, _: &TransformRegistry| {
                convert(groups).map(Arg::value)
            },
        );
        self.by_target
            .entry(target)
            .or_default()
            .push(TransformEntry { guard, convert });
        Ok(())
    }

    fn register_any_list(&mut self, pattern: &str, convert: Converter) -> Result<(), RegistrationError> {
        let guard = compile_guard(pattern)?;
        self.any_list.push(TransformEntry { guard, convert });
        Ok(())
    }

    /// Convert `raw` into a value of type `target`, or `None` when no
    /// transform accepts it.
    pub fn convert(&self, raw: &str, target: &ParamType) -> Option<Arg> {
        let exact = self.by_target.get(target).into_iter().flatten();
        let lists = matches!(target, ParamType::List(_))
            .then_some(&self.any_list)
            .into_iter()
            .flatten();

        for entry in exact.chain(lists) {
            let Some(groups) = capture_groups(&entry.guard, raw) else {
                continue;
            };
            if let Some(arg) = (entry.convert)(&groups, target, self) {
                return Some(arg);
            }
        }
        None
    }

    /// Whether any transform could ever produce `target`.
    pub fn has_transform(&self, target: &ParamType) -> bool {
        if self.by_target.get(target).is_some_and(|e| !e.is_empty()) {
            return true;
        }
        match target {
            ParamType::List(element) => !self.any_list.is_empty() && self.has_transform(element),
            _ => false,
        }
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

type Registration = Box<dyn FnOnce(&mut TransformRegistry) -> Result<(), RegistrationError>>;

/// A batch of transform registrations, applied to a registry later.
#[derive(Default)]
pub struct Transforms {
    entries: Vec<Registration>,
}

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform<T, F>(mut self, pattern: &str, convert: F) -> Self
    where
        T: StepArg,
        F: Fn(&[&str]) -> Option<T> + 'static,
    {
        let pattern = pattern.to_string();
        self.entries
            .push(Box::new(move |registry: &mut TransformRegistry| {
                registry.register::<T, F>(&pattern, convert)
            }));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register every entry, returning the ones that were rejected.
    pub fn register_into(self, registry: &mut TransformRegistry) -> Vec<RegistrationError> {
        self.entries
            .into_iter()
            .filter_map(|register| register(registry).err())
            .collect()
    }
}

fn compile_guard(pattern: &str) -> Result<Regex, RegistrationError> {
    compile_anchored(pattern).map_err(|e| RegistrationError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Split on commas and convert each trimmed fragment to the element type.
/// One bad fragment fails the whole list.
fn comma_list(groups: &[&str], target: &ParamType, registry: &TransformRegistry) -> Option<Arg> {
    let ParamType::List(element) = target else {
        return None;
    };
    groups[0]
        .split(',')
        .map(|fragment| registry.convert(fragment.trim(), element))
        .collect::<Option<Vec<_>>>()
        .map(Arg::List)
}
