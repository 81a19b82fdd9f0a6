use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::context::IntoOutcome;

/// Where in the lifecycle a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Before the scenarios of each document.
    BeforeSpec,
    /// After the scenarios of each document.
    AfterSpec,
    /// Before each step that executes.
    BeforeStep,
    /// After each step that executes.
    AfterStep,
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookPoint::BeforeSpec => "before-spec",
            HookPoint::AfterSpec => "after-spec",
            HookPoint::BeforeStep => "before-step",
            HookPoint::AfterStep => "after-step",
        };
        f.write_str(name)
    }
}

type Hook = Box<dyn Fn() -> Result<(), String>>;

#[derive(Default)]
pub struct Hooks {
    before_spec: Vec<Hook>,
    after_spec: Vec<Hook>,
    before_step: Vec<Hook>,
    after_step: Vec<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R, F>(&mut self, point: HookPoint, hook: F)
    where
        R: IntoOutcome,
        F: Fn() -> R + 'static,
    {
        self.at_mut(point)
            .push(Box::new(move || hook().into_outcome()));
    }

    pub fn len(&self, point: HookPoint) -> usize {
        self.at(point).len()
    }

    fn at(&self, point: HookPoint) -> &Vec<Hook> {
        match point {
            HookPoint::BeforeSpec => &self.before_spec,
            HookPoint::AfterSpec => &self.after_spec,
            HookPoint::BeforeStep => &self.before_step,
            HookPoint::AfterStep => &self.after_step,
        }
    }

    fn at_mut(&mut self, point: HookPoint) -> &mut Vec<Hook> {
        match point {
            HookPoint::BeforeSpec => &mut self.before_spec,
            HookPoint::AfterSpec => &mut self.after_spec,
            HookPoint::BeforeStep => &mut self.before_step,
            HookPoint::AfterStep => &mut self.after_step,
        }
    }

    /// Run the hooks at `point` in registration order, stopping at the
    /// first one that errors or panics.
    pub fn invoke(&self, point: HookPoint) -> Result<(), String> {
        for hook in self.at(point) {
            catch_panic(|| hook())??;
        }
        Ok(())
    }
}

/// Run caller code, turning a panic into its message.
pub(crate) fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn hooks_run_in_order_until_one_fails() {
        let calls = Rc::new(Cell::new(0));
        let mut hooks = Hooks::new();
        let c = calls.clone();
        hooks.add(HookPoint::BeforeStep, move || c.set(c.get() + 1));
        hooks.add(HookPoint::BeforeStep, || -> Result<(), String> { Err("nope".into()) });
        let c = calls.clone();
        hooks.add(HookPoint::BeforeStep, move || c.set(c.get() + 10));

        assert_eq!(hooks.invoke(HookPoint::BeforeStep), Err("nope".to_string()));
        assert_eq!(calls.get(), 1);
        assert_eq!(hooks.invoke(HookPoint::AfterStep), Ok(()));
    }

    #[test]
    fn panics_are_contained() {
        let mut hooks = Hooks::new();
        hooks.add(HookPoint::BeforeSpec, || -> Result<(), String> {
            panic!("database is down")
        });
        assert_eq!(
            hooks.invoke(HookPoint::BeforeSpec),
            Err("database is down".to_string())
        );
        assert_eq!(hooks.len(HookPoint::BeforeSpec), 1);
    }

    #[test]
    fn formatted_panics_keep_their_message() {
        let n = 3;
        let result: Result<(), String> = catch_panic(|| panic!("step {} exploded", n));
        assert_eq!(result, Err("step 3 exploded".to_string()));
    }
}
