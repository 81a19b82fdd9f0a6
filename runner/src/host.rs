//! The host test runner the engine reports verdicts to.

/// The three operations the engine needs from a test runner.
pub trait TestHost {
    /// Open a named sub-unit and run `body` inside it.
    fn run(&mut self, name: &str, body: &mut dyn FnMut(&mut dyn TestHost));
    /// Mark the current unit failed.
    fn fail(&mut self);
    /// Mark the current unit skipped. Nothing further is reported for it.
    fn skip_now(&mut self);
}

/// A test host that records the unit tree in memory.
///
/// Failure propagates to every enclosing unit, the way nested subtests
/// behave. Use [`HostUnit::assert_passed`] to surface the verdict to
/// `cargo test`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HostUnit {
    name: String,
    failed: bool,
    skipped: bool,
    children: Vec<HostUnit>,
}

impl HostUnit {
    pub fn new(name: impl Into<String>) -> Self {
        HostUnit {
            name: name.into(),
            ..HostUnit::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped && !self.failed
    }

    pub fn children(&self) -> &[HostUnit] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&HostUnit> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Paths of the innermost failed units, joined with `/`.
    pub fn failed_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_failed(&self.name, &mut paths);
        paths
    }

    fn collect_failed(&self, path: &str, out: &mut Vec<String>) {
        if !self.failed {
            return;
        }
        let failed_children: Vec<&HostUnit> = self.children.iter().filter(|c| c.failed).collect();
        if failed_children.is_empty() {
            out.push(path.to_string());
            return;
        }
        for child in failed_children {
            child.collect_failed(&format!("{}/{}", path, child.name), out);
        }
    }

    /// Panic listing every failed unit, if any failed.
    pub fn assert_passed(&self) {
        let failed = self.failed_paths();
        if !failed.is_empty() {
            panic!("{} unit(s) failed:\n  {}", failed.len(), failed.join("\n  "));
        }
    }
}

impl TestHost for HostUnit {
    fn run(&mut self, name: &str, body: &mut dyn FnMut(&mut dyn TestHost)) {
        let mut child = HostUnit::new(name);
        body(&mut child);
        if child.failed {
            self.failed = true;
        }
        self.children.push(child);
    }

    fn fail(&mut self) {
        self.failed = true;
    }

    fn skip_now(&mut self) {
        self.skipped = true;
    }
}
