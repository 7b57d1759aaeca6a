//! Reconciling discovered files against ignore rules and git.

use crate::pattern::IgnoreMatcher;
use crate::vcs::{Submodules, TrackedFiles};

/// How submodule exclusion interacts with the tracked file override.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SubmodulePolicy {
    /// Files inside a submodule are always excluded
    #[default]
    Unconditional,
    /// Tracked files inside a submodule are kept, like ignored tracked files
    TrackedOverride,
}

/// Everything needed to decide whether a file belongs to the package.
#[derive(Debug, Clone, Default)]
pub struct SelectionRules {
    /// Compiled ignore patterns
    pub matcher: IgnoreMatcher,
    /// Files that are kept even when an ignore pattern matches
    pub tracked: TrackedFiles,
    /// Path prefixes excluded regardless of the ignore patterns
    pub submodules: Submodules,
    /// Whether tracked files may rescue submodule contents
    pub submodule_policy: SubmodulePolicy,
}

impl SelectionRules {
    /// Rules that only apply the given ignore patterns.
    pub fn new(matcher: IgnoreMatcher) -> Self {
        Self {
            matcher,
            ..Self::default()
        }
    }

    /// Set the tracked file override.
    pub fn with_tracked(mut self, tracked: TrackedFiles) -> Self {
        self.tracked = tracked;
        self
    }

    /// Set the submodule prefixes and how they interact with tracked files.
    pub fn with_submodules(mut self, submodules: Submodules, policy: SubmodulePolicy) -> Self {
        self.submodules = submodules;
        self.submodule_policy = policy;
        self
    }

    fn in_submodule(&self, path: &str) -> bool {
        if !self.submodules.contains_path(path) {
            return false;
        }
        match self.submodule_policy {
            SubmodulePolicy::Unconditional => true,
            SubmodulePolicy::TrackedOverride => !self.tracked.contains(path),
        }
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.matcher.is_match(path) && !self.tracked.contains(path)
    }

    /// Whether `path` goes into the package.
    pub fn includes(&self, path: &str) -> bool {
        !self.in_submodule(path) && !self.is_ignored(path)
    }
}

/// Keep the files of `all` that go into the package, preserving their order.
pub fn select<S: AsRef<str>>(all: &[S], rules: &SelectionRules) -> Vec<String> {
    all.iter()
        .map(AsRef::as_ref)
        .filter(|path| rules.includes(path))
        .map(str::to_string)
        .collect()
}

/// The files of `all` that the ignore patterns exclude.
///
/// Submodule contents are never reported, they belong to another repository.
pub fn ignored<S: AsRef<str>>(all: &[S], rules: &SelectionRules) -> Vec<String> {
    all.iter()
        .map(AsRef::as_ref)
        .filter(|path| !rules.submodules.contains_path(path) && rules.is_ignored(path))
        .map(str::to_string)
        .collect()
}
