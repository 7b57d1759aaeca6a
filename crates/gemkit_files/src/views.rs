//! Views derived from the package file list: test files and executables.

use std::collections::BTreeMap;

/// Naming convention that identifies test files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFileConvention {
    /// Directory the tests live in, relative to the project root
    pub root: String,
    /// Required basename prefix
    pub prefix: String,
    /// Accepted extensions, without the dot
    pub extensions: Vec<String>,
}

impl Default for TestFileConvention {
    fn default() -> Self {
        Self {
            root: "test".to_string(),
            prefix: "test_".to_string(),
            extensions: vec!["rb".to_string()],
        }
    }
}

impl TestFileConvention {
    /// Whether `path` is a test file under this convention.
    pub fn matches(&self, path: &str) -> bool {
        let root = self.root.trim_end_matches('/');
        let Some(rest) = path
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return false;
        };

        let basename = basename(rest);
        let Some(stem_and_ext) = basename.strip_prefix(self.prefix.as_str()) else {
            return false;
        };

        self.extensions.iter().any(|ext| {
            stem_and_ext
                .strip_suffix(ext.as_str())
                .and_then(|stem| stem.strip_suffix('.'))
                .is_some_and(|stem| !stem.is_empty())
        })
    }
}

/// Keep the package files that follow the test naming convention.
pub fn test_files<S: AsRef<str>>(package_files: &[S], convention: &TestFileConvention) -> Vec<String> {
    package_files
        .iter()
        .map(AsRef::as_ref)
        .filter(|path| convention.matches(path))
        .map(str::to_string)
        .collect()
}

/// Which files below the executable directory count as executables.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableScope {
    /// Only files directly inside the directory
    #[default]
    DirectChildren,
    /// Files at any depth, reduced to their basename
    Recursive,
}

/// Basenames of the executables shipped in `bin_root`, sorted and unique.
///
/// With [`ExecutableScope::Recursive`] two files can share a basename. The
/// one that sorts last wins.
pub fn executables<S: AsRef<str>>(
    package_files: &[S],
    bin_root: &str,
    scope: ExecutableScope,
) -> Vec<String> {
    let bin_root = bin_root.trim_end_matches('/');

    let mut candidates = package_files
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|path| {
            let rest = path.strip_prefix(bin_root)?.strip_prefix('/')?;
            match scope {
                ExecutableScope::DirectChildren if rest.contains('/') => None,
                _ => Some(path),
            }
        })
        .collect::<Vec<_>>();
    candidates.sort_unstable();

    let mut by_name: BTreeMap<&str, &str> = BTreeMap::new();
    for path in candidates {
        if let Some(previous) = by_name.insert(basename(path), path) {
            tracing::debug!("executable {path} shadows {previous}");
        }
    }

    by_name.into_keys().map(str::to_string).collect()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
