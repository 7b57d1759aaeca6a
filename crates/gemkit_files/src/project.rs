//! The selection context of a single project.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use crate::discover::{DEFAULT_VCS_DIR, FileDiscovery};
use crate::pattern::{IgnoreMatcher, UnsupportedPatternPolicy};
use crate::select::{SelectionRules, SubmodulePolicy, ignored, select};
use crate::vcs::{Submodules, TrackedFiles, submodule_paths};
use crate::views::{ExecutableScope, TestFileConvention, executables, test_files};
use crate::{FileSelectionError, Result};

/// Knobs of the file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Ignore file, relative to the project root
    pub ignore_file: String,
    /// Name of the git metadata directory
    pub vcs_dir: String,
    /// What to do with ignore patterns that cannot be honored
    pub pattern_policy: UnsupportedPatternPolicy,
    /// Whether tracked files may rescue submodule contents
    pub submodule_policy: SubmodulePolicy,
    /// Whether submodule contents are excluded at all
    pub exclude_submodules: bool,
    /// Test file naming convention
    pub test_convention: TestFileConvention,
    /// Directory that holds the executables
    pub bin_root: String,
    /// Which files below `bin_root` are executables
    pub executable_scope: ExecutableScope,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            ignore_file: ".gitignore".to_string(),
            vcs_dir: DEFAULT_VCS_DIR.to_string(),
            pattern_policy: UnsupportedPatternPolicy::default(),
            submodule_policy: SubmodulePolicy::default(),
            exclude_submodules: true,
            test_convention: TestFileConvention::default(),
            bin_root: "bin".to_string(),
            executable_scope: ExecutableScope::default(),
        }
    }
}

/// The files of one project, computed lazily and at most once.
///
/// Every list is cached on first access, so a `ProjectFiles` reflects the
/// filesystem as it was when a list was first requested. Create a new value
/// to observe later changes.
///
/// # Examples
/// ```rust,no_run
/// # use gemkit_files::{ProjectFiles, SelectorConfig};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let project = ProjectFiles::new("/path/to/gem", SelectorConfig::default())?;
/// for file in project.package_files()? {
///     println!("{file}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProjectFiles {
    root: PathBuf,
    config: SelectorConfig,
    all_files: OnceCell<Vec<String>>,
    matcher: OnceCell<IgnoreMatcher>,
    tracked: OnceCell<TrackedFiles>,
    submodules: OnceCell<Submodules>,
    rules: OnceCell<SelectionRules>,
    package_files: OnceCell<Vec<String>>,
    test_files: OnceCell<Vec<String>>,
    executables: OnceCell<Vec<String>>,
    ignored_files: OnceCell<Vec<String>>,
}

fn cached<T>(cell: &OnceCell<T>, init: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}

impl ProjectFiles {
    /// Create the context for the project at `root`.
    pub fn new(root: impl AsRef<Path>, config: SelectorConfig) -> Result<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|e| FileSelectionError::io(root, e))?;
        if !root.is_dir() {
            return Err(FileSelectionError::NotADirectory(root));
        }

        Ok(Self {
            root,
            config,
            all_files: OnceCell::new(),
            matcher: OnceCell::new(),
            tracked: OnceCell::new(),
            submodules: OnceCell::new(),
            rules: OnceCell::new(),
            package_files: OnceCell::new(),
            test_files: OnceCell::new(),
            executables: OnceCell::new(),
            ignored_files: OnceCell::new(),
        })
    }

    /// The canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration the context was created with.
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Every regular file below the root, sorted.
    pub fn all_files(&self) -> Result<&[String]> {
        cached(&self.all_files, || {
            FileDiscovery::new(&self.root)
                .excluded_names([self.config.vcs_dir.as_str()])
                .collect()
        })
        .map(Vec::as_slice)
    }

    /// The compiled ignore file.
    pub fn matcher(&self) -> Result<&IgnoreMatcher> {
        cached(&self.matcher, || {
            IgnoreMatcher::from_file(
                &self.root.join(&self.config.ignore_file),
                self.config.pattern_policy,
            )
        })
    }

    /// The files git tracks.
    pub fn tracked(&self) -> Result<&TrackedFiles> {
        cached(&self.tracked, || {
            TrackedFiles::from_git_dir(&self.root, &self.config.vcs_dir)
        })
    }

    /// The submodule prefixes, empty when submodules are not excluded.
    pub fn submodules(&self) -> Result<&Submodules> {
        cached(&self.submodules, || {
            if self.config.exclude_submodules {
                submodule_paths(&self.root)
            } else {
                Ok(Submodules::empty())
            }
        })
    }

    /// The rules combining ignore patterns, tracked files and submodules.
    pub fn rules(&self) -> Result<&SelectionRules> {
        cached(&self.rules, || {
            Ok(SelectionRules::new(self.matcher()?.clone())
                .with_tracked(self.tracked()?.clone())
                .with_submodules(self.submodules()?.clone(), self.config.submodule_policy))
        })
    }

    /// The files that go into the package.
    pub fn package_files(&self) -> Result<&[String]> {
        cached(&self.package_files, || {
            let files = select(self.all_files()?, self.rules()?);
            tracing::debug!("selected {} package files", files.len());
            Ok(files)
        })
        .map(Vec::as_slice)
    }

    /// The package files that are tests.
    pub fn test_files(&self) -> Result<&[String]> {
        cached(&self.test_files, || {
            Ok(test_files(
                self.package_files()?,
                &self.config.test_convention,
            ))
        })
        .map(Vec::as_slice)
    }

    /// Basenames of the executables in the package.
    pub fn executables(&self) -> Result<&[String]> {
        cached(&self.executables, || {
            Ok(executables(
                self.package_files()?,
                &self.config.bin_root,
                self.config.executable_scope,
            ))
        })
        .map(Vec::as_slice)
    }

    /// Files excluded by the ignore file and not tracked by git.
    pub fn ignored_files(&self) -> Result<&[String]> {
        cached(&self.ignored_files, || {
            Ok(ignored(self.all_files()?, self.rules()?))
        })
        .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use pretty_assertions::assert_eq;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_lists_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rb");
        let project = ProjectFiles::new(dir.path(), SelectorConfig::default()).unwrap();
        assert_eq!(project.all_files().unwrap(), ["a.rb"]);

        touch(dir.path(), "b.rb");
        assert_eq!(project.all_files().unwrap(), ["a.rb"]);

        let fresh = ProjectFiles::new(dir.path(), SelectorConfig::default()).unwrap();
        assert_eq!(fresh.all_files().unwrap(), ["a.rb", "b.rb"]);
    }

    #[test]
    fn test_custom_ignore_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rb");
        touch(dir.path(), "a.o");
        fs::write(dir.path().join(".pkgignore"), "*.o\n").unwrap();

        let config = SelectorConfig {
            ignore_file: ".pkgignore".to_string(),
            ..SelectorConfig::default()
        };
        let project = ProjectFiles::new(dir.path(), config).unwrap();
        assert_eq!(project.package_files().unwrap(), [".pkgignore", "a.rb"]);
        assert_eq!(project.ignored_files().unwrap(), ["a.o"]);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectFiles::new(dir.path().join("nope"), SelectorConfig::default()).unwrap_err();
        assert!(matches!(err, FileSelectionError::Io { .. }));
    }

    #[test]
    fn test_error_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rb");
        fs::write(dir.path().join(".gitignore"), "!keep\n").unwrap();
        let config = SelectorConfig {
            pattern_policy: UnsupportedPatternPolicy::Error,
            ..SelectorConfig::default()
        };
        let project = ProjectFiles::new(dir.path(), config).unwrap();
        assert!(project.package_files().is_err());

        fs::write(dir.path().join(".gitignore"), "keep\n").unwrap();
        assert_eq!(project.package_files().unwrap(), [".gitignore", "a.rb"]);
    }
}
