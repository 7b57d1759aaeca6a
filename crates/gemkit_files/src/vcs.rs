//! Files known to git.
//!
//! Both the tracked file list and the submodule prefixes are read by shelling
//! out to `git`. A project without a `.git` entry, or a machine without a git
//! executable, simply has no tracked files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::discover::DEFAULT_VCS_DIR;
use crate::{FileSelectionError, Result};

/// The relative paths git tracks in a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFiles {
    paths: BTreeSet<String>,
}

impl TrackedFiles {
    /// An empty set: ignore rules apply unconditionally.
    pub fn empty() -> Self {
        Self::default()
    }

    /// List the tracked files of the repository at `root/.git`.
    pub fn from_git(root: &Path) -> Result<Self> {
        Self::from_git_dir(root, DEFAULT_VCS_DIR)
    }

    /// List the tracked files of the repository stored at `root/<vcs_dir>`.
    pub fn from_git_dir(root: &Path, vcs_dir: &str) -> Result<Self> {
        let git_dir = root.join(vcs_dir);
        if !git_dir.exists() {
            tracing::debug!("{} does not exist, no files are tracked", git_dir.display());
            return Ok(Self::empty());
        }

        let Some(git) = find_git() else {
            return Ok(Self::empty());
        };

        let mut command = Command::new(git);
        command
            .arg(format!("--git-dir={}", git_dir.display()))
            .arg(format!("--work-tree={}", root.display()))
            .args(["ls-files", "-z"]);
        let output = run_git_command(&mut command)?;

        let tracked = Self::from_ls_files(&output.stdout);
        tracing::debug!("git tracks {} files", tracked.len());
        Ok(tracked)
    }

    /// Parse the NUL separated output of `git ls-files -z`.
    pub fn from_ls_files(stdout: &[u8]) -> Self {
        stdout
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| String::from_utf8_lossy(entry).into_owned())
            .collect()
    }

    /// Whether git tracks `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate the tracked paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TrackedFiles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Path prefixes of the git submodules of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submodules {
    prefixes: BTreeSet<String>,
}

impl Submodules {
    /// No submodules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `path` is a submodule root or lies below one.
    pub fn contains_path(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// Number of submodules.
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether the project has no submodules.
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Iterate the submodule prefixes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Submodules {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            prefixes: iter
                .into_iter()
                .map(|p| p.into().trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

/// Read the submodule paths declared in `root/.gitmodules`.
pub fn submodule_paths(root: &Path) -> Result<Submodules> {
    let gitmodules = root.join(".gitmodules");
    if !gitmodules.is_file() {
        return Ok(Submodules::empty());
    }

    let Some(git) = find_git() else {
        return Ok(Submodules::empty());
    };

    let mut command = Command::new(git);
    command
        .current_dir(root)
        .args(["config", "-z", "--file", ".gitmodules", "--get-regexp", "path"]);
    let output = command.output().map_err(FileSelectionError::GitSpawn)?;

    // `--get-regexp` exits with 1 when no key matches
    if output.status.code() == Some(1) {
        return Ok(Submodules::empty());
    }
    if !output.status.success() {
        return Err(git_error(&command, &output));
    }

    Ok(parse_submodule_config(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Parse `git config -z --get-regexp path` output.
///
/// Every record is `submodule.<name>.path\n<path>\0`. Submodule names may
/// contain spaces, so the key ends at the newline.
pub fn parse_submodule_config(stdout: &str) -> Submodules {
    stdout
        .split('\0')
        .filter_map(|record| record.split_once('\n'))
        .filter(|(key, _)| key.starts_with("submodule.") && key.ends_with(".path"))
        .map(|(_, value)| value)
        .collect()
}

fn find_git() -> Option<PathBuf> {
    match which::which("git") {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("git was not found ({e}), treating every file as untracked");
            None
        }
    }
}

fn run_git_command(command: &mut Command) -> Result<Output> {
    let output = command.output().map_err(FileSelectionError::GitSpawn)?;

    if !output.status.success() {
        tracing::error!("Command failed: {:?}", command);
        return Err(git_error(command, &output));
    }

    Ok(output)
}

fn git_error(command: &Command, output: &Output) -> FileSelectionError {
    let args = command
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    FileSelectionError::Git {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use pretty_assertions::assert_eq;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    fn git(root: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(root)
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn test_no_git_dir_means_nothing_tracked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rb"), "").unwrap();
        let tracked = TrackedFiles::from_git(dir.path()).unwrap();
        assert!(tracked.is_empty());
    }

    #[test]
    fn test_parse_ls_files() {
        let tracked = TrackedFiles::from_ls_files(b"a.rb\0lib/b c.rb\0\0");
        assert_eq!(tracked.iter().collect::<Vec<_>>(), vec!["a.rb", "lib/b c.rb"]);
        assert!(tracked.contains("lib/b c.rb"));
        assert!(!tracked.contains("lib"));
    }

    #[test]
    fn test_parse_submodule_config() {
        let submodules = parse_submodule_config(
            "submodule.task.path\ntask\0submodule.vendor/x.path\nvendor/x\0submodule.y.url\nignored\0",
        );
        assert_eq!(submodules.iter().collect::<Vec<_>>(), vec!["task", "vendor/x"]);

        let submodules =
            parse_submodule_config("submodule.my mod.path\nvendor/my mod\0submodule.z.path\nz\0");
        assert_eq!(submodules.iter().collect::<Vec<_>>(), vec!["vendor/my mod", "z"]);
    }

    #[test]
    fn test_submodule_prefix_matching() {
        let submodules: Submodules = ["task", "vendor/x/"].into_iter().collect();
        assert!(submodules.contains_path("task"));
        assert!(submodules.contains_path("task/gemgem.rb"));
        assert!(submodules.contains_path("vendor/x/lib/y.rb"));
        assert!(!submodules.contains_path("tasks/other.rb"));
        assert!(!submodules.contains_path("vendor/xy"));
        assert!(!submodules.contains_path("lib/task"));
    }

    #[test]
    fn test_ls_files_in_repository() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        git(root, &["init", "--quiet"]);
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/a.rb"), "").unwrap();
        fs::write(root.join("b.log"), "").unwrap();
        fs::write(root.join("untracked.rb"), "").unwrap();
        git(root, &["add", "lib/a.rb", "b.log"]);

        let tracked = TrackedFiles::from_git(root).unwrap();
        assert_eq!(tracked.iter().collect::<Vec<_>>(), vec!["b.log", "lib/a.rb"]);
    }

    #[test]
    fn test_broken_git_dir_is_an_error() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();

        let err = TrackedFiles::from_git(dir.path()).unwrap_err();
        assert!(matches!(err, FileSelectionError::Git { .. }), "{err}");
    }

    #[test]
    fn test_submodule_paths_from_gitmodules() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".gitmodules"),
            "[submodule \"task\"]\n\tpath = task\n\turl = https://example.com/task.git\n",
        )
        .unwrap();

        let submodules = submodule_paths(dir.path()).unwrap();
        assert_eq!(submodules.iter().collect::<Vec<_>>(), vec!["task"]);
    }

    #[test]
    fn test_submodule_name_with_spaces() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".gitmodules"),
            "[submodule \"my mod\"]\n\tpath = vendor/x\n[submodule \"task\"]\n\tpath = task\n",
        )
        .unwrap();

        let submodules = submodule_paths(dir.path()).unwrap();
        assert_eq!(submodules.iter().collect::<Vec<_>>(), vec!["task", "vendor/x"]);
        assert!(submodules.contains_path("vendor/x/lib/x.rb"));
    }

    #[test]
    fn test_no_gitmodules() {
        let dir = tempfile::tempdir().unwrap();
        assert!(submodule_paths(dir.path()).unwrap().is_empty());
    }
}
