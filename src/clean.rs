//! Moving ignored files out of the project.

use std::{
    io,
    path::{Path, PathBuf},
};

use fs_err as fs;

/// Errors while cleaning the project.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CleanError {
    /// Moving a file failed
    #[error(transparent)]
    Io(#[from] io::Error),

    /// No trash directory was configured and the home directory is unknown
    #[error("could not determine the home directory for the default trash")]
    #[diagnostic(help("pass --trash-dir or set `clean.trash_dir` in gemkit.toml"))]
    NoHomeDir,
}

/// Resolve `~/` against the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf, CleanError> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(dirs::home_dir().ok_or(CleanError::NoHomeDir)?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// `~/.Trash`
pub fn default_trash_dir() -> Result<PathBuf, CleanError> {
    Ok(dirs::home_dir().ok_or(CleanError::NoHomeDir)?.join(".Trash"))
}

/// Rename, falling back to copy and remove across file systems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!("{} is on another device, copying", to.display());
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        result => result,
    }
}

/// Move every file in `ignored` from `root` to `trash/<relative path>`.
///
/// Returns the destinations. With `dry_run` nothing is touched.
pub fn clean(
    root: &Path,
    ignored: &[String],
    trash: &Path,
    dry_run: bool,
) -> Result<Vec<PathBuf>, CleanError> {
    let mut moved = Vec::with_capacity(ignored.len());
    for relative in ignored {
        let from = root.join(relative);
        let to = trash.join(relative);
        if dry_run {
            tracing::info!("would move {relative} to {}", to.display());
        } else {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            move_file(&from, &to)?;
            tracing::info!("moved {relative} to {}", to.display());
        }
        moved.push(to);
    }

    if ignored.is_empty() {
        tracing::info!("nothing to clean");
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn setup() -> (tempfile::TempDir, tempfile::TempDir, Vec<String>) {
        let project = tempfile::tempdir().unwrap();
        let trash = tempfile::tempdir().unwrap();
        fs::create_dir_all(project.path().join("pkg")).unwrap();
        fs::write(project.path().join("pkg/a.tar.gz"), "archive").unwrap();
        fs::write(project.path().join("debug.log"), "log").unwrap();
        let ignored = vec!["debug.log".to_string(), "pkg/a.tar.gz".to_string()];
        (project, trash, ignored)
    }

    #[test]
    fn test_clean_moves_files() {
        let (project, trash, ignored) = setup();
        let target = trash.path().join("gem");

        let moved = clean(project.path(), &ignored, &target, false).unwrap();
        assert_eq!(
            moved,
            [target.join("debug.log"), target.join("pkg/a.tar.gz")]
        );
        assert!(!project.path().join("debug.log").exists());
        assert!(!project.path().join("pkg/a.tar.gz").exists());
        assert_eq!(fs::read_to_string(target.join("pkg/a.tar.gz")).unwrap(), "archive");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (project, trash, ignored) = setup();
        let target = trash.path().join("gem");

        let moved = clean(project.path(), &ignored, &target, true).unwrap();
        assert_eq!(moved.len(), 2);
        assert!(project.path().join("debug.log").exists());
        assert!(!target.exists());
    }

    #[test]
    #[traced_test]
    fn test_nothing_to_clean() {
        let (project, trash, _) = setup();
        let moved = clean(project.path(), &[], trash.path(), false).unwrap();
        assert!(moved.is_empty());
        assert!(logs_contain("nothing to clean"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(
            expand_home(Path::new("/tmp/trash")).unwrap(),
            PathBuf::from("/tmp/trash")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/.Trash")).unwrap(), home.join(".Trash"));
        }
    }
}
