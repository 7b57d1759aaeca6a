//! Recursive discovery of the files below a project root

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;
use walkdir::WalkDir;

use crate::{FileSelectionError, Result};

/// Name of the version control metadata directory that is never listed.
pub const DEFAULT_VCS_DIR: &str = ".git";

/// Walks a project directory and lists every regular file relative to it.
///
/// Symlinked directories are followed and their files are listed below the
/// link's own location. Entries whose name is one of the excluded names
/// (`.git` by default) are skipped together with everything below them.
///
/// # Examples
/// ```rust,no_run
/// # use gemkit_files::FileDiscovery;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = FileDiscovery::new("/path/to/project").collect()?;
/// for file in &files {
///     println!("{file}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
    excluded_names: Vec<String>,
}

impl FileDiscovery {
    /// Create a new FileDiscovery for the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_names: vec![DEFAULT_VCS_DIR.to_string()],
        }
    }

    /// Replace the list of entry names that are skipped entirely
    pub fn excluded_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_names = names.into_iter().map(Into::into).collect();
        self
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        self.excluded_names.iter().any(|excluded| name == excluded.as_str())
    }

    /// Walk the tree and return the sorted, deduplicated relative paths.
    pub fn collect(self) -> Result<Vec<String>> {
        let metadata =
            fs::metadata(&self.root).map_err(|e| FileSelectionError::io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(FileSelectionError::NotADirectory(self.root));
        }

        let mut files = BTreeSet::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => match walk_error(err) {
                    Some(err) => return Err(err),
                    None => continue,
                },
            };
            // with `follow_links` this is the type of the link target
            if entry.file_type().is_file() {
                files.insert(relative_path(&self.root, entry.path())?);
            }
        }

        tracing::debug!(
            "discovered {} files below {}",
            files.len(),
            self.root.display()
        );

        Ok(files.into_iter().collect())
    }
}

/// List every regular file below `root` (see [`FileDiscovery`]).
pub fn discover(root: &Path) -> Result<Vec<String>> {
    FileDiscovery::new(root).collect()
}

/// `/`-separated path of `path` relative to `root`.
fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let components = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FileSelectionError::NonUtf8Path(path.to_path_buf()))?;
    Ok(components.join("/"))
}

/// Map a walk error, `None` for entries that are skipped.
fn walk_error(err: walkdir::Error) -> Option<FileSelectionError> {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    if let Some(ancestor) = err.loop_ancestor() {
        return Some(FileSelectionError::SymlinkCycle {
            link: path,
            target: ancestor.to_path_buf(),
        });
    }

    let is_symlink = fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink());
    let source = match err.into_io_error() {
        Some(source) => source,
        None => io::Error::other("directory walk failed"),
    };

    if is_symlink && source.kind() == io::ErrorKind::NotFound {
        tracing::warn!("skipping dangling symlink {}", path.display());
        return None;
    }
    if is_symlink && is_link_loop(&source) {
        // a link that resolves through itself, e.g. `loop -> loop`
        return Some(FileSelectionError::SymlinkCycle {
            target: path.clone(),
            link: path,
        });
    }

    Some(FileSelectionError::Io { path, source })
}

#[cfg(unix)]
fn is_link_loop(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_link_loop(_err: &io::Error) -> bool {
    false
}
