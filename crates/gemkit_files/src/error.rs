//! Error types for the gemkit_files crate

use std::path::PathBuf;

/// Result type alias using FileSelectionError
pub type Result<T> = std::result::Result<T, FileSelectionError>;

/// Errors that can occur while selecting the files of a package
#[derive(Debug, thiserror::Error)]
pub enum FileSelectionError {
    /// IO error on a specific path
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// The path that could not be accessed
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A symlink points back into one of its own ancestors
    #[error("symlink cycle detected: {} resolves to {}, which is already being walked", link.display(), target.display())]
    SymlinkCycle {
        /// The symlink that closes the cycle
        link: PathBuf,
        /// The canonical directory it resolves to
        target: PathBuf,
    },

    /// Ignore pattern that cannot be expressed by the matcher
    #[error("unsupported ignore pattern `{pattern}` on line {line}: {reason}")]
    UnsupportedPattern {
        /// The raw pattern text
        pattern: String,
        /// 1-based line in the ignore file
        line: usize,
        /// Why the pattern is rejected
        reason: &'static str,
    },

    /// The compiled ignore rules could not be turned into a matcher
    #[error("failed to compile ignore patterns: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Git exited with a non-zero status
    #[error("`{command}` failed: {stderr}")]
    Git {
        /// The command line that failed
        command: String,
        /// Captured standard error
        stderr: String,
    },

    /// Git could not be started
    #[error("failed to run git: {0}")]
    GitSpawn(#[source] std::io::Error),

    /// The project root is not a directory
    #[error("project root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A path below the project root is not valid UTF-8
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

impl FileSelectionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
