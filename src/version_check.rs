//! Guard against releasing a version the caller did not ask for.

/// Why the version check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum VersionCheckError {
    /// No expected version was given
    #[error("expected VERSION={actual}")]
    #[diagnostic(help("rerun with `VERSION={actual}` to confirm the release"))]
    Missing {
        /// Version from gemkit.toml
        actual: String,
    },

    /// The expected version differs from the configured one
    #[error("expected VERSION={actual} but got VERSION={expected}")]
    Mismatch {
        /// Version passed by the caller
        expected: String,
        /// Version from gemkit.toml
        actual: String,
    },
}

impl VersionCheckError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            VersionCheckError::Missing { .. } => 1,
            VersionCheckError::Mismatch { .. } => 2,
        }
    }
}

/// Compare the expected version with the configured one.
pub fn check_version(expected: Option<&str>, actual: &str) -> Result<(), VersionCheckError> {
    match expected {
        None => Err(VersionCheckError::Missing {
            actual: actual.to_string(),
        }),
        Some(expected) if expected != actual => Err(VersionCheckError::Mismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        Some(_) => Ok(()),
    }
}
