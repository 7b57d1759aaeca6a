//! # gemkit_files
//!
//! Decides which files of a project end up in its package.
//!
//! The selection happens in a few steps:
//!
//! - Discovery: every regular file below the project root, following
//!   symlinked directories and skipping `.git`
//! - Ignore rules: the patterns of the project's `.gitignore`
//! - Tracked files: anything git tracks is kept even if an ignore rule matches
//! - Submodules: files inside git submodules are left out
//!
//! From the package files two further views are derived: the test files and
//! the executables.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gemkit_files::{ProjectFiles, SelectorConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = ProjectFiles::new("/path/to/gem", SelectorConfig::default())?;
//!
//! println!("files: {:?}", project.package_files()?);
//! println!("tests: {:?}", project.test_files()?);
//! println!("executables: {:?}", project.executables()?);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod discover;
pub mod error;
pub mod pattern;
pub mod project;
pub mod select;
pub mod vcs;
pub mod views;

pub use discover::{FileDiscovery, discover};
pub use error::{FileSelectionError, Result};
pub use pattern::{IgnoreMatcher, IgnorePattern, UnsupportedPatternPolicy};
pub use project::{ProjectFiles, SelectorConfig};
pub use select::{SelectionRules, SubmodulePolicy, ignored, select};
pub use vcs::{Submodules, TrackedFiles, submodule_paths};
pub use views::{ExecutableScope, TestFileConvention, executables, test_files};
