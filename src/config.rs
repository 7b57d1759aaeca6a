//! The `gemkit.toml` project configuration.
//!
//! ```toml
//! [package]
//! name = "rest-core"
//! version = "4.0.0"
//! authors = ["Lin Jen-Shin (godfat)"]
//! email = ["godfat (XD) godfat.org"]
//! github = "godfat"
//!
//! [files]
//! executable_scope = "direct-children"
//!
//! [commands]
//! test = ["ruby", "-Ilib", "-S", "bacon", "--quiet"]
//! ```

use std::path::{Path, PathBuf};

use fs_err as fs;
use gemkit_files::{
    ExecutableScope, SelectorConfig, SubmodulePolicy, TestFileConvention,
    UnsupportedPatternPolicy,
};
use serde::Deserialize;

/// File name of the project configuration.
pub const CONFIG_FILE_NAME: &str = "gemkit.toml";

/// Errors while loading the project configuration.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// No configuration file in the project directory
    #[error("no gemkit.toml found in {}", .0.display())]
    #[diagnostic(help(
        "create a gemkit.toml with at least a [package] table holding `name` and `version`"
    ))]
    NotFound(PathBuf),

    /// The file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or misses required keys
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The configuration file
        path: PathBuf,
        /// The parse error
        #[source]
        source: toml::de::Error,
    },

    /// A required value is empty
    #[error("`package.{0}` must not be empty")]
    Empty(&'static str),
}

/// The whole `gemkit.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Package metadata
    pub package: PackageConfig,
    /// File selection
    #[serde(default)]
    pub files: FilesConfig,
    /// External commands
    #[serde(default)]
    pub commands: CommandsConfig,
    /// The `clean` command
    #[serde(default)]
    pub clean: CleanConfig,
}

/// The `[package]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Authors
    #[serde(default)]
    pub authors: Vec<String>,
    /// Contact addresses
    #[serde(default)]
    pub email: Vec<String>,
    /// Project homepage
    pub homepage: Option<String>,
    /// GitHub user or organisation, used to derive the homepage
    pub github: Option<String>,
    /// License, read from the README when absent
    pub license: Option<String>,
    /// Directories added to the load path
    #[serde(default = "default_require_paths")]
    pub require_paths: Vec<String>,
}

fn default_require_paths() -> Vec<String> {
    vec!["lib".to_string()]
}

impl PackageConfig {
    /// `<name>-<version>`, used for the archive name and the git tag.
    pub fn tag(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// The configured homepage, or the GitHub repository when `github` is set.
    pub fn homepage(&self) -> Option<String> {
        self.homepage.clone().or_else(|| {
            self.github
                .as_ref()
                .map(|user| format!("https://github.com/{user}/{}", self.name))
        })
    }
}

/// Policy names accepted in `files.submodule_policy`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SubmodulePolicyName {
    #[allow(missing_docs)]
    #[default]
    Unconditional,
    #[allow(missing_docs)]
    TrackedOverride,
}

/// Policy names accepted in `files.unsupported_patterns`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PatternPolicyName {
    #[allow(missing_docs)]
    #[default]
    Warn,
    #[allow(missing_docs)]
    Error,
}

/// Scope names accepted in `files.executable_scope`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutableScopeName {
    #[allow(missing_docs)]
    #[default]
    DirectChildren,
    #[allow(missing_docs)]
    Recursive,
}

/// The `[files]` table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Ignore file relative to the project directory
    pub ignore_file: String,
    /// Leave out files inside git submodules
    pub exclude_submodules: bool,
    /// Whether tracked files inside submodules are rescued
    pub submodule_policy: SubmodulePolicyName,
    /// What to do with ignore patterns that cannot be honored
    pub unsupported_patterns: PatternPolicyName,
    /// Directory holding the tests
    pub test_root: String,
    /// Basename prefix of test files
    pub test_prefix: String,
    /// Extensions of test files
    pub test_extensions: Vec<String>,
    /// Directory holding the executables
    pub bin_root: String,
    /// Which files below `bin_root` are executables
    pub executable_scope: ExecutableScopeName,
}

impl Default for FilesConfig {
    fn default() -> Self {
        let selector = SelectorConfig::default();
        Self {
            ignore_file: selector.ignore_file,
            exclude_submodules: selector.exclude_submodules,
            submodule_policy: SubmodulePolicyName::default(),
            unsupported_patterns: PatternPolicyName::default(),
            test_root: selector.test_convention.root,
            test_prefix: selector.test_convention.prefix,
            test_extensions: selector.test_convention.extensions,
            bin_root: selector.bin_root,
            executable_scope: ExecutableScopeName::default(),
        }
    }
}

impl FilesConfig {
    /// Translate into the configuration of the file selector.
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            ignore_file: self.ignore_file.clone(),
            pattern_policy: match self.unsupported_patterns {
                PatternPolicyName::Warn => UnsupportedPatternPolicy::Warn,
                PatternPolicyName::Error => UnsupportedPatternPolicy::Error,
            },
            submodule_policy: match self.submodule_policy {
                SubmodulePolicyName::Unconditional => SubmodulePolicy::Unconditional,
                SubmodulePolicyName::TrackedOverride => SubmodulePolicy::TrackedOverride,
            },
            exclude_submodules: self.exclude_submodules,
            test_convention: TestFileConvention {
                root: self.test_root.clone(),
                prefix: self.test_prefix.clone(),
                extensions: self.test_extensions.clone(),
            },
            bin_root: self.bin_root.clone(),
            executable_scope: match self.executable_scope {
                ExecutableScopeName::DirectChildren => ExecutableScope::DirectChildren,
                ExecutableScopeName::Recursive => ExecutableScope::Recursive,
            },
            ..SelectorConfig::default()
        }
    }
}

/// The `[commands]` table. Every command is an argv vector.
///
/// `{archive}`, `{manifest}` and `{tag}` are replaced before running. `doc`
/// gets `{doc_files}` instead, the top-level Markdown files of the package.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CommandsConfig {
    /// Runs the tests, the test files are appended
    pub test: Vec<String>,
    /// Installs the built archive
    pub install: Vec<String>,
    /// Publishes the built archive
    pub publish: Vec<String>,
    /// Generates the API documentation
    pub doc: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        let argv = |args: &[&str]| args.iter().map(|a| a.to_string()).collect();
        Self {
            test: argv(&["ruby", "-Ilib", "-S", "bacon", "--quiet"]),
            install: argv(&["gem", "install", "--local", "{archive}"]),
            publish: argv(&["gem", "push", "{archive}"]),
            doc: argv(&[
                "yardoc",
                "-o",
                "rdoc",
                "--main",
                "README.md",
                "--files",
                "{doc_files}",
            ]),
        }
    }
}

/// The `[clean]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CleanConfig {
    /// Where ignored files are moved, defaults to `~/.Trash`
    pub trash_dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Parse the contents of a `gemkit.toml`.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.package.name.trim().is_empty() {
            return Err(ConfigError::Empty("name"));
        }
        if config.package.version.trim().is_empty() {
            return Err(ConfigError::Empty("version"));
        }
        Ok(config)
    }

    /// Load `gemkit.toml` from the project directory.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Err(ConfigError::NotFound(project_dir.to_path_buf()));
        }
        let text = fs::read_to_string(&path)?;
        tracing::debug!("loaded {}", path.display());
        Self::from_toml(&text, &path)
    }
}
