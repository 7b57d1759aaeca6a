//! Command-line options.

use std::path::PathBuf;

use clap::{Parser, ValueEnum, crate_version};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::console_utils::{Color, LogStyle};

/// Application subcommands.
#[derive(Parser, Debug)]
pub enum SubCommands {
    /// List the files of the project
    Files(FilesOpts),

    /// Write the package manifest
    Manifest,

    /// Write the manifest and build the package archive
    Build(BuildOpts),

    /// Build the package and install it with the configured install command
    Install(BuildOpts),

    /// Verify that `VERSION` matches the version in `gemkit.toml`
    Check(CheckOpts),

    /// Check the version, build, tag, push and publish the package
    Release(ReleaseOpts),

    /// Run the configured test command on the test files
    Test(TestOpts),

    /// Print a release announcement
    Announce(AnnounceOpts),

    /// Generate the API documentation with the configured doc command
    Doc,

    /// Move files matched by the ignore file into the trash
    Clean(CleanOpts),
}

#[allow(missing_docs)]
#[derive(Parser, Debug)]
#[clap(version = crate_version!())]
pub struct App {
    /// Subcommand.
    #[clap(subcommand)]
    pub subcommand: SubCommands,

    /// The project directory, containing `gemkit.toml`.
    #[arg(
        short = 'C',
        long,
        env = "GEMKIT_PROJECT_DIR",
        default_value = ".",
        global = true
    )]
    pub project_dir: PathBuf,

    /// Enable verbose logging.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Logging style
    #[clap(long, env = "GEMKIT_LOG_STYLE", default_value = "fancy", global = true)]
    pub log_style: LogStyle,

    /// Enable or disable colored output.
    #[clap(long, env = "GEMKIT_COLOR", default_value = "auto", global = true)]
    pub color: Color,
}

/// Which list `gemkit files` prints.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileList {
    /// Every file below the project root
    All,
    /// The files that go into the package
    #[default]
    Package,
    /// The package files that are tests
    Test,
    /// The executables in the package
    Bin,
    /// Files matched by the ignore file and not tracked by git
    Ignored,
}

/// Options for the `files` command
#[derive(Parser, Debug, Clone)]
pub struct FilesOpts {
    /// The list to print
    #[arg(value_enum, default_value = "package")]
    pub list: FileList,
}

/// Options for the `build` and `install` commands
#[derive(Parser, Debug, Clone)]
pub struct BuildOpts {
    /// Directory the archive is written to, relative to the project directory.
    #[arg(short, long, default_value = "pkg")]
    pub output_dir: PathBuf,
}

/// Options for the `check` command
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// The version the caller expects to release.
    #[arg(long, env = "VERSION")]
    pub expected_version: Option<String>,
}

/// Options for the `release` command
#[derive(Parser, Debug, Clone)]
pub struct ReleaseOpts {
    #[allow(missing_docs)]
    #[command(flatten)]
    pub check: CheckOpts,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub build: BuildOpts,
}

/// Options for the `test` command
#[derive(Parser, Debug, Clone)]
pub struct TestOpts {
    /// Extra arguments passed to the test command before the test files
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Announcement flavor
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnnounceFormat {
    /// Markdown, for a blog post or release notes
    #[default]
    Md,
    /// Plain text for a mailing list
    Email,
}

/// Options for the `announce` command
#[derive(Parser, Debug, Clone)]
pub struct AnnounceOpts {
    /// Output format
    #[arg(value_enum, default_value = "md")]
    pub format: AnnounceFormat,
}

/// Options for the `clean` command
#[derive(Parser, Debug, Clone)]
pub struct CleanOpts {
    /// Only log what would be moved
    #[arg(long)]
    pub dry_run: bool,

    /// Trash directory, overrides `gemkit.toml` and the default `~/.Trash`.
    #[arg(long)]
    pub trash_dir: Option<PathBuf>,
}
