//! gemkit selects the files of a Ruby gem, writes its manifest, builds the
//! archive and drives the release.
//!
//! The tasks in this module are what the `gemkit` binary runs. Each one works
//! on a [`Project`], loaded once from the project directory.

pub mod announce;
pub mod archive;
pub mod changes;
pub mod clean;
pub mod config;
pub mod console_utils;
pub mod manifest;
pub mod opt;
pub mod readme;
pub mod system_tools;
pub mod version_check;

use std::path::{Path, PathBuf};

use gemkit_files::ProjectFiles;
use indicatif::MultiProgress;
use miette::IntoDiagnostic;

use crate::{
    config::ProjectConfig,
    manifest::PackageManifest,
    opt::{AnnounceFormat, App, BuildOpts, CleanOpts, FileList, SubCommands},
    readme::Readme,
    system_tools::{SystemTools, expand_placeholders},
    version_check::check_version,
};

/// A project directory with its configuration, README and files.
#[derive(Debug)]
pub struct Project {
    /// The canonical project directory
    pub dir: PathBuf,
    /// `gemkit.toml`
    pub config: ProjectConfig,
    /// The parsed README
    pub readme: Readme,
    /// The file lists
    pub files: ProjectFiles,
}

impl Project {
    /// Load `gemkit.toml` and `README.md` from `dir`.
    pub fn load(dir: &Path) -> miette::Result<Self> {
        let config = ProjectConfig::load(dir)?;
        let files = ProjectFiles::new(dir, config.files.selector_config()).into_diagnostic()?;
        let dir = files.root().to_path_buf();
        let readme = Readme::load(&dir).into_diagnostic()?;
        Ok(Self {
            dir,
            config,
            readme,
            files,
        })
    }

    /// `<name>-<version>`
    pub fn tag(&self) -> String {
        self.config.package.tag()
    }

    fn manifest(&self) -> miette::Result<PackageManifest> {
        Ok(PackageManifest::from_project(
            &self.config.package,
            &self.readme,
            &self.files,
        )?)
    }
}

/// The requested file list.
pub fn files(project: &Project, list: FileList) -> miette::Result<Vec<String>> {
    let files = &project.files;
    let list = match list {
        FileList::All => files.all_files(),
        FileList::Package => files.package_files(),
        FileList::Test => files.test_files(),
        FileList::Bin => files.executables(),
        FileList::Ignored => files.ignored_files(),
    }
    .into_diagnostic()?;
    Ok(list.to_vec())
}

/// Write `<name>.manifest.json` into the project directory.
pub fn write_manifest(project: &Project) -> miette::Result<PathBuf> {
    Ok(project.manifest()?.write(&project.dir)?)
}

/// Write the manifest and the archive, returning the archive path.
pub fn build(
    project: &Project,
    opts: &BuildOpts,
    multi_progress: &MultiProgress,
) -> miette::Result<PathBuf> {
    let manifest = project.manifest()?;
    manifest.write(&project.dir)?;
    let archive = archive::write_archive(
        &project.dir,
        &manifest,
        &project.dir.join(&opts.output_dir),
        multi_progress,
    )?;
    Ok(archive)
}

/// Run a configured command with `{archive}`, `{manifest}` and `{tag}` filled in.
fn run_configured(
    tools: &SystemTools,
    project: &Project,
    name: &'static str,
    argv: &[String],
    archive: &Path,
) -> miette::Result<()> {
    let archive = archive.display().to_string();
    let manifest = project
        .dir
        .join(format!("{}.manifest.json", project.config.package.name))
        .display()
        .to_string();
    let tag = project.tag();
    let argv = expand_placeholders(
        argv,
        &[
            ("archive", archive.as_str()),
            ("manifest", manifest.as_str()),
            ("tag", tag.as_str()),
        ],
    );
    tools.run_argv(name, &argv, &project.dir)?;
    Ok(())
}

/// Build the archive and install it with the configured install command.
pub fn install(
    project: &Project,
    opts: &BuildOpts,
    tools: &SystemTools,
    multi_progress: &MultiProgress,
) -> miette::Result<()> {
    let archive = build(project, opts, multi_progress)?;
    run_configured(
        tools,
        project,
        "install",
        &project.config.commands.install,
        &archive,
    )
}

/// Compare `VERSION` with the configured version.
pub fn check(project: &Project, expected: Option<&str>) -> miette::Result<()> {
    check_version(expected, &project.config.package.version)?;
    tracing::info!("version {} confirmed", project.config.package.version);
    Ok(())
}

/// Check the version, build, tag, push and publish.
pub fn release(
    project: &Project,
    expected: Option<&str>,
    opts: &BuildOpts,
    tools: &SystemTools,
    multi_progress: &MultiProgress,
) -> miette::Result<()> {
    check(project, expected)?;
    let archive = build(project, opts, multi_progress)?;

    let tag = project.tag();
    tools.git(&["tag", &tag], &project.dir)?;
    tools.git(&["push"], &project.dir)?;
    tools.git(&["push", "--tags"], &project.dir)?;
    run_configured(
        tools,
        project,
        "publish",
        &project.config.commands.publish,
        &archive,
    )?;

    tracing::info!("released {tag}");
    Ok(())
}

/// Run the configured test command with the test files appended.
pub fn run_tests(
    project: &Project,
    extra_args: &[String],
    tools: &SystemTools,
) -> miette::Result<()> {
    let test_files = project.files.test_files().into_diagnostic()?;
    if test_files.is_empty() {
        tracing::warn!("no test files found");
        return Ok(());
    }

    let mut argv = project.config.commands.test.clone();
    argv.extend(extra_args.iter().cloned());
    argv.extend(test_files.iter().cloned());
    tools.run_argv("test", &argv, &project.dir)?;
    Ok(())
}

/// The top-level Markdown files of the package, passed to the doc command.
fn doc_files(package_files: &[String]) -> Vec<&str> {
    package_files
        .iter()
        .map(String::as_str)
        .filter(|file| !file.contains('/') && file.ends_with(".md"))
        .collect()
}

/// Run the configured doc command.
pub fn doc(project: &Project, tools: &SystemTools) -> miette::Result<()> {
    let package_files = project.files.package_files().into_diagnostic()?;
    let doc_files = doc_files(package_files).join(",");
    let argv = expand_placeholders(
        &project.config.commands.doc,
        &[("doc_files", doc_files.as_str())],
    );
    tools.run_argv("doc", &argv, &project.dir)?;
    Ok(())
}

/// Render the release announcement.
pub fn announce(project: &Project, format: AnnounceFormat) -> miette::Result<String> {
    let changes = changes::load_latest_changes(&project.dir).into_diagnostic()?;
    let homepage = project.config.package.homepage();
    let text = match format {
        AnnounceFormat::Md => {
            announce::announce_markdown(&project.readme, &changes, homepage.as_deref())?
        }
        AnnounceFormat::Email => {
            announce::announce_email(&project.readme, &changes, homepage.as_deref())?
        }
    };
    Ok(text)
}

/// Move the ignored files to `<trash>/<name>/`.
pub fn clean(project: &Project, opts: &CleanOpts) -> miette::Result<Vec<PathBuf>> {
    let trash = match opts
        .trash_dir
        .as_ref()
        .or(project.config.clean.trash_dir.as_ref())
    {
        Some(dir) => clean::expand_home(dir)?,
        None => clean::default_trash_dir()?,
    };
    let target = trash.join(&project.config.package.name);

    let ignored = project.files.ignored_files().into_diagnostic()?;
    Ok(clean::clean(&project.dir, ignored, &target, opts.dry_run)?)
}

/// Run the command line application.
pub fn run(app: App, multi_progress: MultiProgress) -> miette::Result<()> {
    let project = Project::load(&app.project_dir)?;
    let tools = SystemTools::new();

    match app.subcommand {
        SubCommands::Files(opts) => {
            for file in files(&project, opts.list)? {
                println!("{file}");
            }
        }
        SubCommands::Manifest => {
            write_manifest(&project)?;
        }
        SubCommands::Build(opts) => {
            build(&project, &opts, &multi_progress)?;
        }
        SubCommands::Install(opts) => install(&project, &opts, &tools, &multi_progress)?,
        SubCommands::Check(opts) => check(&project, opts.expected_version.as_deref())?,
        SubCommands::Release(opts) => release(
            &project,
            opts.check.expected_version.as_deref(),
            &opts.build,
            &tools,
            &multi_progress,
        )?,
        SubCommands::Test(opts) => run_tests(&project, &opts.args, &tools)?,
        SubCommands::Announce(opts) => println!("{}", announce(&project, opts.format)?),
        SubCommands::Doc => doc(&project, &tools)?,
        SubCommands::Clean(opts) => {
            clean(&project, &opts)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use pretty_assertions::assert_eq;

    fn project(dir: &Path) -> Project {
        crate::manifest::tests::sample_project(dir);
        fs::write(
            dir.join("gemkit.toml"),
            "[package]\nname = \"rest-core\"\nversion = \"4.0.0\"\ngithub = \"godfat\"\n",
        )
        .unwrap();
        Project::load(dir).unwrap()
    }

    #[test]
    fn test_file_lists() {
        let dir = tempfile::tempdir().unwrap();
        let project = project(dir.path());
        assert_eq!(files(&project, FileList::Bin).unwrap(), ["rest-core"]);
        assert_eq!(files(&project, FileList::Ignored).unwrap(), ["debug.log"]);
        assert_eq!(
            files(&project, FileList::Test).unwrap(),
            ["test/test_client.rb"]
        );
        assert!(
            files(&project, FileList::Package)
                .unwrap()
                .contains(&"gemkit.toml".to_string())
        );
    }

    #[test]
    fn test_doc_files_are_top_level_markdown() {
        let files = ["CHANGES.md", "README.md", "doc/guide.md", "lib/a.rb", "notes.txt"]
            .map(String::from);
        assert_eq!(doc_files(&files), ["CHANGES.md", "README.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_doc_runs_configured_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = project(dir.path());
        project.config.commands.doc = ["sh", "-c", "echo \"$0\" > doc.out", "{doc_files}"]
            .map(String::from)
            .to_vec();

        doc(&project, &SystemTools::new()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("doc.out")).unwrap(),
            "README.md\n"
        );
    }

    #[test]
    fn test_build_writes_manifest_and_archive() {
        let dir = tempfile::tempdir().unwrap();
        let project = project(dir.path());
        let opts = BuildOpts {
            output_dir: PathBuf::from("pkg"),
        };

        let archive = build(&project, &opts, &MultiProgress::new()).unwrap();
        assert_eq!(archive, project.dir.join("pkg/rest-core-4.0.0.tar.gz"));
        assert!(archive.is_file());
        assert!(project.dir.join("rest-core.manifest.json").is_file());
    }

    #[test]
    fn test_check_uses_configured_version() {
        let dir = tempfile::tempdir().unwrap();
        let project = project(dir.path());
        assert!(check(&project, Some("4.0.0")).is_ok());

        let report = check(&project, Some("4.0.1")).unwrap_err();
        let err = report
            .downcast_ref::<version_check::VersionCheckError>()
            .unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_clean_into_configured_trash() {
        let dir = tempfile::tempdir().unwrap();
        let trash = tempfile::tempdir().unwrap();
        let project = project(dir.path());
        let opts = CleanOpts {
            dry_run: false,
            trash_dir: Some(trash.path().to_path_buf()),
        };

        let moved = clean(&project, &opts).unwrap();
        assert_eq!(moved, [trash.path().join("rest-core/debug.log")]);
        assert!(!dir.path().join("debug.log").exists());
    }
}
