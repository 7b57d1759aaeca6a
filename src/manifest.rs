//! The package manifest written next to the archive.

use std::path::{Path, PathBuf};

use fs_err as fs;
use gemkit_files::{FileSelectionError, ProjectFiles};
use serde::{Deserialize, Serialize};

use crate::{config::PackageConfig, readme::Readme};

/// Errors while synthesizing or writing the manifest.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ManifestError {
    /// The file lists could not be computed
    #[error(transparent)]
    Files(#[from] FileSelectionError),

    /// Writing the manifest failed
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The manifest could not be serialized
    #[error("failed to serialize the manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a packaging tool needs to know about the package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageManifest {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Authors
    pub authors: Vec<String>,
    /// Contact addresses
    pub email: Vec<String>,
    /// First line of the README description
    pub summary: Option<String>,
    /// The README description
    pub description: Option<String>,
    /// License from `gemkit.toml` or the README
    pub license: Option<String>,
    /// Project homepage
    pub homepage: Option<String>,
    /// Build date, `YYYY-MM-DD`
    pub date: String,
    /// Files in the package
    pub files: Vec<String>,
    /// Test files in the package
    pub test_files: Vec<String>,
    /// Basenames of the executables in the package
    pub executables: Vec<String>,
    /// Directories added to the load path
    pub require_paths: Vec<String>,
    /// Tool that wrote the manifest
    pub generator: String,
}

impl PackageManifest {
    /// Combine the package configuration, the README and the selected files.
    pub fn from_project(
        package: &PackageConfig,
        readme: &Readme,
        files: &ProjectFiles,
    ) -> Result<Self, ManifestError> {
        let license = package
            .license
            .clone()
            .or_else(|| readme.license().map(str::to_string));
        if license.is_none() {
            tracing::warn!("no license in gemkit.toml or in the README");
        }

        Ok(Self {
            name: package.name.clone(),
            version: package.version.clone(),
            authors: package.authors.clone(),
            email: package.email.clone(),
            summary: readme.summary().map(str::to_string),
            description: readme.description(),
            license,
            homepage: package.homepage(),
            date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            files: files.package_files()?.to_vec(),
            test_files: files.test_files()?.to_vec(),
            executables: files.executables()?.to_vec(),
            require_paths: package.require_paths.clone(),
            generator: format!("gemkit {}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Override the build date.
    pub fn with_date(mut self, date: chrono::NaiveDate) -> Self {
        self.date = date.format("%Y-%m-%d").to_string();
        self
    }

    /// `<name>-<version>`
    pub fn tag(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// File name of the serialized manifest.
    pub fn file_name(&self) -> String {
        format!("{}.manifest.json", self.name)
    }

    /// The manifest as pretty printed JSON.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `<name>.manifest.json` into `dir` and return its path.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = dir.join(self.file_name());
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(&path, json)?;
        tracing::info!("wrote {}", path.display());
        Ok(path)
    }
}
