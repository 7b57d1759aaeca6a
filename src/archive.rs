//! The distributable `.tar.gz` archive.

use std::{
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use flate2::{Compression, write::GzEncoder};
use fs_err as fs;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle, style::TemplateError};

use crate::manifest::{ManifestError, PackageManifest};

/// Errors while writing the archive.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ArchiveError {
    /// Reading a package file or writing the archive failed
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The manifest could not be serialized
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The manifest date is not `YYYY-MM-DD`
    #[error("invalid manifest date `{0}`")]
    InvalidDate(String),
}

fn progress_style() -> Result<ProgressStyle, TemplateError> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:20!} [{elapsed_precise}] [{bar:40!.bright.yellow/dim.white}] {pos:>5}/{len:5} {wide_msg}")?
        .progress_chars("━━╾─"))
}

/// Seconds since the epoch of the manifest date at midnight UTC.
fn archive_mtime(manifest: &PackageManifest) -> Result<u64, ArchiveError> {
    let date = chrono::NaiveDate::parse_from_str(&manifest.date, "%Y-%m-%d")
        .map_err(|_| ArchiveError::InvalidDate(manifest.date.clone()))?;
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp())
        .ok_or_else(|| ArchiveError::InvalidDate(manifest.date.clone()))?;
    u64::try_from(timestamp).map_err(|_| ArchiveError::InvalidDate(manifest.date.clone()))
}

fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o777
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        0o644
    }
}

fn header(size: u64, mode: u32, mtime: u64) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(size);
    header.set_mode(mode);
    header.set_mtime(mtime);
    header.set_uid(0);
    header.set_gid(0);
    header
}

/// Write `<out_dir>/<name>-<version>.tar.gz` and return its path.
///
/// Every entry lives below `<name>-<version>/`: the manifest first, then the
/// package files in manifest order. All entries carry the manifest date as
/// their modification time, so building the same tree twice gives the same
/// bytes.
pub fn write_archive(
    root: &Path,
    manifest: &PackageManifest,
    out_dir: &Path,
    multi_progress: &MultiProgress,
) -> Result<PathBuf, ArchiveError> {
    let tag = manifest.tag();
    let mtime = archive_mtime(manifest)?;

    fs::create_dir_all(out_dir)?;
    let archive_path = out_dir.join(format!("{tag}.tar.gz"));

    let progress_bar = multi_progress.add(
        ProgressBar::new(manifest.files.len() as u64 + 1).with_prefix("Packaging"),
    );
    if let Ok(style) = progress_style() {
        progress_bar.set_style(style);
    }

    let file = fs::File::create(&archive_path)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    let manifest_json = manifest.to_json()?;
    builder.append_data(
        &mut header(manifest_json.len() as u64, 0o644, mtime),
        format!("{tag}/{}", manifest.file_name()),
        manifest_json.as_bytes(),
    )?;
    progress_bar.inc(1);

    for relative in &manifest.files {
        progress_bar.set_message(relative.clone());
        let path = root.join(relative);
        let metadata = fs::metadata(&path)?;
        let reader = fs::File::open(&path)?;
        builder.append_data(
            &mut header(metadata.len(), file_mode(&metadata), mtime),
            format!("{tag}/{relative}"),
            reader,
        )?;
        progress_bar.inc(1);
    }

    let mut encoder = builder.into_inner()?;
    encoder.flush()?;
    encoder.finish()?;
    progress_bar.finish_and_clear();

    tracing::info!(
        "packaged {} files into {}",
        manifest.files.len(),
        archive_path.display()
    );
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::tests::sample_project;
    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn entries(archive: &Path) -> Vec<(String, u64, String)> {
        let file = fs::File::open(archive).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().to_string_lossy().into_owned();
                let mtime = entry.header().mtime().unwrap();
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                (path, mtime, content)
            })
            .collect()
    }

    #[test]
    fn test_archive_layout() {
        let dir = tempfile::tempdir().unwrap();
        let (_, manifest) = sample_project(dir.path());
        let out = tempfile::tempdir().unwrap();

        let path = write_archive(dir.path(), &manifest, out.path(), &MultiProgress::new()).unwrap();
        assert_eq!(path, out.path().join("rest-core-4.0.0.tar.gz"));

        let entries = entries(&path);
        let names = entries.iter().map(|(n, _, _)| n.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "rest-core-4.0.0/rest-core.manifest.json",
                "rest-core-4.0.0/.gitignore",
                "rest-core-4.0.0/README.md",
                "rest-core-4.0.0/bin/rest-core",
                "rest-core-4.0.0/lib/rest-core.rb",
                "rest-core-4.0.0/test/test_client.rb",
            ]
        );

        // 2016-01-31T00:00:00Z
        assert!(entries.iter().all(|(_, mtime, _)| *mtime == 1_454_198_400));
        assert_eq!(entries[4].2, "module RestCore; end\n");

        let embedded: PackageManifest = serde_json::from_str(&entries[0].2).unwrap();
        assert_eq!(embedded, manifest);
    }

    #[test]
    fn test_archive_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let (_, manifest) = sample_project(dir.path());
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        let a = write_archive(dir.path(), &manifest, first.path(), &MultiProgress::new()).unwrap();
        let b = write_archive(dir.path(), &manifest, second.path(), &MultiProgress::new()).unwrap();
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn test_invalid_date() {
        let dir = tempfile::tempdir().unwrap();
        let (_, mut manifest) = sample_project(dir.path());
        manifest.date = "yesterday".to_string();
        let err = write_archive(dir.path(), &manifest, dir.path(), &MultiProgress::new())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidDate(_)));
    }
}
