//! The latest entry of `CHANGES.md`.

use std::{io, path::Path, sync::LazyLock};

use fs_err as fs;
use regex::Regex;

/// File name of the change log.
pub const CHANGES_FILE_NAME: &str = "CHANGES.md";

static DATED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S.*\d{4}-\d{2}-\d{2}\s*$").expect("static regex is valid"));

/// The first dated entry of a change log.
///
/// An entry starts at a line that ends with a `YYYY-MM-DD` date and runs up to
/// the next such line that follows a blank line.
pub fn latest_changes(text: &str) -> String {
    let lines = text.lines().collect::<Vec<_>>();
    let Some(start) = lines.iter().position(|line| DATED_LINE.is_match(line)) else {
        return String::new();
    };

    let end = (start + 1..lines.len())
        .find(|&idx| lines[idx - 1].trim().is_empty() && DATED_LINE.is_match(lines[idx]))
        .unwrap_or(lines.len());

    lines[start..end].join("\n").trim_end().to_string()
}

/// Read the latest entry from the project's `CHANGES.md`, empty when there is none.
pub fn load_latest_changes(project_dir: &Path) -> io::Result<String> {
    match fs::read_to_string(project_dir.join(CHANGES_FILE_NAME)) {
        Ok(text) => Ok(latest_changes(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}
