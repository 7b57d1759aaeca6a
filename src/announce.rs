//! Release announcements assembled from the README and the change log.

use std::sync::LazyLock;

use regex::Regex;

use crate::readme::{Readme, Section};

/// A README section the announcement cannot do without is missing.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("README.md has no {0} section")]
#[diagnostic(help("announcements need the HEADER, DESCRIPTION and INSTALLATION sections"))]
pub struct MissingSection(pub &'static str);

static FIRST_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w-]+").expect("static regex is valid"));

/// Push a Markdown heading `levels` levels deeper.
fn demote(text: &str, levels: usize) -> String {
    if text.starts_with('#') {
        format!("{}{text}", "#".repeat(levels))
    } else {
        text.to_string()
    }
}

/// The heading and the first line of a section.
fn lead(section: &Section) -> String {
    let heading = section.text().lines().next().unwrap_or_default().to_string();
    match section.first_line() {
        Some(line) => format!("{heading}\n\n{line}"),
        None => heading,
    }
}

fn require<'a>(readme: &'a Readme, key: &'static str) -> Result<&'a Section, MissingSection> {
    readme.section(key).ok_or(MissingSection(key))
}

/// Turn the first word of the header into a link to the homepage.
fn link_name(header: &str, homepage: Option<&str>, link: impl Fn(&str, &str) -> String) -> String {
    let Some(homepage) = homepage else {
        return header.to_string();
    };
    match FIRST_WORD.find(header) {
        Some(word) => format!(
            "{}{}{}",
            &header[..word.start()],
            link(word.as_str(), homepage),
            &header[word.end()..]
        ),
        None => header.to_string(),
    }
}

/// Markdown announcement, for release notes or a blog post.
pub fn announce_markdown(
    readme: &Readme,
    changes: &str,
    homepage: Option<&str>,
) -> Result<String, MissingSection> {
    let header = demote(&require(readme, "HEADER")?.text(), 1);
    let mut parts = vec![
        link_name(&header, homepage, |name, url| format!("[{name}]({url})")),
        demote(&lead(require(readme, "DESCRIPTION")?), 1),
    ];
    parts.push("### CHANGES:".to_string());
    if !changes.is_empty() {
        parts.push(demote(changes, 2));
    }
    parts.push(demote(&require(readme, "INSTALLATION")?.text(), 1));
    if let Some(synopsis) = readme.section("SYNOPSIS") {
        parts.push(demote(&lead(synopsis), 1));
    }
    Ok(parts.join("\n\n"))
}

/// Plain text announcement for a mailing list.
pub fn announce_email(
    readme: &Readme,
    changes: &str,
    homepage: Option<&str>,
) -> Result<String, MissingSection> {
    let header = demote(&require(readme, "HEADER")?.text(), 1);
    let mut parts = vec![
        link_name(&header, homepage, |name, url| format!("{name} <{url}>")),
        require(readme, "DESCRIPTION")?.text(),
        require(readme, "INSTALLATION")?.text(),
    ];
    if let Some(synopsis) = readme.section("SYNOPSIS") {
        parts.push(demote(&synopsis.text(), 1));
    }
    parts.push("## CHANGES:".to_string());
    if !changes.is_empty() {
        parts.push(demote(changes, 1));
    }
    Ok(parts.join("\n\n"))
}
