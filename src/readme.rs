//! Sections of the project README.
//!
//! The README is cut into sections at its headings. A section runs until the
//! next heading of the same or a shallower level that follows a blank line,
//! so deeper headings stay inside their parent. The document title ends at
//! the first `##` heading.

use std::{io, path::Path};

use fs_err as fs;

/// File name of the README.
pub const README_FILE_NAME: &str = "README.md";

/// One heading and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    level: usize,
    lines: Vec<String>,
}

impl Section {
    /// Number of `#` of the heading.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The heading line without the leading `#`s.
    pub fn heading(&self) -> &str {
        self.lines[0][self.level..].trim()
    }

    /// First word of the heading, used to look the section up.
    pub fn key(&self) -> Option<&str> {
        self.heading()
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .find(|word| !word.is_empty())
    }

    /// The section including its heading line.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// The lines below the heading, without the blank lines that follow it.
    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.lines[1..]
            .iter()
            .map(String::as_str)
            .skip_while(|line| line.trim().is_empty())
    }

    /// The text below the heading.
    pub fn body(&self) -> String {
        self.body_lines().collect::<Vec<_>>().join("\n")
    }

    /// The first non-blank line below the heading.
    pub fn first_line(&self) -> Option<&str> {
        self.body_lines().map(str::trim).find(|line| !line.is_empty())
    }
}

fn heading_level(line: &str) -> Option<usize> {
    let level = line.chars().take_while(|c| *c == '#').count();
    (level > 0 && !line[level..].trim().is_empty()).then_some(level)
}

/// A parsed README.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readme {
    sections: Vec<Section>,
}

impl Readme {
    /// Cut a Markdown document into sections.
    pub fn parse(text: &str) -> Self {
        let lines = text.lines().collect::<Vec<_>>();
        let mut sections: Vec<Section> = Vec::new();
        // deepest heading level that closes the current section
        let mut closing_level = 0;

        for (idx, line) in lines.iter().enumerate() {
            let after_blank = idx == 0 || lines[idx - 1].trim().is_empty();
            match heading_level(line) {
                Some(level)
                    if sections.is_empty() || (after_blank && level <= closing_level) =>
                {
                    closing_level = if sections.is_empty() { level + 1 } else { level };
                    sections.push(Section {
                        level,
                        lines: vec![line.to_string()],
                    });
                }
                _ => {
                    if let Some(section) = sections.last_mut() {
                        section.lines.push(line.to_string());
                    }
                }
            }
        }

        for section in &mut sections {
            while section
                .lines
                .last()
                .is_some_and(|line| line.trim().is_empty())
            {
                section.lines.pop();
            }
        }

        Self { sections }
    }

    /// Read `README.md` from the project directory. A missing file gives an empty README.
    pub fn load(project_dir: &Path) -> io::Result<Self> {
        let path = project_dir.join(README_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no {} in {}", README_FILE_NAME, project_dir.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// All sections in document order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section, normally the title and byline.
    pub fn header(&self) -> Option<&Section> {
        self.sections.first()
    }

    /// Look up a section by the first word of its heading. `HEADER` is the first section.
    pub fn section(&self, key: &str) -> Option<&Section> {
        if key == "HEADER" {
            return self.header();
        }
        self.sections
            .iter()
            .rev()
            .find(|section| section.key() == Some(key))
    }

    /// The body of the `DESCRIPTION` section.
    pub fn description(&self) -> Option<String> {
        self.section("DESCRIPTION").map(Section::body)
    }

    /// The first line of the description.
    pub fn summary(&self) -> Option<&str> {
        self.section("DESCRIPTION").and_then(Section::first_line)
    }

    /// The first line of the `LICENSE` section.
    pub fn license(&self) -> Option<&str> {
        self.section("LICENSE").and_then(Section::first_line)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub(crate) const README: &str = "\
# rest-core [![Build Status](https://ci.example.com/badge.png)](https://ci.example.com)

by Lin Jen-Shin ([godfat](https://godfat.org))

## LINKS:

* [github](https://github.com/godfat/rest-core)

## DESCRIPTION:

Modular Ruby clients interface for REST APIs.

Build your own API clients for less dependencies.

### Details

More text.

## INSTALLATION:

    gem install rest-core

## SYNOPSIS:

Use it like this.

More synopsis.

## LICENSE:

Apache License 2.0 (Apache-2.0)

Copyright (c) 2011-2016, Lin Jen-Shin (godfat)
";

    #[test]
    fn test_sections() {
        let readme = Readme::parse(README);
        let keys = readme
            .sections()
            .iter()
            .map(|s| s.key().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            ["rest", "LINKS", "DESCRIPTION", "INSTALLATION", "SYNOPSIS", "LICENSE"]
        );

        let header = readme.section("HEADER").unwrap();
        assert_eq!(header.level(), 1);
        assert_eq!(
            header.text(),
            "# rest-core [![Build Status](https://ci.example.com/badge.png)](https://ci.example.com)\n\nby Lin Jen-Shin ([godfat](https://godfat.org))"
        );
    }

    #[test]
    fn test_deeper_headings_stay_inside() {
        let readme = Readme::parse(README);
        assert_eq!(
            readme.description().unwrap(),
            "Modular Ruby clients interface for REST APIs.\n\nBuild your own API clients for less dependencies.\n\n### Details\n\nMore text."
        );
        assert_eq!(
            readme.summary(),
            Some("Modular Ruby clients interface for REST APIs.")
        );
    }

    #[test]
    fn test_license() {
        let readme = Readme::parse(README);
        assert_eq!(readme.license(), Some("Apache License 2.0 (Apache-2.0)"));
    }

    #[test]
    fn test_heading_needs_blank_line_before() {
        let readme = Readme::parse("# a\n\n## B\ntext\n## C\n\n## D\n\nend\n");
        let keys = readme
            .sections()
            .iter()
            .filter_map(Section::key)
            .collect::<Vec<_>>();
        assert_eq!(keys, ["a", "B", "D"]);
        assert_eq!(readme.section("B").unwrap().body(), "text\n## C");
    }

    #[test]
    fn test_text_before_first_heading_is_dropped() {
        let readme = Readme::parse("intro\n\n## ONLY:\n\nbody\n");
        assert_eq!(readme.header().unwrap().heading(), "ONLY:");
        assert_eq!(readme.section("ONLY").unwrap().body(), "body");
    }

    #[test]
    fn test_missing_readme() {
        let dir = tempfile::tempdir().unwrap();
        let readme = Readme::load(dir.path()).unwrap();
        assert!(readme.header().is_none());
        assert!(readme.description().is_none());
        assert!(readme.license().is_none());
    }
}
