//! Gitignore-style ignore patterns.
//!
//! Only a subset of the gitignore format is understood:
//!
//! - blank lines and lines starting with `#` are skipped
//! - a leading `/` anchors the pattern to the project root
//! - a trailing `/` restricts the pattern to directories
//! - `*` matches any run of characters inside a single path segment
//! - every other character is matched literally
//!
//! Negation (`!pattern`) is a known limitation and is never silently
//! reinterpreted: depending on [`UnsupportedPatternPolicy`] such a line is
//! either skipped with a warning or rejected.

use std::path::Path;

use regex::RegexSet;

use crate::{FileSelectionError, Result};

/// One piece of a tokenized pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text that must appear verbatim
    Literal(String),
    /// `*`: zero or more characters other than `/`
    Wildcard,
}

/// What to do with a pattern the matcher cannot express.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedPatternPolicy {
    /// Skip the line and log a warning
    #[default]
    Warn,
    /// Fail compilation
    Error,
}

/// A single parsed line of an ignore file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePattern {
    source: String,
    line: usize,
    anchored: bool,
    directory_only: bool,
    tokens: Vec<Token>,
}

impl IgnorePattern {
    /// Parse a single (already trimmed, non-comment) pattern.
    pub fn parse(pattern: &str, line: usize) -> Result<Self> {
        let unsupported = |reason| FileSelectionError::UnsupportedPattern {
            pattern: pattern.to_string(),
            line,
            reason,
        };

        if pattern.starts_with('!') {
            return Err(unsupported("negation patterns are not supported"));
        }

        // `\#` and `\!` escape a leading comment or negation marker
        let body = if pattern.starts_with("\\#") || pattern.starts_with("\\!") {
            &pattern[1..]
        } else {
            pattern
        };

        let (anchored, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let trimmed = body.trim_end_matches('/');
        let directory_only = trimmed.len() != body.len();

        if trimmed.is_empty() {
            return Err(unsupported("pattern is empty once its slashes are removed"));
        }

        Ok(Self {
            source: pattern.to_string(),
            line,
            anchored,
            directory_only,
            tokens: tokenize(trimmed),
        })
    }

    /// The pattern as written in the ignore file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 1-based line number in the ignore file.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether the pattern only matches from the project root.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Whether the pattern only matches directories.
    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    /// The literal and wildcard pieces of the pattern.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Render the pattern as a regular expression over forward-slash relative paths.
    pub fn to_regex(&self) -> String {
        let mut re = String::from(if self.anchored { "^" } else { "(?:^|/)" });
        for token in &self.tokens {
            match token {
                Token::Literal(text) => re.push_str(&regex::escape(text)),
                Token::Wildcard => re.push_str("[^/]*"),
            }
        }
        re.push_str(if self.directory_only { "/" } else { "(?:/|$)" });
        re
    }
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();

    for c in pattern.chars() {
        if c == '*' {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            // `**` has no special meaning, it is the same as `*`
            if tokens.last() != Some(&Token::Wildcard) {
                tokens.push(Token::Wildcard);
            }
        } else {
            literal.push(c);
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }

    tokens
}

/// Split the contents of an ignore file into `(line number, pattern)` pairs,
/// dropping blank and comment lines.
pub fn parse_ignore_lines(text: &str) -> Vec<(usize, String)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(idx, line)| (idx, line.to_string()))
        .collect()
}

/// All ignore patterns of a project compiled into a single matcher.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    patterns: Vec<IgnorePattern>,
    set: RegexSet,
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

impl IgnoreMatcher {
    /// A matcher without any rules, it never matches.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        }
    }

    /// Compile numbered pattern lines (see [`parse_ignore_lines`]).
    pub fn compile<I>(lines: I, policy: UnsupportedPatternPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, String)>,
    {
        let mut patterns = Vec::new();
        for (line, raw) in lines {
            match IgnorePattern::parse(&raw, line) {
                Ok(pattern) => patterns.push(pattern),
                Err(FileSelectionError::UnsupportedPattern {
                    pattern,
                    line,
                    reason,
                }) if policy == UnsupportedPatternPolicy::Warn => {
                    tracing::warn!("skipping ignore pattern `{pattern}` on line {line}: {reason}");
                }
                Err(e) => return Err(e),
            }
        }

        let set = RegexSet::new(patterns.iter().map(IgnorePattern::to_regex))?;
        Ok(Self { patterns, set })
    }

    /// Compile the contents of an ignore file.
    pub fn from_text(text: &str, policy: UnsupportedPatternPolicy) -> Result<Self> {
        Self::compile(parse_ignore_lines(text), policy)
    }

    /// Read and compile an ignore file. A missing file yields an empty matcher.
    pub fn from_file(path: &Path, policy: UnsupportedPatternPolicy) -> Result<Self> {
        match fs_err::read_to_string(path) {
            Ok(text) => Self::from_text(&text, policy),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no ignore file at {}", path.display());
                Ok(Self::empty())
            }
            Err(e) => Err(FileSelectionError::io(path, e)),
        }
    }

    /// Whether any rule matches the forward-slash relative path.
    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    /// The rules that match `path`, in file order.
    pub fn matching_patterns(&self, path: &str) -> Vec<&IgnorePattern> {
        self.set
            .matches(path)
            .into_iter()
            .map(|idx| &self.patterns[idx])
            .collect()
    }

    /// The compiled rules.
    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no rule was compiled.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
