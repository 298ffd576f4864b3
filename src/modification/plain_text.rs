//! Plain-text editing.

use std::fmt;
use std::sync::Arc;

use super::{EntryMatcher, EntryModification};
use crate::error::DocumentFormat;
use crate::{Error, Result};

/// File suffix used by [`PlainTextModification::any_text`].
pub const TEXT_SUFFIX: &str = ".txt";

type TextEdit = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Replaces whole lines that start with a prefix.
///
/// A line matches when, with surrounding whitespace removed, it starts with
/// `prefix`. The whole line (indentation included) is replaced by
/// `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRule {
    /// Prefix tested against the trimmed line.
    pub prefix: String,
    /// The replacement line.
    pub replacement: String,
}

impl LineRule {
    /// Creates a rule.
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    fn matches(&self, line: &str) -> bool {
        line.trim().starts_with(self.prefix.as_str())
    }
}

/// Applies `rules` to each line of `text`; the first matching rule wins.
///
/// Every output line ends with `\n`. Empty lines at the end of the input are
/// dropped.
///
/// ```rust
/// use jarmod::{LineRule, apply_line_rules};
///
/// let rules = [LineRule::new("version=", "version=\"2.0\"")];
/// let out = apply_line_rules("  version=\"1.0\"\nother=1\n\n", &rules);
/// assert_eq!(out, "version=\"2.0\"\nother=1\n");
/// ```
pub fn apply_line_rules(text: &str, rules: &[LineRule]) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 {
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
    }

    let mut out = String::with_capacity(text.len() + 1);
    for line in lines {
        let line = rules
            .iter()
            .find(|rule| rule.matches(line))
            .map_or(line, |rule| rule.replacement.as_str());
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Edits UTF-8 text entries.
#[derive(Clone)]
pub struct PlainTextModification {
    matcher: EntryMatcher,
    edit: TextEdit,
    rules: Option<Arc<[LineRule]>>,
}

impl PlainTextModification {
    /// Creates a modification from a text edit.
    pub fn new<F>(matcher: impl Into<EntryMatcher>, edit: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            matcher: matcher.into(),
            edit: Arc::new(edit),
            rules: None,
        }
    }

    /// Creates a modification applying [`LineRule`]s.
    pub fn line_rules(matcher: impl Into<EntryMatcher>, rules: Vec<LineRule>) -> Self {
        let rules: Arc<[LineRule]> = rules.into();
        let captured = Arc::clone(&rules);
        Self {
            matcher: matcher.into(),
            edit: Arc::new(move |text: &str| apply_line_rules(text, &captured)),
            rules: Some(rules),
        }
    }

    /// Applies `edit` to every `.txt` entry.
    pub fn any_text<F>(edit: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::new(EntryMatcher::suffix(TEXT_SUFFIX), edit)
    }

    /// Returns the line rules, if this modification was built from them.
    pub fn rules(&self) -> Option<&[LineRule]> {
        self.rules.as_deref()
    }
}

impl fmt::Debug for PlainTextModification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainTextModification")
            .field("matcher", &self.matcher)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl EntryModification for PlainTextModification {
    fn applies_to(&self, entry_name: &str) -> bool {
        self.matcher.matches(entry_name)
    }

    fn transform_content(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let text = String::from_utf8(data)
            .map_err(|e| Error::malformed_document(DocumentFormat::PlainText, e.to_string()))?;
        Ok((self.edit)(&text).into_bytes())
    }
}
