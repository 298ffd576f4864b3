//! Renaming entries by pattern.

use regex::Regex;

use super::EntryModification;
use super::matcher::whole_name_regex;
use crate::{Error, Result};

/// Renames entries whose whole name matches a regular expression.
///
/// The new name is produced by replacing every match of the pattern in the
/// name with the replacement, which may use `$1` or `${name}` to refer to
/// capture groups. Content is never touched.
#[derive(Debug, Clone)]
pub struct RenameModification {
    pattern: Regex,
    anchored: Regex,
    replacement: String,
}

impl RenameModification {
    /// Creates a rename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`] if the pattern does not compile.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let anchored = whole_name_regex(pattern)?;
        let pattern = Regex::new(pattern).map_err(|e| Error::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            anchored,
            replacement: replacement.into(),
        })
    }

    /// Returns the pattern as written.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the replacement.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

impl EntryModification for RenameModification {
    fn applies_to(&self, entry_name: &str) -> bool {
        self.anchored.is_match(entry_name)
    }

    fn rename_entry(&self, entry_name: &str) -> Result<String> {
        if !self.applies_to(entry_name) {
            return Err(Error::NoSuchRenameTarget {
                entry_name: entry_name.to_string(),
                pattern: self.pattern.as_str().to_string(),
            });
        }
        let renamed = self
            .pattern
            .replace_all(entry_name, self.replacement.as_str())
            .into_owned();
        log::debug!("renaming {} to {}", entry_name, renamed);
        Ok(renamed)
    }

    fn rewrites_content(&self) -> bool {
        false
    }
}
