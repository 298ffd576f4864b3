//! Entry-name matchers deciding which entries a modification applies to.

use std::fmt;
use std::sync::Arc;

use crate::{Error, Result};

/// Decides whether a modification applies to an entry, from its name alone.
///
/// # Example
///
/// ```rust
/// use jarmod::EntryMatcher;
///
/// let json = EntryMatcher::suffix(".json");
/// assert!(json.matches("fabric.mod.json"));
///
/// let manifest = EntryMatcher::exact("META-INF/mods.toml");
/// assert!(!manifest.matches("META-INF/neoforge.mods.toml"));
///
/// let mixins = EntryMatcher::regex(r"[a-z]+\.mixins\.json").unwrap();
/// assert!(mixins.matches("fabric.mixins.json"));
/// assert!(!mixins.matches("data/fabric.mixins.json"));
/// ```
#[derive(Clone)]
pub enum EntryMatcher {
    /// Matches every entry.
    Any,
    /// Matches one exact entry name.
    Exact(String),
    /// Matches names ending with the suffix.
    Suffix(String),
    /// Matches names the whole of which match the expression.
    Regex(regex::Regex),
    /// Matches names accepted by the predicate.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl EntryMatcher {
    /// Creates an exact-name matcher.
    pub fn exact(name: impl Into<String>) -> Self {
        EntryMatcher::Exact(name.into())
    }

    /// Creates a suffix matcher.
    pub fn suffix(suffix: impl Into<String>) -> Self {
        EntryMatcher::Suffix(suffix.into())
    }

    /// Creates a matcher from a regular expression that must match the
    /// entire entry name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`] if the pattern does not compile.
    pub fn regex(pattern: &str) -> Result<Self> {
        whole_name_regex(pattern).map(EntryMatcher::Regex)
    }

    /// Creates a matcher from a predicate over the entry name.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        EntryMatcher::Predicate(Arc::new(predicate))
    }

    /// Returns `true` if the entry named `name` is matched.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            EntryMatcher::Any => true,
            EntryMatcher::Exact(exact) => name == exact,
            EntryMatcher::Suffix(suffix) => name.ends_with(suffix.as_str()),
            EntryMatcher::Regex(regex) => regex.is_match(name),
            EntryMatcher::Predicate(predicate) => predicate(name),
        }
    }
}

impl fmt::Debug for EntryMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryMatcher::Any => f.write_str("Any"),
            EntryMatcher::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            EntryMatcher::Suffix(suffix) => f.debug_tuple("Suffix").field(suffix).finish(),
            EntryMatcher::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            EntryMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for EntryMatcher {
    /// Treats a plain string as an exact entry name.
    fn from(name: &str) -> Self {
        EntryMatcher::exact(name)
    }
}

impl From<String> for EntryMatcher {
    fn from(name: String) -> Self {
        EntryMatcher::Exact(name)
    }
}

/// Compiles `pattern` anchored at both ends.
pub(crate) fn whole_name_regex(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| Error::InvalidRegex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
