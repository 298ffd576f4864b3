//! Entry modifications.
//!
//! A modification decides from an entry's name whether it applies, may give
//! the entry a new name, and may transform the entry's content. The rewrite
//! engine folds every applicable modification over an entry in declaration
//! order.
//!
//! Four kinds are provided, collected in the [`Modification`] enum:
//!
//! | Kind | Applies to (default) | Renames | Transforms content |
//! |------|----------------------|---------|--------------------|
//! | [`AnnotationValueModification`] | `*.class` | no | patches one annotation element |
//! | [`RenameModification`] | names matching its pattern | yes | no |
//! | [`StructuredTextModification`] | `*.json` / `*.toml` | no | edits the parsed tree |
//! | [`PlainTextModification`] | `*.txt` | no | edits the text |
//!
//! # Example
//!
//! ```rust
//! use jarmod::{ArchiveEntry, EntryModification, Modification};
//!
//! # fn main() -> jarmod::Result<()> {
//! let rename = Modification::rename(r"fabric\.mixins\.json", "mymod.mixins.json")?;
//! let entry = ArchiveEntry::new("fabric.mixins.json", b"{}".to_vec());
//!
//! assert!(rename.applies_to(&entry.name));
//! let entry = rename.apply(entry)?;
//! assert_eq!(entry.name, "mymod.mixins.json");
//! # Ok(())
//! # }
//! ```

mod annotation;
mod matcher;
mod plain_text;
mod rename;
mod structured;

pub use annotation::AnnotationValueModification;
pub use matcher::EntryMatcher;
pub use plain_text::{LineRule, PlainTextModification, apply_line_rules};
pub use rename::RenameModification;
pub use structured::{
    Indent, JsonEdit, JsonFormat, KeyOrder, StructuredEdit, StructuredTextModification, TomlEdit,
    TomlFormat,
};

use crate::classfile::AnnotationValue;
use crate::{ArchiveEntry, Result};

/// The capabilities every modification provides.
///
/// `applies_to` must depend on the entry name only, never on content, so the
/// rewrite engine can decide before reading an entry.
pub trait EntryModification {
    /// Returns `true` if this modification applies to the named entry.
    fn applies_to(&self, entry_name: &str) -> bool;

    /// Returns the new name for an entry. The default keeps the name.
    fn rename_entry(&self, entry_name: &str) -> Result<String> {
        Ok(entry_name.to_string())
    }

    /// Transforms entry content. The default passes it through.
    fn transform_content(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        Ok(data)
    }

    /// Returns `false` if this modification never changes content.
    ///
    /// An entry whose applicable modifications all return `false` is copied
    /// without being decompressed.
    fn rewrites_content(&self) -> bool {
        true
    }

    /// Applies the rename and the content transform to an entry.
    fn apply(&self, entry: ArchiveEntry) -> Result<ArchiveEntry> {
        let name = self.rename_entry(&entry.name)?;
        let data = if self.rewrites_content() {
            self.transform_content(entry.data)?
        } else {
            entry.data
        };
        Ok(ArchiveEntry { name, data })
    }
}

impl<M: EntryModification + ?Sized> EntryModification for &M {
    fn applies_to(&self, entry_name: &str) -> bool {
        (**self).applies_to(entry_name)
    }

    fn rename_entry(&self, entry_name: &str) -> Result<String> {
        (**self).rename_entry(entry_name)
    }

    fn transform_content(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        (**self).transform_content(data)
    }

    fn rewrites_content(&self) -> bool {
        (**self).rewrites_content()
    }

    fn apply(&self, entry: ArchiveEntry) -> Result<ArchiveEntry> {
        (**self).apply(entry)
    }
}

/// One modification of any supported kind.
#[derive(Debug, Clone)]
pub enum Modification {
    /// Overwrite an annotation element in class files.
    AnnotationValue(AnnotationValueModification),
    /// Rename entries matching a pattern.
    Rename(RenameModification),
    /// Edit JSON or TOML documents.
    StructuredText(StructuredTextModification),
    /// Edit plain-text documents.
    PlainText(PlainTextModification),
}

impl Modification {
    /// Sets `element_name` of every `type_descriptor` annotation in class
    /// files to `value`.
    ///
    /// ```rust
    /// use jarmod::Modification;
    ///
    /// let m = Modification::annotation_value("Lnet/minecraftforge/fml/common/Mod;", "value", "mymod");
    /// assert_eq!(m.kind(), "annotation");
    /// ```
    pub fn annotation_value(
        type_descriptor: impl Into<String>,
        element_name: impl Into<String>,
        value: impl Into<AnnotationValue>,
    ) -> Self {
        Modification::AnnotationValue(AnnotationValueModification::new(
            type_descriptor,
            element_name,
            value,
        ))
    }

    /// Renames entries whose whole name matches `pattern`.
    ///
    /// `replacement` may refer to capture groups as `$1` or `${name}`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidRegex`] if the pattern does not compile.
    pub fn rename(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        RenameModification::new(pattern, replacement).map(Modification::Rename)
    }

    /// Edits JSON documents selected by `matcher`, printed with the default
    /// [`JsonFormat`].
    pub fn json<F>(matcher: impl Into<EntryMatcher>, edit: F) -> Self
    where
        F: Fn(serde_json::Map<String, serde_json::Value>) -> Result<serde_json::Map<String, serde_json::Value>>
            + Send
            + Sync
            + 'static,
    {
        Modification::StructuredText(StructuredTextModification::json(
            matcher,
            edit,
            JsonFormat::default(),
        ))
    }

    /// Edits TOML documents selected by `matcher`, printed with the default
    /// [`TomlFormat`].
    pub fn toml<F>(matcher: impl Into<EntryMatcher>, edit: F) -> Self
    where
        F: Fn(toml::Table) -> Result<toml::Table> + Send + Sync + 'static,
    {
        Modification::StructuredText(StructuredTextModification::toml(
            matcher,
            edit,
            TomlFormat::default(),
        ))
    }

    /// Edits structured documents with an explicit edit and print format.
    pub fn structured_text(matcher: impl Into<EntryMatcher>, edit: StructuredEdit) -> Self {
        Modification::StructuredText(StructuredTextModification::new(matcher, edit))
    }

    /// Edits plain-text documents selected by `matcher`.
    pub fn plain_text<F>(matcher: impl Into<EntryMatcher>, edit: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Modification::PlainText(PlainTextModification::new(matcher, edit))
    }

    /// Rewrites lines of plain-text documents by prefix; see [`LineRule`].
    pub fn line_rules(matcher: impl Into<EntryMatcher>, rules: Vec<LineRule>) -> Self {
        Modification::PlainText(PlainTextModification::line_rules(matcher, rules))
    }

    /// Returns the modification kind as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            Modification::AnnotationValue(_) => "annotation",
            Modification::Rename(_) => "rename",
            Modification::StructuredText(m) => m.format_name(),
            Modification::PlainText(_) => "plain-text",
        }
    }

    fn as_dyn(&self) -> &dyn EntryModification {
        match self {
            Modification::AnnotationValue(m) => m,
            Modification::Rename(m) => m,
            Modification::StructuredText(m) => m,
            Modification::PlainText(m) => m,
        }
    }
}

impl EntryModification for Modification {
    fn applies_to(&self, entry_name: &str) -> bool {
        self.as_dyn().applies_to(entry_name)
    }

    fn rename_entry(&self, entry_name: &str) -> Result<String> {
        self.as_dyn().rename_entry(entry_name)
    }

    fn transform_content(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        self.as_dyn().transform_content(data)
    }

    fn rewrites_content(&self) -> bool {
        self.as_dyn().rewrites_content()
    }

    fn apply(&self, entry: ArchiveEntry) -> Result<ArchiveEntry> {
        self.as_dyn().apply(entry)
    }
}

impl From<AnnotationValueModification> for Modification {
    fn from(m: AnnotationValueModification) -> Self {
        Modification::AnnotationValue(m)
    }
}

impl From<RenameModification> for Modification {
    fn from(m: RenameModification) -> Self {
        Modification::Rename(m)
    }
}

impl From<StructuredTextModification> for Modification {
    fn from(m: StructuredTextModification) -> Self {
        Modification::StructuredText(m)
    }
}

impl From<PlainTextModification> for Modification {
    fn from(m: PlainTextModification) -> Self {
        Modification::PlainText(m)
    }
}
