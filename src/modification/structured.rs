//! JSON and TOML document editing.
//!
//! Documents are parsed into a tree, handed to a pure edit function, and
//! printed according to a per-modification format. Printing never depends on
//! process-wide settings.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{EntryMatcher, EntryModification};
use crate::error::DocumentFormat;
use crate::{Error, Result};

/// An edit of a JSON object.
pub type JsonEdit = Arc<dyn Fn(Map<String, Value>) -> Result<Map<String, Value>> + Send + Sync>;

/// An edit of a TOML table.
pub type TomlEdit = Arc<dyn Fn(toml::Table) -> Result<toml::Table> + Send + Sync>;

/// Key ordering of printed documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyOrder {
    /// Keep the order produced by the edit (insertion order).
    #[default]
    Preserve,
    /// Sort keys of every table or object.
    Sorted,
}

/// Indentation of printed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    /// Single-line output.
    Compact,
    /// The given number of spaces per level.
    Spaces(usize),
    /// One tab per level.
    Tab,
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

/// How a JSON document is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormat {
    /// Indentation.
    pub indent: Indent,
    /// Key ordering.
    pub key_order: KeyOrder,
    /// Whether to end the document with a newline.
    pub trailing_newline: bool,
}

impl JsonFormat {
    /// Creates the default format: two-space indent, insertion order, no
    /// trailing newline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation.
    pub fn indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the key ordering.
    pub fn key_order(mut self, key_order: KeyOrder) -> Self {
        self.key_order = key_order;
        self
    }

    /// Sets whether a trailing newline is printed.
    pub fn trailing_newline(mut self, trailing_newline: bool) -> Self {
        self.trailing_newline = trailing_newline;
        self
    }

    fn print(&self, object: Map<String, Value>) -> Result<Vec<u8>> {
        let value = match self.key_order {
            KeyOrder::Preserve => Value::Object(object),
            KeyOrder::Sorted => sort_json(Value::Object(object)),
        };

        let mut out = Vec::new();
        let written = match self.indent {
            Indent::Compact => serde_json::to_writer(&mut out, &value),
            Indent::Spaces(n) => {
                let indent = vec![b' '; n];
                write_pretty(&mut out, &value, &indent)
            }
            Indent::Tab => write_pretty(&mut out, &value, b"\t"),
        };
        written.map_err(|e| Error::malformed_document(DocumentFormat::Json, e.to_string()))?;

        if self.trailing_newline {
            out.push(b'\n');
        }
        Ok(out)
    }
}

fn write_pretty(out: &mut Vec<u8>, value: &Value, indent: &[u8]) -> serde_json::Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(out, formatter);
    value.serialize(&mut serializer)
}

fn sort_json(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_json(v))).collect())
        }
        Value::Array(values) => Value::Array(values.into_iter().map(sort_json).collect()),
        other => other,
    }
}

/// How a TOML document is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TomlFormat {
    /// Print arrays one element per line.
    pub pretty_arrays: bool,
    /// Key ordering.
    pub key_order: KeyOrder,
}

impl TomlFormat {
    /// Creates the default format: inline arrays, insertion order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether arrays are printed one element per line.
    pub fn pretty_arrays(mut self, pretty_arrays: bool) -> Self {
        self.pretty_arrays = pretty_arrays;
        self
    }

    /// Sets the key ordering.
    pub fn key_order(mut self, key_order: KeyOrder) -> Self {
        self.key_order = key_order;
        self
    }

    fn print(&self, table: toml::Table) -> Result<Vec<u8>> {
        let table = match self.key_order {
            KeyOrder::Preserve => table,
            KeyOrder::Sorted => sort_table(table),
        };
        let printed = if self.pretty_arrays {
            toml::to_string_pretty(&table)
        } else {
            toml::to_string(&table)
        };
        printed
            .map(String::into_bytes)
            .map_err(|e| Error::malformed_document(DocumentFormat::Toml, e.to_string()))
    }
}

fn sort_table(table: toml::Table) -> toml::Table {
    let mut entries: Vec<(String, toml::Value)> = table.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(k, v)| (k, sort_toml(v)))
        .collect()
}

fn sort_toml(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Table(table) => toml::Value::Table(sort_table(table)),
        toml::Value::Array(values) => {
            toml::Value::Array(values.into_iter().map(sort_toml).collect())
        }
        other => other,
    }
}

/// A structured-document edit together with its print format.
#[derive(Clone)]
pub enum StructuredEdit {
    /// Edit the top-level object of a JSON document.
    Json {
        /// The edit.
        edit: JsonEdit,
        /// The print format.
        format: JsonFormat,
    },
    /// Edit the root table of a TOML document.
    Toml {
        /// The edit.
        edit: TomlEdit,
        /// The print format.
        format: TomlFormat,
    },
}

impl fmt::Debug for StructuredEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredEdit::Json { format, .. } => {
                f.debug_struct("Json").field("format", format).finish_non_exhaustive()
            }
            StructuredEdit::Toml { format, .. } => {
                f.debug_struct("Toml").field("format", format).finish_non_exhaustive()
            }
        }
    }
}

/// Edits JSON or TOML entries through a tree edit.
///
/// A JSON document must be an object at the top level; anything else fails
/// with [`Error::MalformedDocument`].
#[derive(Debug, Clone)]
pub struct StructuredTextModification {
    matcher: EntryMatcher,
    edit: StructuredEdit,
}

impl StructuredTextModification {
    /// Creates a modification from an edit and the entries it applies to.
    pub fn new(matcher: impl Into<EntryMatcher>, edit: StructuredEdit) -> Self {
        Self {
            matcher: matcher.into(),
            edit,
        }
    }

    /// Creates a JSON modification.
    pub fn json<F>(matcher: impl Into<EntryMatcher>, edit: F, format: JsonFormat) -> Self
    where
        F: Fn(Map<String, Value>) -> Result<Map<String, Value>> + Send + Sync + 'static,
    {
        Self::new(
            matcher,
            StructuredEdit::Json {
                edit: Arc::new(edit),
                format,
            },
        )
    }

    /// Creates a TOML modification.
    pub fn toml<F>(matcher: impl Into<EntryMatcher>, edit: F, format: TomlFormat) -> Self
    where
        F: Fn(toml::Table) -> Result<toml::Table> + Send + Sync + 'static,
    {
        Self::new(
            matcher,
            StructuredEdit::Toml {
                edit: Arc::new(edit),
                format,
            },
        )
    }

    /// Applies to every `.json` entry.
    pub fn any_json<F>(edit: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Result<Map<String, Value>> + Send + Sync + 'static,
    {
        Self::json(EntryMatcher::suffix(".json"), edit, JsonFormat::default())
    }

    /// Applies to every `.toml` entry.
    pub fn any_toml<F>(edit: F) -> Self
    where
        F: Fn(toml::Table) -> Result<toml::Table> + Send + Sync + 'static,
    {
        Self::toml(EntryMatcher::suffix(".toml"), edit, TomlFormat::default())
    }

    pub(crate) fn format_name(&self) -> &'static str {
        match self.edit {
            StructuredEdit::Json { .. } => "json",
            StructuredEdit::Toml { .. } => "toml",
        }
    }
}

impl EntryModification for StructuredTextModification {
    fn applies_to(&self, entry_name: &str) -> bool {
        self.matcher.matches(entry_name)
    }

    fn transform_content(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        match &self.edit {
            StructuredEdit::Json { edit, format } => {
                let object = match serde_json::from_slice::<Value>(&data) {
                    Ok(Value::Object(object)) => object,
                    Ok(other) => {
                        return Err(Error::malformed_document(
                            DocumentFormat::Json,
                            format!("expected an object, found {}", json_kind(&other)),
                        ));
                    }
                    Err(e) => {
                        return Err(Error::malformed_document(DocumentFormat::Json, e.to_string()));
                    }
                };
                format.print(edit(object)?)
            }
            StructuredEdit::Toml { edit, format } => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| Error::malformed_document(DocumentFormat::Toml, e.to_string()))?;
                let table = toml::from_str::<toml::Table>(text)
                    .map_err(|e| Error::malformed_document(DocumentFormat::Toml, e.to_string()))?;
                format.print(edit(table)?)
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
