//! Error types for archive rewriting and class-file patching.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of a rewrite, along with a convenient [`Result<T>`] type
//! alias.
//!
//! # Error Handling
//!
//! Every fallible operation in this crate returns `Result<T, Error>`. A
//! rewrite either completes for the whole archive or fails without touching
//! the destination, so there is no partial success to inspect:
//!
//! ```rust,no_run
//! use jarmod::{Error, Modification, rewrite_archive};
//!
//! fn retarget(path: &str) -> jarmod::Result<()> {
//!     let modifications = vec![Modification::annotation_value(
//!         "Lnet/neoforged/fml/common/Mod;",
//!         "value",
//!         "mymod",
//!     )];
//!
//!     match rewrite_archive(path, path, &modifications) {
//!         Ok(_) => Ok(()),
//!         Err(Error::EntryTransformFailed { entry_name, source }) => {
//!             eprintln!("{} could not be rewritten: {}", entry_name, source);
//!             Err(Error::EntryTransformFailed { entry_name, source })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```
//!
//! ## Error Categories
//!
//! | Category | Variants | Typical Cause |
//! |----------|----------|---------------|
//! | I/O | [`Io`][Error::Io], [`Zip`][Error::Zip] | File system or container errors |
//! | Format | [`MalformedClassFile`][Error::MalformedClassFile], [`MalformedDocument`][Error::MalformedDocument] | Entry content does not parse |
//! | Requests | [`UnsupportedAnnotationValueKind`][Error::UnsupportedAnnotationValueKind], [`InvalidRegex`][Error::InvalidRegex] | Caller asked for something unrepresentable |
//! | Pipeline | [`EntryTransformFailed`][Error::EntryTransformFailed], [`ArchiveReplaceFailed`][Error::ArchiveReplaceFailed], [`Cancelled`][Error::Cancelled] | Whole-rewrite failures |

use std::io;
use std::path::PathBuf;

/// Structured-text formats understood by the document editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// JSON documents (`*.json`).
    Json,
    /// TOML documents (`*.toml`).
    Toml,
    /// UTF-8 plain text.
    PlainText,
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Toml => write!(f, "TOML"),
            Self::PlainText => write!(f, "plain text"),
        }
    }
}

/// The main error type for archive rewriting.
///
/// Errors raised while transforming a single entry are wrapped in
/// [`Error::EntryTransformFailed`] by the rewrite engine, so the caller always
/// learns which entry aborted the rewrite. The underlying cause is available
/// through [`std::error::Error::source`] or by matching on the boxed value.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The ZIP container could not be read or written.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Bytes claiming to be a class file do not parse as one.
    ///
    /// The offset is the position in the class file at which the reader gave
    /// up, which is usually where the inconsistency was detected.
    #[error("malformed class file at offset {offset:#x}: {reason}")]
    MalformedClassFile {
        /// Byte offset within the class file.
        offset: usize,
        /// A description of the inconsistency.
        reason: String,
    },

    /// Adding a constant would grow the constant pool past its 16-bit limit.
    #[error("constant pool cannot hold {slots} slots (maximum is 65535)")]
    ConstantPoolOverflow {
        /// Number of slots the pool would need.
        slots: usize,
    },

    /// The patcher was asked to write a value it cannot represent.
    ///
    /// Only scalar constants, class literals and enum constants can be written
    /// into an annotation element.
    #[error("unsupported annotation value kind: {kind}")]
    UnsupportedAnnotationValueKind {
        /// The rejected kind.
        kind: &'static str,
    },

    /// A structured-text document could not be parsed, edited or printed.
    #[error("malformed {format} document: {reason}")]
    MalformedDocument {
        /// The document format.
        format: DocumentFormat,
        /// A description of the failure.
        reason: String,
    },

    /// An invalid regular expression pattern was provided.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex {
        /// The invalid regex pattern.
        pattern: String,
        /// Description of why the pattern is invalid.
        reason: String,
    },

    /// A rename was invoked on an entry its pattern does not match.
    ///
    /// The rewrite engine only renames entries that passed `applies_to`, so
    /// seeing this error indicates a caller driving modifications by hand.
    #[error("rename pattern '{pattern}' does not match entry '{entry_name}'")]
    NoSuchRenameTarget {
        /// The entry that was not matched.
        entry_name: String,
        /// The rename pattern.
        pattern: String,
    },

    /// A modification failed while transforming an entry.
    #[error("failed to transform entry '{entry_name}': {source}")]
    EntryTransformFailed {
        /// Name of the entry as it was read from the source archive.
        entry_name: String,
        /// The underlying failure.
        source: Box<Error>,
    },

    /// The rewritten archive could not replace the destination.
    ///
    /// The destination (and the source, when rewriting in place) is left
    /// exactly as it was before the rewrite started.
    #[error("failed to replace '{}': {source}", destination.display())]
    ArchiveReplaceFailed {
        /// The destination that was to be replaced.
        destination: PathBuf,
        /// The I/O failure reported by the platform.
        source: io::Error,
    },

    /// The rewrite was stopped through a cancellation token.
    #[error("rewrite cancelled")]
    Cancelled,
}

impl Error {
    /// Creates a [`Error::MalformedClassFile`] error.
    pub fn malformed_class(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedClassFile {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a [`Error::MalformedDocument`] error.
    pub fn malformed_document(format: DocumentFormat, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            format,
            reason: reason.into(),
        }
    }

    /// Wraps an error raised while transforming `entry_name`.
    pub fn entry_transform(entry_name: impl Into<String>, source: Error) -> Self {
        Self::EntryTransformFailed {
            entry_name: entry_name.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` if this error indicates corrupt input data.
    ///
    /// Looks through [`Error::EntryTransformFailed`] to the underlying cause.
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::MalformedClassFile { .. } | Error::MalformedDocument { .. } => true,
            Error::Zip(zip::result::ZipError::InvalidArchive(_)) => true,
            Error::EntryTransformFailed { source, .. } => source.is_corruption(),
            _ => false,
        }
    }

    /// Returns `true` if this error is due to an unsupported request.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Error::UnsupportedAnnotationValueKind { .. } => true,
            Error::Zip(zip::result::ZipError::UnsupportedArchive(_)) => true,
            Error::EntryTransformFailed { source, .. } => source.is_unsupported(),
            _ => false,
        }
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::EntryTransformFailed { entry_name, .. }
            | Error::NoSuchRenameTarget { entry_name, .. } => Some(entry_name),
            _ => None,
        }
    }

    /// Returns the innermost error, unwrapping entry-level wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::EntryTransformFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A specialized Result type for rewrite operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_malformed_class() {
        let err = Error::malformed_class(0x1a, "bad magic");
        assert_eq!(
            err.to_string(),
            "malformed class file at offset 0x1a: bad magic"
        );
        assert!(err.is_corruption());
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_malformed_document() {
        let err = Error::malformed_document(DocumentFormat::Toml, "expected a table");
        assert_eq!(err.to_string(), "malformed TOML document: expected a table");
        assert!(err.is_corruption());
    }

    #[test]
    fn test_entry_transform_wraps_cause() {
        let err = Error::entry_transform("A.class", Error::malformed_class(0, "truncated"));
        assert_eq!(err.entry_name(), Some("A.class"));
        assert!(err.to_string().contains("A.class"));
        assert!(err.to_string().contains("truncated"));
        assert!(err.is_corruption());
        assert!(matches!(err.root_cause(), Error::MalformedClassFile { .. }));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("truncated"));
    }

    #[test]
    fn test_unsupported_value_kind() {
        let err = Error::entry_transform(
            "B.class",
            Error::UnsupportedAnnotationValueKind { kind: "array" },
        );
        assert!(err.is_unsupported());
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_archive_replace_failed() {
        let err = Error::ArchiveReplaceFailed {
            destination: PathBuf::from("/tmp/out.jar"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/out.jar"));
        assert!(err.to_string().contains("denied"));
        assert_eq!(err.entry_name(), None);
    }

    #[test]
    fn test_no_such_rename_target() {
        let err = Error::NoSuchRenameTarget {
            entry_name: "other.json".into(),
            pattern: r"fabric\.mixins\.json".into(),
        };
        assert_eq!(err.entry_name(), Some("other.json"));
    }

    #[test]
    fn test_cancelled() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "rewrite cancelled");
        assert!(!err.is_corruption());
        assert_eq!(err.entry_name(), None);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
