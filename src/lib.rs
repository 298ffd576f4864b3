//! # jarmod
//!
//! Declarative rewriting of JAR archives.
//!
//! A rewrite takes a source archive and an ordered list of modifications and
//! produces a new archive. Every entry is visited in archive order; the
//! modifications that apply to its name are folded over it in the order they
//! were declared. Entries nothing applies to are copied byte for byte, without
//! being decompressed.
//!
//! ## Quick Start
//!
//! ### Retargeting a template mod
//!
//! ```rust,no_run
//! use jarmod::{Modification, Result, rewrite_archive};
//!
//! fn main() -> Result<()> {
//!     let modifications = vec![
//!         // Overwrite @Mod("universal") in every class file.
//!         Modification::annotation_value("Lnet/neoforged/fml/common/Mod;", "value", "mymod"),
//!         // Rename the mixin config.
//!         Modification::rename(r"universal\.mixins\.json", "mymod.mixins.json")?,
//!     ];
//!
//!     // Source and destination may be the same file.
//!     let result = rewrite_archive("mod.jar", "mod.jar", &modifications)?;
//!     println!(
//!         "{} modified, {} renamed, {} copied",
//!         result.entries_modified, result.entries_renamed, result.entries_copied
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Editing documents
//!
//! ```rust,no_run
//! use jarmod::{ArchiveRewriter, EntryMatcher, JsonFormat, KeyOrder, Modification, Result};
//! use jarmod::StructuredTextModification;
//!
//! fn main() -> Result<()> {
//!     let modifications = vec![
//!         Modification::json("pack.mcmeta", |mut object| {
//!             object.insert("pack_format".into(), 34.into());
//!             Ok(object)
//!         }),
//!         Modification::plain_text("LICENSE.txt", |text| text.replace("2023", "2024")),
//!         StructuredTextModification::json(
//!             EntryMatcher::regex(r"data/.*\.json")?,
//!             Ok,
//!             JsonFormat::new().key_order(KeyOrder::Sorted),
//!         )
//!         .into(),
//!     ];
//!
//!     ArchiveRewriter::new(&modifications).rewrite("in.jar", "out.jar")?;
//!     Ok(())
//! }
//! ```
//!
//! ### Platform presets
//!
//! The [`preset`] module builds the modifications that stamp a mod's identity
//! onto a template archive for Fabric, Forge or NeoForge.
//!
//! ## Class files
//!
//! The [`classfile`] module reads and writes class files, keeping every byte
//! it does not understand (method code, type annotations, unknown attributes)
//! verbatim. [`classfile::patch_annotation_element`] is the operation behind
//! [`AnnotationValueModification`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. A rewrite either replaces the
//! destination with a complete archive or leaves both files as they were;
//! failures inside one entry are reported as
//! [`Error::EntryTransformFailed`] naming that entry.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod classfile;
mod entry;
pub mod error;
pub mod modification;
pub mod preset;
mod rewrite;

pub use entry::ArchiveEntry;
pub use error::{DocumentFormat, Error, Result};

pub use modification::{
    AnnotationValueModification, EntryMatcher, EntryModification, Indent, JsonFormat, KeyOrder,
    LineRule, Modification, PlainTextModification, RenameModification, StructuredEdit,
    StructuredTextModification, TomlFormat, apply_line_rules,
};

pub use rewrite::{
    ArchiveRewriter, CancellationToken, CompressionPolicy, RewriteOptions, RewriteResult,
    rewrite_archive,
};
