//! Shared test utilities for integration tests.
//!
//! Provides in-memory ZIP archives and hand-assembled class files. Class
//! bytes are assembled here directly, not through `jarmod::classfile`, so the
//! parser is tested against independently produced input.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Creates an in-memory ZIP archive with deflated entries.
///
/// Names ending in `/` are added as directories.
pub fn create_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    create_archive_with_method(CompressionMethod::Deflated, entries)
}

/// Creates an in-memory ZIP archive using `method` for every file entry.
pub fn create_archive_with_method(method: CompressionMethod, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);
    for (name, data) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, options)
                .expect("failed to add directory");
        } else {
            writer.start_file(*name, options).expect("failed to start file");
            writer.write_all(data).expect("failed to write entry");
        }
    }
    writer
        .finish()
        .expect("failed to finish archive")
        .into_inner()
}

/// Writes an archive to `dir/name` and returns its path.
pub fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, create_archive(entries)).expect("failed to write archive");
    path
}

/// Reads every entry of an archive as `(name, content)` in archive order.
pub fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("failed to open archive");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).expect("failed to read entry");
            let mut data = Vec::new();
            file.read_to_end(&mut data).expect("failed to read content");
            (file.name().to_string(), data)
        })
        .collect()
}

/// Reads every entry of an archive file.
pub fn read_entries_from(path: &Path) -> Vec<(String, Vec<u8>)> {
    read_entries(&std::fs::read(path).expect("failed to read archive"))
}

/// Returns the content of the named entry.
pub fn entry_content(entries: &[(String, Vec<u8>)], name: &str) -> Option<Vec<u8>> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, data)| data.clone())
}

/// Name of the single attribute every annotated test class carries.
const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

/// Assembles class files with one class-level annotation.
pub struct ClassBuilder {
    name: String,
    annotation: Option<(String, Vec<(String, String)>)>,
    major_version: u16,
}

impl ClassBuilder {
    /// Starts a class with the given internal name and no annotation.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotation: None,
            major_version: 61,
        }
    }

    /// Sets the class-file major version.
    pub fn major_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    /// Adds a class-level annotation of type `descriptor`.
    pub fn annotation(mut self, descriptor: &str) -> Self {
        self.annotation = Some((descriptor.to_string(), Vec::new()));
        self
    }

    /// Adds a string element to the annotation.
    pub fn string_element(mut self, name: &str, value: &str) -> Self {
        if let Some((_, elements)) = &mut self.annotation {
            elements.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Assembles the class file bytes.
    pub fn build(&self) -> Vec<u8> {
        // Utf8 entries first, then the two Class constants.
        let mut strings: Vec<String> = Vec::new();
        let index_of = |s: &str, strings: &mut Vec<String>| -> u16 {
            if let Some(i) = strings.iter().position(|x| x == s) {
                return (i + 1) as u16;
            }
            strings.push(s.to_string());
            strings.len() as u16
        };

        let this_name = index_of(&self.name, &mut strings);
        let super_name = index_of("java/lang/Object", &mut strings);

        let mut annotation_body = Vec::new();
        let mut attribute_name = 0;
        if let Some((descriptor, elements)) = &self.annotation {
            attribute_name = index_of(RUNTIME_VISIBLE_ANNOTATIONS, &mut strings);
            let type_index = index_of(descriptor, &mut strings);
            annotation_body.extend_from_slice(&1u16.to_be_bytes());
            annotation_body.extend_from_slice(&type_index.to_be_bytes());
            annotation_body.extend_from_slice(&(elements.len() as u16).to_be_bytes());
            for (name, value) in elements {
                let name_index = index_of(name, &mut strings);
                let value_index = index_of(value, &mut strings);
                annotation_body.extend_from_slice(&name_index.to_be_bytes());
                annotation_body.push(b's');
                annotation_body.extend_from_slice(&value_index.to_be_bytes());
            }
        }

        let this_class = strings.len() as u16 + 1;
        let super_class = this_class + 1;
        let count = strings.len() as u16 + 3;

        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0];
        bytes.extend_from_slice(&self.major_version.to_be_bytes());
        bytes.extend_from_slice(&count.to_be_bytes());
        for s in &strings {
            bytes.push(1);
            bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
            bytes.extend_from_slice(s.as_bytes());
        }
        bytes.push(7);
        bytes.extend_from_slice(&this_name.to_be_bytes());
        bytes.push(7);
        bytes.extend_from_slice(&super_name.to_be_bytes());

        bytes.extend_from_slice(&0x0021u16.to_be_bytes());
        bytes.extend_from_slice(&this_class.to_be_bytes());
        bytes.extend_from_slice(&super_class.to_be_bytes());
        bytes.extend_from_slice(&[0, 0]); // interfaces
        bytes.extend_from_slice(&[0, 0]); // fields
        bytes.extend_from_slice(&[0, 0]); // methods

        if self.annotation.is_some() {
            bytes.extend_from_slice(&1u16.to_be_bytes());
            bytes.extend_from_slice(&attribute_name.to_be_bytes());
            bytes.extend_from_slice(&(annotation_body.len() as u32).to_be_bytes());
            bytes.extend_from_slice(&annotation_body);
        } else {
            bytes.extend_from_slice(&[0, 0]);
        }
        bytes
    }
}

/// `A.class` annotated `@foo.Mod(value = "old")`.
pub fn mod_annotated_class() -> Vec<u8> {
    ClassBuilder::new("A")
        .annotation("Lfoo/Mod;")
        .string_element("value", "old")
        .build()
}

/// A class with no annotations.
pub fn plain_class(name: &str) -> Vec<u8> {
    ClassBuilder::new(name).build()
}

// =============================================================================
// Compiled fixtures
// =============================================================================

// Built by `javac --release 17` from `tests/fixtures/java/foo/*.java`.

/// `foo.A`: annotated class, field, method and parameter, a lambda, a loop
/// with a `StackMapTable`, and `long`/`double` constants.
pub const COMPILED_A: &[u8] = include_bytes!("../fixtures/A.class");
/// `foo.A$R`: a record with an annotated component and compact constructor.
pub const COMPILED_RECORD: &[u8] = include_bytes!("../fixtures/A$R.class");
/// `foo.A$E`: an enum with no `@Mod` annotations.
pub const COMPILED_ENUM: &[u8] = include_bytes!("../fixtures/A$E.class");
/// `foo.Mod`: the annotation interface itself.
pub const COMPILED_MOD: &[u8] = include_bytes!("../fixtures/Mod.class");

/// Descriptor of the `foo.Mod` annotation used by the compiled fixtures.
pub const COMPILED_MOD_DESCRIPTOR: &str = "Lfoo/Mod;";
