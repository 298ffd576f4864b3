//! Reading, writing and patching compiled class files.
//!
//! [`parse`] turns class-file bytes into a [`ClassFile`] and [`serialize`]
//! turns it back into bytes. Only the parts needed to reach annotations are
//! decoded; everything else is carried as opaque bytes, so an unmodified
//! class serializes to exactly the bytes it was parsed from.
//!
//! # Example
//!
//! ```rust
//! use jarmod::classfile::{self, AnnotationValue};
//!
//! fn retarget(bytes: &[u8]) -> jarmod::Result<Vec<u8>> {
//!     let class = classfile::parse(bytes)?;
//!     let (class, outcome) = classfile::patch_annotation_element(
//!         class,
//!         "Lnet/neoforged/fml/common/Mod;",
//!         "value",
//!         &AnnotationValue::from("mymod"),
//!     )?;
//!     log::debug!("{} annotations matched", outcome.annotations_matched);
//!     classfile::serialize(&class)
//! }
//! ```

mod annotation;
mod attribute;
pub mod mutf8;
mod patch;
mod pool;
mod reader;
mod writer;

pub use annotation::{Annotation, ConstTag, ElementValue, ElementValuePair};
pub use attribute::{
    Attribute, AttributeBody, RECORD, RUNTIME_INVISIBLE_ANNOTATIONS,
    RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS,
    RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS, RecordComponent,
};
pub use patch::{AnnotationValue, PatchOutcome, patch_annotation_element, read_annotation_element};
pub use pool::{Constant, ConstantPool};

use crate::{Error, Result};
use attribute::{AttributeLocation, read_attributes, write_attributes};
use reader::ByteReader;
use writer::ByteWriter;

/// The class-file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Oldest supported major version (JDK 1.1).
pub const MIN_MAJOR_VERSION: u16 = 45;

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Minor version.
    pub minor_version: u16,
    /// Major version.
    pub major_version: u16,
    /// The constant pool.
    pub constant_pool: ConstantPool,
    /// Class access flags.
    pub access_flags: u16,
    /// Class constant index of this class.
    pub this_class: u16,
    /// Class constant index of the superclass, or 0 for `java/lang/Object`.
    pub super_class: u16,
    /// Class constant indices of direct superinterfaces.
    pub interfaces: Vec<u16>,
    /// Declared fields.
    pub fields: Vec<Member>,
    /// Declared methods.
    pub methods: Vec<Member>,
    /// Class-level attributes.
    pub attributes: Vec<Attribute>,
}

/// A field or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Access flags.
    pub access_flags: u16,
    /// Utf8 index of the simple name.
    pub name_index: u16,
    /// Utf8 index of the descriptor.
    pub descriptor_index: u16,
    /// Attributes attached to the member.
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Returns the internal name of this class, e.g. `com/example/Main`.
    pub fn class_name(&self) -> Option<String> {
        self.constant_pool.class_name(self.this_class)
    }
}

/// Returns `true` if `bytes` start with the class-file magic number.
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == MAGIC.to_be_bytes()
}

/// Parses class-file bytes.
///
/// # Errors
///
/// Returns [`Error::MalformedClassFile`] if the magic or version is wrong,
/// if any count or length disagrees with the bytes that follow, if a tag is
/// unknown, if a name index does not resolve, or if bytes remain after the
/// last attribute.
pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.u32("magic")?;
    if magic != MAGIC {
        return Err(Error::malformed_class(0, format!("bad magic {:#010x}", magic)));
    }
    let minor_version = reader.u16("minor version")?;
    let major_offset = reader.offset();
    let major_version = reader.u16("major version")?;
    if major_version < MIN_MAJOR_VERSION {
        return Err(Error::malformed_class(
            major_offset,
            format!("unsupported major version {}", major_version),
        ));
    }

    let constant_pool = ConstantPool::read(&mut reader)?;
    let access_flags = reader.u16("access flags")?;
    let this_class = read_class_index(&mut reader, &constant_pool, "this class", false)?;
    let super_class = read_class_index(&mut reader, &constant_pool, "super class", true)?;

    let interface_count = reader.u16("interface count")?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(read_class_index(&mut reader, &constant_pool, "interface", false)?);
    }

    let fields = read_members(&mut reader, &constant_pool, AttributeLocation::Field)?;
    let methods = read_members(&mut reader, &constant_pool, AttributeLocation::Method)?;
    let attributes = read_attributes(&mut reader, &constant_pool, AttributeLocation::Class)?;

    reader.expect_end("class file")?;

    Ok(ClassFile {
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

/// Serializes a class file.
///
/// Counts and attribute lengths are computed from the structure, so edits
/// never need to maintain them by hand.
pub fn serialize(class: &ClassFile) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(4096);
    writer.u32(MAGIC);
    writer.u16(class.minor_version);
    writer.u16(class.major_version);
    class.constant_pool.write(&mut writer)?;
    writer.u16(class.access_flags);
    writer.u16(class.this_class);
    writer.u16(class.super_class);
    writer.count(class.interfaces.len(), "interface")?;
    for interface in &class.interfaces {
        writer.u16(*interface);
    }
    write_members(&mut writer, &class.fields, "field")?;
    write_members(&mut writer, &class.methods, "method")?;
    write_attributes(&mut writer, &class.attributes)?;
    Ok(writer.into_bytes())
}

fn read_class_index(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    what: &str,
    allow_zero: bool,
) -> Result<u16> {
    let offset = reader.offset();
    let index = reader.u16(what)?;
    if allow_zero && index == 0 {
        return Ok(0);
    }
    match pool.get(index) {
        Some(Constant::Class(_)) => Ok(index),
        _ => Err(Error::malformed_class(
            offset,
            format!("{} index #{} is not a Class constant", what, index),
        )),
    }
}

fn read_members(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    location: AttributeLocation,
) -> Result<Vec<Member>> {
    let count = reader.u16("member count")?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        members.push(Member {
            access_flags: reader.u16("member access flags")?,
            name_index: annotation::read_utf8_index(reader, pool, "member name")?,
            descriptor_index: annotation::read_utf8_index(reader, pool, "member descriptor")?,
            attributes: read_attributes(reader, pool, location)?,
        });
    }
    Ok(members)
}

fn write_members(writer: &mut ByteWriter, members: &[Member], what: &str) -> Result<()> {
    writer.count(members.len(), what)?;
    for member in members {
        writer.u16(member.access_flags);
        writer.u16(member.name_index);
        writer.u16(member.descriptor_index);
        write_attributes(writer, &member.attributes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `public class Foo extends java/lang/Object {}` with no members.
    fn minimal_class() -> Vec<u8> {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
        bytes.extend_from_slice(&[0, 5]); // four constants
        bytes.extend_from_slice(&[1, 0, 3, b'F', b'o', b'o']); // #1
        bytes.extend_from_slice(&[7, 0, 1]); // #2 Class Foo
        bytes.extend_from_slice(&[1, 0, 16]); // #3
        bytes.extend_from_slice(b"java/lang/Object");
        bytes.extend_from_slice(&[7, 0, 3]); // #4
        bytes.extend_from_slice(&[0, 0x21, 0, 2, 0, 4]);
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_parse_minimal_class() {
        let bytes = minimal_class();
        let class = parse(&bytes).unwrap();
        assert_eq!(class.major_version, 52);
        assert_eq!(class.class_name().as_deref(), Some("Foo"));
        assert!(class.fields.is_empty());
        assert_eq!(serialize(&class).unwrap(), bytes);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = minimal_class();
        bytes[0] = 0xCB;
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, Error::MalformedClassFile { offset: 0, .. }));
        assert!(!has_magic(&bytes));
    }

    #[test]
    fn test_old_major_version() {
        let mut bytes = minimal_class();
        bytes[7] = 44;
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, Error::MalformedClassFile { offset: 6, .. }));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = minimal_class();
        bytes.push(0);
        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_truncated() {
        let bytes = minimal_class();
        for len in [3, 9, 20, bytes.len() - 1] {
            assert!(parse(&bytes[..len]).is_err(), "length {}", len);
        }
    }

    #[test]
    fn test_this_class_must_be_class_constant() {
        let mut bytes = minimal_class();
        let this_class_at = bytes.len() - 12;
        bytes[this_class_at + 1] = 1;
        assert!(parse(&bytes).is_err());
    }
}
