//! Attributes and the subset of attribute bodies that are parsed.
//!
//! Only annotation-bearing attributes are understood. Everything else,
//! including `Code` and the type-annotation attributes, is kept as an opaque
//! byte blob and written back unchanged.

use super::annotation::{Annotation, read_utf8_index};
use super::pool::ConstantPool;
use super::reader::ByteReader;
use super::writer::ByteWriter;
use crate::{Error, Result};

/// `RuntimeVisibleAnnotations`
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
/// `RuntimeInvisibleAnnotations`
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
/// `RuntimeVisibleParameterAnnotations`
pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
/// `RuntimeInvisibleParameterAnnotations`
pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeInvisibleParameterAnnotations";
/// `Record`
pub const RECORD: &str = "Record";

/// Where an attribute table sits, which decides the attributes that may
/// legally appear in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeLocation {
    Class,
    Field,
    Method,
    RecordComponent,
}

/// A class-file attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Utf8 index of the attribute name.
    pub name_index: u16,
    /// The attribute body.
    pub body: AttributeBody,
}

/// The body of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeBody {
    /// `Runtime{Visible,Invisible}Annotations`.
    Annotations(Vec<Annotation>),
    /// `Runtime{Visible,Invisible}ParameterAnnotations`, one list per
    /// parameter.
    ParameterAnnotations(Vec<Vec<Annotation>>),
    /// `Record`.
    Record(Vec<RecordComponent>),
    /// Any other attribute, kept verbatim.
    Opaque(Vec<u8>),
}

/// One component of a `Record` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponent {
    /// Utf8 index of the component name.
    pub name_index: u16,
    /// Utf8 index of the component descriptor.
    pub descriptor_index: u16,
    /// Attributes attached to the component.
    pub attributes: Vec<Attribute>,
}

impl Attribute {
    /// Returns the attribute name as raw modified UTF-8.
    pub fn name<'p>(&self, pool: &'p ConstantPool) -> Option<&'p [u8]> {
        pool.utf8(self.name_index)
    }
}

pub(crate) fn read_attributes(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    location: AttributeLocation,
) -> Result<Vec<Attribute>> {
    let count = reader.u16("attribute count")?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        attributes.push(read_attribute(reader, pool, location)?);
    }
    Ok(attributes)
}

fn read_attribute(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    location: AttributeLocation,
) -> Result<Attribute> {
    let name_index = read_utf8_index(reader, pool, "attribute name")?;
    let length = reader.u32("attribute length")? as usize;
    let mut body_reader = reader.sub_reader(length, "attribute body")?;

    let name = pool.utf8(name_index).unwrap_or_default();
    let body = match (name, location) {
        (n, _) if n == RUNTIME_VISIBLE_ANNOTATIONS.as_bytes()
            || n == RUNTIME_INVISIBLE_ANNOTATIONS.as_bytes() =>
        {
            AttributeBody::Annotations(read_annotation_list(&mut body_reader, pool)?)
        }
        (n, AttributeLocation::Method)
            if n == RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS.as_bytes()
                || n == RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS.as_bytes() =>
        {
            let parameters = body_reader.u8("parameter count")?;
            let mut lists = Vec::with_capacity(parameters as usize);
            for _ in 0..parameters {
                lists.push(read_annotation_list(&mut body_reader, pool)?);
            }
            AttributeBody::ParameterAnnotations(lists)
        }
        (n, AttributeLocation::Class) if n == RECORD.as_bytes() => {
            let count = body_reader.u16("record component count")?;
            let mut components = Vec::with_capacity(count as usize);
            for _ in 0..count {
                components.push(RecordComponent {
                    name_index: read_utf8_index(&mut body_reader, pool, "record component name")?,
                    descriptor_index: read_utf8_index(
                        &mut body_reader,
                        pool,
                        "record component descriptor",
                    )?,
                    attributes: read_attributes(
                        &mut body_reader,
                        pool,
                        AttributeLocation::RecordComponent,
                    )?,
                });
            }
            AttributeBody::Record(components)
        }
        _ => {
            let rest = body_reader.remaining();
            AttributeBody::Opaque(body_reader.bytes(rest, "attribute body")?.to_vec())
        }
    };

    body_reader.expect_end("attribute body")?;
    Ok(Attribute { name_index, body })
}

fn read_annotation_list(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Vec<Annotation>> {
    let count = reader.u16("annotation count")?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(Annotation::read(reader, pool)?);
    }
    Ok(annotations)
}

pub(crate) fn write_attributes(writer: &mut ByteWriter, attributes: &[Attribute]) -> Result<()> {
    writer.count(attributes.len(), "attribute")?;
    for attribute in attributes {
        writer.u16(attribute.name_index);
        writer.length_prefixed("attribute", |body| write_body(body, &attribute.body))?;
    }
    Ok(())
}

fn write_body(writer: &mut ByteWriter, body: &AttributeBody) -> Result<()> {
    match body {
        AttributeBody::Annotations(annotations) => write_annotation_list(writer, annotations)?,
        AttributeBody::ParameterAnnotations(lists) => {
            let parameters = u8::try_from(lists.len()).map_err(|_| {
                Error::malformed_class(writer.len(), "more than 255 annotated parameters")
            })?;
            writer.u8(parameters);
            for list in lists {
                write_annotation_list(writer, list)?;
            }
        }
        AttributeBody::Record(components) => {
            writer.count(components.len(), "record component")?;
            for component in components {
                writer.u16(component.name_index);
                writer.u16(component.descriptor_index);
                write_attributes(writer, &component.attributes)?;
            }
        }
        AttributeBody::Opaque(bytes) => writer.bytes(bytes),
    }
    Ok(())
}

fn write_annotation_list(writer: &mut ByteWriter, annotations: &[Annotation]) -> Result<()> {
    writer.count(annotations.len(), "annotation")?;
    for annotation in annotations {
        annotation.write(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ConstantPool {
        let mut pool = ConstantPool::new();
        pool.intern_utf8(RUNTIME_VISIBLE_ANNOTATIONS).unwrap(); // 1
        pool.intern_utf8("Lfoo/Mod;").unwrap(); // 2
        pool.intern_utf8("SourceFile").unwrap(); // 3
        pool.intern_utf8(RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS).unwrap(); // 4
        pool
    }

    #[test]
    fn test_annotations_attribute_round_trip() {
        let bytes = [
            0, 2, // two attributes
            0, 1, 0, 0, 0, 6, 0, 1, 0, 2, 0, 0, // RuntimeVisibleAnnotations: @Lfoo/Mod;
            0, 3, 0, 0, 0, 2, 0, 9, // SourceFile (opaque)
        ];
        let pool = pool();
        let mut reader = ByteReader::new(&bytes);
        let attributes = read_attributes(&mut reader, &pool, AttributeLocation::Class).unwrap();
        assert!(reader.is_empty());
        assert!(matches!(attributes[0].body, AttributeBody::Annotations(ref a) if a.len() == 1));
        assert_eq!(attributes[1].body, AttributeBody::Opaque(vec![0, 9]));
        assert_eq!(attributes[1].name(&pool), Some(&b"SourceFile"[..]));

        let mut writer = ByteWriter::new();
        write_attributes(&mut writer, &attributes).unwrap();
        assert_eq!(writer.into_bytes(), bytes.to_vec());
    }

    #[test]
    fn test_declared_length_must_match_body() {
        // Declares 7 bytes but the annotation list only needs 6.
        let bytes = [0, 1, 0, 1, 0, 0, 0, 7, 0, 1, 0, 2, 0, 0, 0];
        let mut reader = ByteReader::new(&bytes);
        let err = read_attributes(&mut reader, &pool(), AttributeLocation::Field).unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn test_parameter_annotations_only_on_methods() {
        let bytes = [0, 1, 0, 4, 0, 0, 0, 3, 1, 0, 0];
        let pool = pool();

        let mut reader = ByteReader::new(&bytes);
        let on_method = read_attributes(&mut reader, &pool, AttributeLocation::Method).unwrap();
        assert_eq!(
            on_method[0].body,
            AttributeBody::ParameterAnnotations(vec![Vec::new()])
        );

        let mut reader = ByteReader::new(&bytes);
        let on_field = read_attributes(&mut reader, &pool, AttributeLocation::Field).unwrap();
        assert_eq!(on_field[0].body, AttributeBody::Opaque(vec![1, 0, 0]));
    }

    #[test]
    fn test_attribute_name_must_be_utf8() {
        let bytes = [0, 1, 0, 9, 0, 0, 0, 0];
        let mut reader = ByteReader::new(&bytes);
        let err = read_attributes(&mut reader, &pool(), AttributeLocation::Class).unwrap_err();
        assert!(matches!(err, Error::MalformedClassFile { offset: 2, .. }));
    }
}
