//! Annotation structures as stored inside annotation attributes.

use super::pool::{Constant, ConstantPool};
use super::reader::ByteReader;
use super::writer::ByteWriter;
use crate::Result;

/// Nesting limit for annotation and array values.
const MAX_DEPTH: usize = 64;

/// One annotation instance: a type descriptor and its element-value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Utf8 index of the field descriptor of the annotation type.
    pub type_index: u16,
    /// Element-value pairs in declaration order.
    pub elements: Vec<ElementValuePair>,
}

/// A named element of an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    /// Utf8 index of the element name.
    pub name_index: u16,
    /// The element's value.
    pub value: ElementValue,
}

/// The tag of a constant element value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstTag {
    /// `B`, stored as an Integer constant.
    Byte,
    /// `C`, stored as an Integer constant.
    Char,
    /// `D`, stored as a Double constant.
    Double,
    /// `F`, stored as a Float constant.
    Float,
    /// `I`, stored as an Integer constant.
    Int,
    /// `J`, stored as a Long constant.
    Long,
    /// `S`, stored as an Integer constant.
    Short,
    /// `Z`, stored as an Integer constant.
    Boolean,
    /// `s`, stored directly as a Utf8 constant.
    String,
}

impl ConstTag {
    /// Maps a tag byte to a constant tag.
    pub fn from_byte(tag: u8) -> Option<Self> {
        Some(match tag {
            b'B' => ConstTag::Byte,
            b'C' => ConstTag::Char,
            b'D' => ConstTag::Double,
            b'F' => ConstTag::Float,
            b'I' => ConstTag::Int,
            b'J' => ConstTag::Long,
            b'S' => ConstTag::Short,
            b'Z' => ConstTag::Boolean,
            b's' => ConstTag::String,
            _ => return None,
        })
    }

    /// Returns the tag byte.
    pub fn as_byte(self) -> u8 {
        match self {
            ConstTag::Byte => b'B',
            ConstTag::Char => b'C',
            ConstTag::Double => b'D',
            ConstTag::Float => b'F',
            ConstTag::Int => b'I',
            ConstTag::Long => b'J',
            ConstTag::Short => b'S',
            ConstTag::Boolean => b'Z',
            ConstTag::String => b's',
        }
    }

    /// Returns `true` if `constant` is the pool kind this tag points at.
    pub fn accepts(self, constant: &Constant) -> bool {
        match self {
            ConstTag::Byte
            | ConstTag::Char
            | ConstTag::Int
            | ConstTag::Short
            | ConstTag::Boolean => matches!(constant, Constant::Integer(_)),
            ConstTag::Double => matches!(constant, Constant::Double(_)),
            ConstTag::Float => matches!(constant, Constant::Float(_)),
            ConstTag::Long => matches!(constant, Constant::Long(_)),
            ConstTag::String => matches!(constant, Constant::Utf8(_)),
        }
    }
}

/// The value of an annotation element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// A primitive or string constant.
    Const {
        /// Which kind of constant.
        tag: ConstTag,
        /// Pool index of the constant.
        index: u16,
    },
    /// An enum constant.
    Enum {
        /// Utf8 index of the enum type descriptor.
        type_name_index: u16,
        /// Utf8 index of the constant's simple name.
        const_name_index: u16,
    },
    /// A class literal.
    Class {
        /// Utf8 index of the return descriptor.
        class_info_index: u16,
    },
    /// A nested annotation.
    Annotation(Annotation),
    /// An array of values.
    Array(Vec<ElementValue>),
}

impl Annotation {
    pub(crate) fn read(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Self> {
        Self::read_nested(reader, pool, 0)
    }

    fn read_nested(reader: &mut ByteReader<'_>, pool: &ConstantPool, depth: usize) -> Result<Self> {
        let type_index = read_utf8_index(reader, pool, "annotation type")?;
        let count = reader.u16("element count")?;
        let mut elements = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = read_utf8_index(reader, pool, "element name")?;
            let value = ElementValue::read(reader, pool, depth)?;
            elements.push(ElementValuePair { name_index, value });
        }
        Ok(Annotation {
            type_index,
            elements,
        })
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.u16(self.type_index);
        writer.count(self.elements.len(), "element-value pair")?;
        for pair in &self.elements {
            writer.u16(pair.name_index);
            pair.value.write(writer)?;
        }
        Ok(())
    }

    /// Returns the pairs whose name resolves to `name` in `pool`.
    pub fn elements_named<'a>(
        &'a self,
        pool: &'a ConstantPool,
        name: &'a [u8],
    ) -> impl Iterator<Item = &'a ElementValuePair> + 'a {
        self.elements
            .iter()
            .filter(move |pair| pool.utf8(pair.name_index) == Some(name))
    }
}

impl ElementValue {
    fn read(reader: &mut ByteReader<'_>, pool: &ConstantPool, depth: usize) -> Result<Self> {
        if depth >= MAX_DEPTH {
            return Err(reader.error("element values nested too deeply"));
        }

        let tag_offset = reader.offset();
        let tag = reader.u8("element value tag")?;
        if let Some(const_tag) = ConstTag::from_byte(tag) {
            let index_offset = reader.offset();
            let index = reader.u16("constant value index")?;
            let resolves = pool.get(index).is_some_and(|c| const_tag.accepts(c));
            if !resolves {
                return Err(crate::Error::malformed_class(
                    index_offset,
                    format!(
                        "element value '{}' points at unsuitable constant #{}",
                        tag as char, index
                    ),
                ));
            }
            return Ok(ElementValue::Const {
                tag: const_tag,
                index,
            });
        }

        Ok(match tag {
            b'e' => ElementValue::Enum {
                type_name_index: read_utf8_index(reader, pool, "enum type")?,
                const_name_index: read_utf8_index(reader, pool, "enum constant")?,
            },
            b'c' => ElementValue::Class {
                class_info_index: read_utf8_index(reader, pool, "class literal")?,
            },
            b'@' => ElementValue::Annotation(Annotation::read_nested(reader, pool, depth + 1)?),
            b'[' => {
                let count = reader.u16("array length")?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(ElementValue::read(reader, pool, depth + 1)?);
                }
                ElementValue::Array(values)
            }
            other => {
                return Err(crate::Error::malformed_class(
                    tag_offset,
                    format!("unknown element value tag {:#04x}", other),
                ));
            }
        })
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        match self {
            ElementValue::Const { tag, index } => {
                writer.u8(tag.as_byte());
                writer.u16(*index);
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                writer.u8(b'e');
                writer.u16(*type_name_index);
                writer.u16(*const_name_index);
            }
            ElementValue::Class { class_info_index } => {
                writer.u8(b'c');
                writer.u16(*class_info_index);
            }
            ElementValue::Annotation(annotation) => {
                writer.u8(b'@');
                annotation.write(writer)?;
            }
            ElementValue::Array(values) => {
                writer.u8(b'[');
                writer.count(values.len(), "array element")?;
                for value in values {
                    value.write(writer)?;
                }
            }
        }
        Ok(())
    }
}

/// Reads a `u2` index that must name a Utf8 constant.
pub(crate) fn read_utf8_index(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    what: &str,
) -> Result<u16> {
    let offset = reader.offset();
    let index = reader.u16(what)?;
    if pool.utf8(index).is_none() {
        return Err(crate::Error::malformed_class(
            offset,
            format!("{} index #{} is not a Utf8 constant", what, index),
        ));
    }
    Ok(index)
}
