//! The class-file constant pool.
//!
//! The pool is 1-indexed. `CONSTANT_Long` and `CONSTANT_Double` occupy two
//! slots; the second slot is modeled explicitly as [`Constant::Unusable`] so
//! that positions in the backing vector always line up with pool indices.

use super::mutf8;
use super::reader::ByteReader;
use super::writer::ByteWriter;
use crate::{Error, Result};

/// Largest number of usable slots; the `u2` count stores `slots + 1`.
const MAX_SLOTS: usize = u16::MAX as usize - 1;

/// A single constant-pool entry.
///
/// Floating-point constants keep their raw IEEE 754 bits so that parsing and
/// re-serializing never changes a NaN payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// `CONSTANT_Utf8`, stored as raw modified UTF-8.
    Utf8(Vec<u8>),
    /// `CONSTANT_Integer`.
    Integer(i32),
    /// `CONSTANT_Float` as raw bits.
    Float(u32),
    /// `CONSTANT_Long`.
    Long(i64),
    /// `CONSTANT_Double` as raw bits.
    Double(u64),
    /// `CONSTANT_Class` pointing at a Utf8 name.
    Class(u16),
    /// `CONSTANT_String` pointing at a Utf8 value.
    String(u16),
    /// `CONSTANT_Fieldref`.
    FieldRef {
        /// Owning class.
        class: u16,
        /// Name and type.
        name_and_type: u16,
    },
    /// `CONSTANT_Methodref`.
    MethodRef {
        /// Owning class.
        class: u16,
        /// Name and type.
        name_and_type: u16,
    },
    /// `CONSTANT_InterfaceMethodref`.
    InterfaceMethodRef {
        /// Owning interface.
        class: u16,
        /// Name and type.
        name_and_type: u16,
    },
    /// `CONSTANT_NameAndType`.
    NameAndType {
        /// Utf8 name.
        name: u16,
        /// Utf8 descriptor.
        descriptor: u16,
    },
    /// `CONSTANT_MethodHandle`.
    MethodHandle {
        /// Reference kind (1 to 9).
        kind: u8,
        /// Referenced member.
        reference: u16,
    },
    /// `CONSTANT_MethodType` pointing at a Utf8 descriptor.
    MethodType(u16),
    /// `CONSTANT_Dynamic`.
    Dynamic {
        /// Index into the `BootstrapMethods` attribute.
        bootstrap_method: u16,
        /// Name and type.
        name_and_type: u16,
    },
    /// `CONSTANT_InvokeDynamic`.
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute.
        bootstrap_method: u16,
        /// Name and type.
        name_and_type: u16,
    },
    /// `CONSTANT_Module` pointing at a Utf8 name.
    Module(u16),
    /// `CONSTANT_Package` pointing at a Utf8 name.
    Package(u16),
    /// The slot following a Long or Double.
    Unusable,
}

impl Constant {
    /// Returns the tag byte used in the class-file encoding.
    ///
    /// [`Constant::Unusable`] has no encoding and returns `None`.
    pub fn tag(&self) -> Option<u8> {
        Some(match self {
            Constant::Utf8(_) => 1,
            Constant::Integer(_) => 3,
            Constant::Float(_) => 4,
            Constant::Long(_) => 5,
            Constant::Double(_) => 6,
            Constant::Class(_) => 7,
            Constant::String(_) => 8,
            Constant::FieldRef { .. } => 9,
            Constant::MethodRef { .. } => 10,
            Constant::InterfaceMethodRef { .. } => 11,
            Constant::NameAndType { .. } => 12,
            Constant::MethodHandle { .. } => 15,
            Constant::MethodType(_) => 16,
            Constant::Dynamic { .. } => 17,
            Constant::InvokeDynamic { .. } => 18,
            Constant::Module(_) => 19,
            Constant::Package(_) => 20,
            Constant::Unusable => return None,
        })
    }

    /// Returns `true` for the two-slot constants.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let tag_offset = reader.offset();
        let tag = reader.u8("constant tag")?;
        Ok(match tag {
            1 => {
                let length = reader.u16("Utf8 length")? as usize;
                Constant::Utf8(reader.bytes(length, "Utf8 bytes")?.to_vec())
            }
            3 => Constant::Integer(reader.u32("Integer")? as i32),
            4 => Constant::Float(reader.u32("Float")?),
            5 => Constant::Long(reader.u64("Long")? as i64),
            6 => Constant::Double(reader.u64("Double")?),
            7 => Constant::Class(reader.u16("Class name")?),
            8 => Constant::String(reader.u16("String value")?),
            9 => Constant::FieldRef {
                class: reader.u16("Fieldref class")?,
                name_and_type: reader.u16("Fieldref name and type")?,
            },
            10 => Constant::MethodRef {
                class: reader.u16("Methodref class")?,
                name_and_type: reader.u16("Methodref name and type")?,
            },
            11 => Constant::InterfaceMethodRef {
                class: reader.u16("InterfaceMethodref class")?,
                name_and_type: reader.u16("InterfaceMethodref name and type")?,
            },
            12 => Constant::NameAndType {
                name: reader.u16("NameAndType name")?,
                descriptor: reader.u16("NameAndType descriptor")?,
            },
            15 => Constant::MethodHandle {
                kind: reader.u8("MethodHandle kind")?,
                reference: reader.u16("MethodHandle reference")?,
            },
            16 => Constant::MethodType(reader.u16("MethodType descriptor")?),
            17 => Constant::Dynamic {
                bootstrap_method: reader.u16("Dynamic bootstrap method")?,
                name_and_type: reader.u16("Dynamic name and type")?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: reader.u16("InvokeDynamic bootstrap method")?,
                name_and_type: reader.u16("InvokeDynamic name and type")?,
            },
            19 => Constant::Module(reader.u16("Module name")?),
            20 => Constant::Package(reader.u16("Package name")?),
            other => {
                return Err(Error::malformed_class(
                    tag_offset,
                    format!("unknown constant tag {}", other),
                ));
            }
        })
    }

    fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        let Some(tag) = self.tag() else {
            return Ok(());
        };
        writer.u8(tag);
        match self {
            Constant::Utf8(bytes) => {
                writer.count(bytes.len(), "Utf8 byte")?;
                writer.bytes(bytes);
            }
            Constant::Integer(value) => writer.u32(*value as u32),
            Constant::Float(bits) => writer.u32(*bits),
            Constant::Long(value) => writer.u64(*value as u64),
            Constant::Double(bits) => writer.u64(*bits),
            Constant::Class(index)
            | Constant::String(index)
            | Constant::MethodType(index)
            | Constant::Module(index)
            | Constant::Package(index) => writer.u16(*index),
            Constant::FieldRef {
                class,
                name_and_type,
            }
            | Constant::MethodRef {
                class,
                name_and_type,
            }
            | Constant::InterfaceMethodRef {
                class,
                name_and_type,
            } => {
                writer.u16(*class);
                writer.u16(*name_and_type);
            }
            Constant::NameAndType { name, descriptor } => {
                writer.u16(*name);
                writer.u16(*descriptor);
            }
            Constant::MethodHandle { kind, reference } => {
                writer.u8(*kind);
                writer.u16(*reference);
            }
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            }
            | Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                writer.u16(*bootstrap_method);
                writer.u16(*name_and_type);
            }
            Constant::Unusable => {}
        }
        Ok(())
    }
}

/// An append-friendly, 1-indexed constant pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    /// `entries[i]` holds pool index `i + 1`.
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of occupied slots (the class-file count minus one).
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool holds no constants.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the constant at a 1-based index.
    ///
    /// Index 0 and the unusable second slot of a wide constant yield `None`.
    pub fn get(&self, index: u16) -> Option<&Constant> {
        let slot = (index as usize).checked_sub(1)?;
        match self.entries.get(slot)? {
            Constant::Unusable => None,
            constant => Some(constant),
        }
    }

    /// Returns the raw bytes of a Utf8 constant.
    pub fn utf8(&self, index: u16) -> Option<&[u8]> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns a Utf8 constant decoded to a Rust string.
    pub fn utf8_str(&self, index: u16) -> Option<String> {
        mutf8::decode(self.utf8(index)?)
    }

    /// Returns the internal name referenced by a Class constant.
    pub fn class_name(&self, index: u16) -> Option<String> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8_str(*name),
            _ => None,
        }
    }

    /// Iterates over `(index, constant)` pairs, skipping unusable slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(slot, c)| ((slot + 1) as u16, c))
    }

    /// Returns the first index holding a constant equal to `constant`.
    pub fn find(&self, constant: &Constant) -> Option<u16> {
        self.iter()
            .find(|(_, existing)| *existing == constant)
            .map(|(index, _)| index)
    }

    /// Returns every index whose Utf8 bytes equal `bytes`.
    pub fn utf8_indices(&self, bytes: &[u8]) -> Vec<u16> {
        self.iter()
            .filter_map(|(index, c)| match c {
                Constant::Utf8(existing) if existing == bytes => Some(index),
                _ => None,
            })
            .collect()
    }

    /// Appends a constant and returns its 1-based index.
    ///
    /// Wide constants also reserve the following slot.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        if matches!(constant, Constant::Unusable) {
            return Err(Error::malformed_class(0, "cannot append an unusable slot"));
        }
        let needed = self.entries.len() + if constant.is_wide() { 2 } else { 1 };
        if needed > MAX_SLOTS {
            return Err(Error::ConstantPoolOverflow { slots: needed });
        }

        let index = (self.entries.len() + 1) as u16;
        let wide = constant.is_wide();
        self.entries.push(constant);
        if wide {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }

    /// Returns the index of an equal constant, appending it if absent.
    pub fn intern(&mut self, constant: Constant) -> Result<u16> {
        if let Some(index) = self.find(&constant) {
            log::trace!("reusing constant #{} for {:?}", index, constant);
            return Ok(index);
        }
        let index = self.push(constant)?;
        log::trace!("appended constant #{}", index);
        Ok(index)
    }

    /// Interns a string as a Utf8 constant.
    pub fn intern_utf8(&mut self, value: &str) -> Result<u16> {
        self.intern(Constant::Utf8(mutf8::encode(value)))
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let count = reader.u16("constant pool count")? as usize;
        if count == 0 {
            return Err(reader.error("constant pool count must be at least 1"));
        }

        let mut pool = ConstantPool {
            entries: Vec::with_capacity(count - 1),
        };
        while pool.entries.len() + 1 < count {
            let offset = reader.offset();
            let constant = Constant::read(reader)?;
            let wide = constant.is_wide();
            if wide && pool.entries.len() + 2 > count - 1 {
                return Err(Error::malformed_class(
                    offset,
                    "wide constant occupies the last pool slot",
                ));
            }
            pool.entries.push(constant);
            if wide {
                pool.entries.push(Constant::Unusable);
            }
        }
        Ok(pool)
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.count(self.entries.len() + 1, "constant pool")?;
        for constant in &self.entries {
            constant.write(writer)?;
        }
        Ok(())
    }
}
