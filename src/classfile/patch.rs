//! Overwriting one element of an annotation in place.

use super::annotation::{Annotation, ConstTag, ElementValue, ElementValuePair};
use super::attribute::{Attribute, AttributeBody};
use super::mutf8;
use super::pool::{Constant, ConstantPool};
use super::ClassFile;
use crate::{Error, Result};

/// A value that can be written into, or read back from, an annotation
/// element.
///
/// Only the scalar kinds, class literals and enum constants can be written.
/// [`AnnotationValue::Array`] and [`AnnotationValue::Annotation`] are produced
/// by [`read_annotation_element`] but rejected by the patcher.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// A `String` constant.
    String(String),
    /// An `int` constant.
    Int(i32),
    /// A `boolean` constant.
    Boolean(bool),
    /// A `byte` constant.
    Byte(i8),
    /// A `char` constant as a UTF-16 code unit.
    Char(u16),
    /// A `short` constant.
    Short(i16),
    /// A `long` constant.
    Long(i64),
    /// A `float` constant.
    Float(f32),
    /// A `double` constant.
    Double(f64),
    /// A class literal, given as a return descriptor such as `Ljava/lang/String;` or `V`.
    Class(String),
    /// An enum constant.
    Enum {
        /// Field descriptor of the enum type.
        type_descriptor: String,
        /// Simple name of the constant.
        const_name: String,
    },
    /// An array of values.
    Array(Vec<AnnotationValue>),
    /// A nested annotation.
    Annotation {
        /// Field descriptor of the annotation type.
        type_descriptor: String,
        /// Element names and values.
        elements: Vec<(String, AnnotationValue)>,
    },
}

impl AnnotationValue {
    /// Returns a short name for the kind of value.
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationValue::String(_) => "string",
            AnnotationValue::Int(_) => "int",
            AnnotationValue::Boolean(_) => "boolean",
            AnnotationValue::Byte(_) => "byte",
            AnnotationValue::Char(_) => "char",
            AnnotationValue::Short(_) => "short",
            AnnotationValue::Long(_) => "long",
            AnnotationValue::Float(_) => "float",
            AnnotationValue::Double(_) => "double",
            AnnotationValue::Class(_) => "class",
            AnnotationValue::Enum { .. } => "enum",
            AnnotationValue::Array(_) => "array",
            AnnotationValue::Annotation { .. } => "annotation",
        }
    }

    /// Returns `true` if the patcher can write this value.
    pub fn is_writable(&self) -> bool {
        !matches!(
            self,
            AnnotationValue::Array(_) | AnnotationValue::Annotation { .. }
        )
    }

    /// Adds the constants this value needs to `pool` and returns the element
    /// value referring to them.
    fn intern(&self, pool: &mut ConstantPool) -> Result<ElementValue> {
        let constant = |tag, index| ElementValue::Const { tag, index };
        Ok(match self {
            AnnotationValue::String(s) => constant(ConstTag::String, pool.intern_utf8(s)?),
            AnnotationValue::Int(v) => constant(ConstTag::Int, pool.intern(Constant::Integer(*v))?),
            AnnotationValue::Boolean(v) => constant(
                ConstTag::Boolean,
                pool.intern(Constant::Integer(i32::from(*v)))?,
            ),
            AnnotationValue::Byte(v) => {
                constant(ConstTag::Byte, pool.intern(Constant::Integer(i32::from(*v)))?)
            }
            AnnotationValue::Char(v) => {
                constant(ConstTag::Char, pool.intern(Constant::Integer(i32::from(*v)))?)
            }
            AnnotationValue::Short(v) => {
                constant(ConstTag::Short, pool.intern(Constant::Integer(i32::from(*v)))?)
            }
            AnnotationValue::Long(v) => constant(ConstTag::Long, pool.intern(Constant::Long(*v))?),
            AnnotationValue::Float(v) => {
                constant(ConstTag::Float, pool.intern(Constant::Float(v.to_bits()))?)
            }
            AnnotationValue::Double(v) => {
                constant(ConstTag::Double, pool.intern(Constant::Double(v.to_bits()))?)
            }
            AnnotationValue::Class(descriptor) => ElementValue::Class {
                class_info_index: pool.intern_utf8(descriptor)?,
            },
            AnnotationValue::Enum {
                type_descriptor,
                const_name,
            } => ElementValue::Enum {
                type_name_index: pool.intern_utf8(type_descriptor)?,
                const_name_index: pool.intern_utf8(const_name)?,
            },
            AnnotationValue::Array(_) | AnnotationValue::Annotation { .. } => {
                return Err(Error::UnsupportedAnnotationValueKind { kind: self.kind() });
            }
        })
    }

    fn decode(value: &ElementValue, pool: &ConstantPool) -> Option<Self> {
        Some(match value {
            ElementValue::Const { tag, index } => {
                let constant = pool.get(*index)?;
                match (tag, constant) {
                    (ConstTag::String, Constant::Utf8(bytes)) => {
                        AnnotationValue::String(mutf8::decode(bytes)?)
                    }
                    (ConstTag::Int, Constant::Integer(v)) => AnnotationValue::Int(*v),
                    (ConstTag::Boolean, Constant::Integer(v)) => AnnotationValue::Boolean(*v != 0),
                    (ConstTag::Byte, Constant::Integer(v)) => AnnotationValue::Byte(*v as i8),
                    (ConstTag::Char, Constant::Integer(v)) => AnnotationValue::Char(*v as u16),
                    (ConstTag::Short, Constant::Integer(v)) => AnnotationValue::Short(*v as i16),
                    (ConstTag::Long, Constant::Long(v)) => AnnotationValue::Long(*v),
                    (ConstTag::Float, Constant::Float(bits)) => {
                        AnnotationValue::Float(f32::from_bits(*bits))
                    }
                    (ConstTag::Double, Constant::Double(bits)) => {
                        AnnotationValue::Double(f64::from_bits(*bits))
                    }
                    _ => return None,
                }
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => AnnotationValue::Enum {
                type_descriptor: pool.utf8_str(*type_name_index)?,
                const_name: pool.utf8_str(*const_name_index)?,
            },
            ElementValue::Class { class_info_index } => {
                AnnotationValue::Class(pool.utf8_str(*class_info_index)?)
            }
            ElementValue::Annotation(annotation) => AnnotationValue::Annotation {
                type_descriptor: pool.utf8_str(annotation.type_index)?,
                elements: annotation
                    .elements
                    .iter()
                    .map(|pair| {
                        Some((
                            pool.utf8_str(pair.name_index)?,
                            AnnotationValue::decode(&pair.value, pool)?,
                        ))
                    })
                    .collect::<Option<Vec<_>>>()?,
            },
            ElementValue::Array(values) => AnnotationValue::Array(
                values
                    .iter()
                    .map(|v| AnnotationValue::decode(v, pool))
                    .collect::<Option<Vec<_>>>()?,
            ),
        })
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::String(value)
    }
}

impl From<i32> for AnnotationValue {
    fn from(value: i32) -> Self {
        AnnotationValue::Int(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Boolean(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Long(value)
    }
}

impl From<f32> for AnnotationValue {
    fn from(value: f32) -> Self {
        AnnotationValue::Float(value)
    }
}

impl From<f64> for AnnotationValue {
    fn from(value: f64) -> Self {
        AnnotationValue::Double(value)
    }
}

/// What a call to [`patch_annotation_element`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Annotations whose type matched the descriptor.
    pub annotations_matched: usize,
    /// Existing element-value pairs that were overwritten.
    pub elements_replaced: usize,
    /// Element-value pairs that were appended.
    pub elements_added: usize,
}

impl PatchOutcome {
    /// Returns `true` if the class was changed.
    pub fn is_modified(&self) -> bool {
        self.elements_replaced + self.elements_added > 0
    }
}

/// Overwrites `element_name` in every annotation of type `type_descriptor`.
///
/// Annotations are searched on the class, its fields and methods, method
/// parameters, record components, and inside nested annotation values. In a
/// matching annotation every pair named `element_name` receives the new value;
/// if there is none, a pair is appended. Constants are interned, so patching
/// a class twice with the same value produces identical bytes.
///
/// A class with no matching annotation is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAnnotationValueKind`] for array and annotation
/// values, and [`Error::ConstantPoolOverflow`] if the new constants do not
/// fit.
pub fn patch_annotation_element(
    mut class: ClassFile,
    type_descriptor: &str,
    element_name: &str,
    value: &AnnotationValue,
) -> Result<(ClassFile, PatchOutcome)> {
    if !value.is_writable() {
        return Err(Error::UnsupportedAnnotationValueKind { kind: value.kind() });
    }

    let ClassFile {
        constant_pool,
        fields,
        methods,
        attributes,
        ..
    } = &mut class;

    let mut patcher = Patcher {
        pool: constant_pool,
        descriptor: mutf8::encode(type_descriptor),
        element_name: mutf8::encode(element_name),
        element_name_str: element_name,
        value,
        interned: None,
        outcome: PatchOutcome::default(),
    };

    patcher.attributes(attributes)?;
    for member in fields.iter_mut().chain(methods.iter_mut()) {
        patcher.attributes(&mut member.attributes)?;
    }

    let outcome = patcher.outcome;
    if outcome.annotations_matched > 0 {
        log::debug!(
            "set '{}' in {} {} annotation(s)",
            element_name,
            outcome.annotations_matched,
            type_descriptor
        );
    }
    Ok((class, outcome))
}

struct Patcher<'a> {
    pool: &'a mut ConstantPool,
    descriptor: Vec<u8>,
    element_name: Vec<u8>,
    element_name_str: &'a str,
    value: &'a AnnotationValue,
    /// Interned on the first match so an unmatched class keeps its pool.
    interned: Option<ElementValue>,
    outcome: PatchOutcome,
}

impl Patcher<'_> {
    fn attributes(&mut self, attributes: &mut [Attribute]) -> Result<()> {
        for attribute in attributes {
            match &mut attribute.body {
                AttributeBody::Annotations(annotations) => {
                    for annotation in annotations {
                        self.annotation(annotation)?;
                    }
                }
                AttributeBody::ParameterAnnotations(parameters) => {
                    for annotation in parameters.iter_mut().flatten() {
                        self.annotation(annotation)?;
                    }
                }
                AttributeBody::Record(components) => {
                    for component in components {
                        self.attributes(&mut component.attributes)?;
                    }
                }
                AttributeBody::Opaque(_) => {}
            }
        }
        Ok(())
    }

    fn annotation(&mut self, annotation: &mut Annotation) -> Result<()> {
        let matched = self.pool.utf8(annotation.type_index) == Some(&self.descriptor[..]);

        for pair in &mut annotation.elements {
            if matched && self.is_target(pair) {
                continue;
            }
            self.element_value(&mut pair.value)?;
        }

        if !matched {
            return Ok(());
        }
        self.outcome.annotations_matched += 1;

        let new_value = self.interned_value()?;
        let mut replaced = 0;
        for pair in &mut annotation.elements {
            if self.is_target(pair) {
                pair.value = new_value.clone();
                replaced += 1;
            }
        }

        if replaced == 0 {
            let name_index = self.pool.intern_utf8(self.element_name_str)?;
            annotation.elements.push(ElementValuePair {
                name_index,
                value: new_value,
            });
            self.outcome.elements_added += 1;
        } else {
            self.outcome.elements_replaced += replaced;
        }
        Ok(())
    }

    fn element_value(&mut self, value: &mut ElementValue) -> Result<()> {
        match value {
            ElementValue::Annotation(nested) => self.annotation(nested),
            ElementValue::Array(values) => {
                for value in values {
                    self.element_value(value)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn is_target(&self, pair: &ElementValuePair) -> bool {
        self.pool.utf8(pair.name_index) == Some(&self.element_name[..])
    }

    fn interned_value(&mut self) -> Result<ElementValue> {
        if let Some(value) = &self.interned {
            return Ok(value.clone());
        }
        let value = self.value.intern(self.pool)?;
        self.interned = Some(value.clone());
        Ok(value)
    }
}

/// Returns the value of `element_name` in the first annotation of type
/// `type_descriptor`, searching in the same order as the patcher.
///
/// Returns `None` if no such annotation or element exists, or if the
/// element's constants do not decode.
pub fn read_annotation_element(
    class: &ClassFile,
    type_descriptor: &str,
    element_name: &str,
) -> Option<AnnotationValue> {
    let descriptor = mutf8::encode(type_descriptor);
    let name = mutf8::encode(element_name);
    let pool = &class.constant_pool;

    std::iter::once(&class.attributes)
        .chain(class.fields.iter().map(|m| &m.attributes))
        .chain(class.methods.iter().map(|m| &m.attributes))
        .find_map(|attributes| find_in_attributes(attributes, pool, &descriptor, &name))
}

fn find_in_attributes(
    attributes: &[Attribute],
    pool: &ConstantPool,
    descriptor: &[u8],
    name: &[u8],
) -> Option<AnnotationValue> {
    attributes.iter().find_map(|attribute| match &attribute.body {
        AttributeBody::Annotations(annotations) => annotations
            .iter()
            .find_map(|a| find_in_annotation(a, pool, descriptor, name)),
        AttributeBody::ParameterAnnotations(parameters) => parameters
            .iter()
            .flatten()
            .find_map(|a| find_in_annotation(a, pool, descriptor, name)),
        AttributeBody::Record(components) => components
            .iter()
            .find_map(|c| find_in_attributes(&c.attributes, pool, descriptor, name)),
        AttributeBody::Opaque(_) => None,
    })
}

fn find_in_annotation(
    annotation: &Annotation,
    pool: &ConstantPool,
    descriptor: &[u8],
    name: &[u8],
) -> Option<AnnotationValue> {
    if pool.utf8(annotation.type_index) == Some(descriptor) {
        if let Some(pair) = annotation.elements_named(pool, name).next() {
            return AnnotationValue::decode(&pair.value, pool);
        }
    }
    annotation
        .elements
        .iter()
        .find_map(|pair| find_in_value(&pair.value, pool, descriptor, name))
}

fn find_in_value(
    value: &ElementValue,
    pool: &ConstantPool,
    descriptor: &[u8],
    name: &[u8],
) -> Option<AnnotationValue> {
    match value {
        ElementValue::Annotation(nested) => find_in_annotation(nested, pool, descriptor, name),
        ElementValue::Array(values) => values
            .iter()
            .find_map(|v| find_in_value(v, pool, descriptor, name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{Member, serialize};

    const MOD: &str = "Lfoo/Mod;";

    /// A class whose only attribute is `@Lfoo/Mod;(value = "old")`.
    fn annotated_class() -> ClassFile {
        let mut pool = ConstantPool::new();
        let name = pool.intern_utf8("A").unwrap();
        let this_class = pool.push(Constant::Class(name)).unwrap();
        let attr_name = pool.intern_utf8("RuntimeVisibleAnnotations").unwrap();
        let type_index = pool.intern_utf8(MOD).unwrap();
        let value_name = pool.intern_utf8("value").unwrap();
        let old = pool.intern_utf8("old").unwrap();

        ClassFile {
            minor_version: 0,
            major_version: 52,
            constant_pool: pool,
            access_flags: 0x21,
            this_class,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: vec![Attribute {
                name_index: attr_name,
                body: AttributeBody::Annotations(vec![Annotation {
                    type_index,
                    elements: vec![ElementValuePair {
                        name_index: value_name,
                        value: ElementValue::Const {
                            tag: ConstTag::String,
                            index: old,
                        },
                    }],
                }]),
            }],
        }
    }

    #[test]
    fn test_replace_string_value() {
        let (class, outcome) =
            patch_annotation_element(annotated_class(), MOD, "value", &"new".into()).unwrap();
        assert_eq!(outcome.annotations_matched, 1);
        assert_eq!(outcome.elements_replaced, 1);
        assert!(outcome.is_modified());
        assert_eq!(
            read_annotation_element(&class, MOD, "value"),
            Some(AnnotationValue::String("new".into()))
        );
    }

    #[test]
    fn test_no_match_leaves_class_unchanged() {
        let original = annotated_class();
        let (class, outcome) =
            patch_annotation_element(original.clone(), "Lbar/Other;", "value", &"x".into())
                .unwrap();
        assert!(!outcome.is_modified());
        assert_eq!(class, original);
    }

    #[test]
    fn test_missing_element_is_appended() {
        let (class, outcome) =
            patch_annotation_element(annotated_class(), MOD, "priority", &7.into()).unwrap();
        assert_eq!(outcome.elements_added, 1);
        assert_eq!(
            read_annotation_element(&class, MOD, "priority"),
            Some(AnnotationValue::Int(7))
        );
        assert_eq!(
            read_annotation_element(&class, MOD, "value"),
            Some(AnnotationValue::String("old".into()))
        );
    }

    #[test]
    fn test_existing_constant_is_reused() {
        let before = annotated_class().constant_pool.slot_count();
        let (class, _) =
            patch_annotation_element(annotated_class(), MOD, "value", &"A".into()).unwrap();
        assert_eq!(class.constant_pool.slot_count(), before);
    }

    #[test]
    fn test_patch_is_idempotent() {
        let value = AnnotationValue::Long(1 << 40);
        let (once, _) = patch_annotation_element(annotated_class(), MOD, "value", &value).unwrap();
        let once_bytes = serialize(&once).unwrap();
        let (twice, _) = patch_annotation_element(once, MOD, "value", &value).unwrap();
        assert_eq!(serialize(&twice).unwrap(), once_bytes);
    }

    #[test]
    fn test_array_value_rejected() {
        let original = annotated_class();
        let err = patch_annotation_element(
            original,
            MOD,
            "value",
            &AnnotationValue::Array(vec![AnnotationValue::Int(1)]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedAnnotationValueKind { kind: "array" }
        ));
    }

    #[test]
    fn test_enum_and_class_values() {
        let value = AnnotationValue::Enum {
            type_descriptor: "Lfoo/Side;".into(),
            const_name: "CLIENT".into(),
        };
        let (class, _) = patch_annotation_element(annotated_class(), MOD, "value", &value).unwrap();
        assert_eq!(read_annotation_element(&class, MOD, "value"), Some(value));

        let value = AnnotationValue::Class("Ljava/lang/String;".into());
        let (class, _) = patch_annotation_element(class, MOD, "value", &value).unwrap();
        assert_eq!(read_annotation_element(&class, MOD, "value"), Some(value));
    }

    #[test]
    fn test_field_and_parameter_annotations() {
        let mut class = annotated_class();
        let annotations = class.attributes[0].clone();
        let param_name = class
            .constant_pool
            .intern_utf8("RuntimeInvisibleParameterAnnotations")
            .unwrap();
        let member_name = class.constant_pool.intern_utf8("run").unwrap();
        let descriptor = class.constant_pool.intern_utf8("(I)V").unwrap();
        let AttributeBody::Annotations(list) = annotations.body.clone() else {
            unreachable!()
        };

        class.fields.push(Member {
            access_flags: 0,
            name_index: member_name,
            descriptor_index: descriptor,
            attributes: vec![annotations],
        });
        class.methods.push(Member {
            access_flags: 0,
            name_index: member_name,
            descriptor_index: descriptor,
            attributes: vec![Attribute {
                name_index: param_name,
                body: AttributeBody::ParameterAnnotations(vec![list]),
            }],
        });

        let (_, outcome) = patch_annotation_element(class, MOD, "value", &true.into()).unwrap();
        assert_eq!(outcome.annotations_matched, 3);
        assert_eq!(outcome.elements_replaced, 3);
    }

    #[test]
    fn test_nested_annotation_is_patched() {
        let mut class = annotated_class();
        let outer_type = class.constant_pool.intern_utf8("Lfoo/Outer;").unwrap();
        let inner_name = class.constant_pool.intern_utf8("inner").unwrap();
        let AttributeBody::Annotations(list) = &mut class.attributes[0].body else {
            unreachable!()
        };
        let inner = list.remove(0);
        list.push(Annotation {
            type_index: outer_type,
            elements: vec![ElementValuePair {
                name_index: inner_name,
                value: ElementValue::Array(vec![ElementValue::Annotation(inner)]),
            }],
        });

        let (class, outcome) =
            patch_annotation_element(class, MOD, "value", &"deep".into()).unwrap();
        assert_eq!(outcome.elements_replaced, 1);
        assert_eq!(
            read_annotation_element(&class, MOD, "value"),
            Some(AnnotationValue::String("deep".into()))
        );
    }
}
