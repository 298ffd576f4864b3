//! Patching annotation elements inside class-file entries.

use super::{EntryMatcher, EntryModification};
use crate::Result;
use crate::classfile::{self, AnnotationValue};

/// File suffix of compiled classes.
pub const CLASS_SUFFIX: &str = ".class";

/// Sets one element of an annotation in every class file it applies to.
///
/// Class files without a matching annotation are passed through with their
/// original bytes.
#[derive(Debug, Clone)]
pub struct AnnotationValueModification {
    matcher: EntryMatcher,
    type_descriptor: String,
    element_name: String,
    value: AnnotationValue,
}

impl AnnotationValueModification {
    /// Creates a modification applying to all `.class` entries.
    pub fn new(
        type_descriptor: impl Into<String>,
        element_name: impl Into<String>,
        value: impl Into<AnnotationValue>,
    ) -> Self {
        Self {
            matcher: EntryMatcher::suffix(CLASS_SUFFIX),
            type_descriptor: type_descriptor.into(),
            element_name: element_name.into(),
            value: value.into(),
        }
    }

    /// Restricts the entries this modification applies to.
    pub fn with_matcher(mut self, matcher: impl Into<EntryMatcher>) -> Self {
        self.matcher = matcher.into();
        self
    }

    /// Returns the annotation type descriptor.
    pub fn type_descriptor(&self) -> &str {
        &self.type_descriptor
    }

    /// Returns the element name.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Returns the value written.
    pub fn value(&self) -> &AnnotationValue {
        &self.value
    }
}

impl EntryModification for AnnotationValueModification {
    fn applies_to(&self, entry_name: &str) -> bool {
        self.matcher.matches(entry_name)
    }

    fn transform_content(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        let class = classfile::parse(&data)?;
        let (class, outcome) = classfile::patch_annotation_element(
            class,
            &self.type_descriptor,
            &self.element_name,
            &self.value,
        )?;
        if !outcome.is_modified() {
            return Ok(data);
        }
        classfile::serialize(&class)
    }
}
