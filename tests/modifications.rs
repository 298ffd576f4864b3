//! Integration tests for the individual modification kinds.

mod common;

use common::{mod_annotated_class, plain_class};
use jarmod::classfile::{self, AnnotationValue, read_annotation_element};
use jarmod::{
    AnnotationValueModification, ArchiveEntry, DocumentFormat, EntryMatcher, EntryModification,
    Error, Indent, JsonFormat, KeyOrder, LineRule, Modification, PlainTextModification,
    RenameModification, StructuredTextModification, TomlFormat, apply_line_rules,
};
use serde_json::json;

fn apply_all(modifications: &[Modification], entry: ArchiveEntry) -> jarmod::Result<ArchiveEntry> {
    let original = entry.name.clone();
    modifications
        .iter()
        .filter(|m| m.applies_to(&original))
        .try_fold(entry, |entry, m| m.apply(entry))
}

// =============================================================================
// Matchers
// =============================================================================

#[test]
fn test_matchers() {
    let any = EntryMatcher::Any;
    assert!(any.matches(""));
    assert!(any.matches("a/b/c"));

    let exact: EntryMatcher = "fabric.mod.json".into();
    assert!(exact.matches("fabric.mod.json"));
    assert!(!exact.matches("x/fabric.mod.json"));

    let suffix = EntryMatcher::suffix(".class");
    assert!(suffix.matches("a/B.class"));
    assert!(!suffix.matches("a/B.classx"));

    let regex = EntryMatcher::regex(r"assets/[^/]+/lang/.*\.json").unwrap();
    assert!(regex.matches("assets/mymod/lang/en_us.json"));
    assert!(!regex.matches("data/assets/mymod/lang/en_us.json"));

    let predicate = EntryMatcher::predicate(|name| name.starts_with("META-INF/"));
    assert!(predicate.matches("META-INF/MANIFEST.MF"));
    assert!(!predicate.matches("A.class"));
}

#[test]
fn test_invalid_regex() {
    match EntryMatcher::regex("(unclosed") {
        Err(Error::InvalidRegex { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
        other => panic!("Expected InvalidRegex, got: {:?}", other),
    }
    assert!(matches!(
        Modification::rename("[", "x"),
        Err(Error::InvalidRegex { .. })
    ));
}

// =============================================================================
// Annotation values
// =============================================================================

#[test]
fn test_annotation_modification_patches_class() {
    let m = Modification::annotation_value("Lfoo/Mod;", "value", "mymod");
    let entry = m
        .apply(ArchiveEntry::new("A.class", mod_annotated_class()))
        .unwrap();
    assert_eq!(entry.name, "A.class");

    let class = classfile::parse(&entry.data).unwrap();
    assert_eq!(
        read_annotation_element(&class, "Lfoo/Mod;", "value"),
        Some(AnnotationValue::String("mymod".to_string()))
    );
}

#[test]
fn test_annotation_modification_returns_input_when_unmatched() {
    let bytes = plain_class("B");
    let m = AnnotationValueModification::new("Lfoo/Mod;", "value", 3);
    assert_eq!(m.transform_content(bytes.clone()).unwrap(), bytes);
}

#[test]
fn test_annotation_modification_on_non_class() {
    let m = Modification::annotation_value("Lfoo/Mod;", "value", "x");
    let err = m
        .apply(ArchiveEntry::new("Broken.class", b"\xCA\xFE".to_vec()))
        .unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_annotation_modification_unsupported_value() {
    let m = AnnotationValueModification::new(
        "Lfoo/Mod;",
        "value",
        AnnotationValue::Array(Vec::new()),
    );
    let err = m.transform_content(mod_annotated_class()).unwrap_err();
    assert!(err.is_unsupported());
}

// =============================================================================
// Renames
// =============================================================================

#[test]
fn test_rename_with_capture_groups() {
    let m = RenameModification::new(r"fabric\.(mixins|refmap)\.json", "mymod.$1.json").unwrap();
    assert!(m.applies_to("fabric.refmap.json"));
    assert!(!m.applies_to("nested/fabric.refmap.json"));
    assert_eq!(m.rename_entry("fabric.mixins.json").unwrap(), "mymod.mixins.json");
    assert!(!m.rewrites_content());
}

#[test]
fn test_rename_keeps_content() {
    let m = Modification::rename(r"(.*)\.accesswidener", "mymod.accesswidener").unwrap();
    let entry = m
        .apply(ArchiveEntry::new("fabric.accesswidener", b"accessWidener v2 named".to_vec()))
        .unwrap();
    assert_eq!(
        entry,
        ArchiveEntry::new("mymod.accesswidener", b"accessWidener v2 named".to_vec())
    );
}

#[test]
fn test_rename_of_non_matching_name() {
    let m = RenameModification::new(r"a\.txt", "b.txt").unwrap();
    match m.rename_entry("c.txt") {
        Err(Error::NoSuchRenameTarget {
            entry_name,
            pattern,
        }) => {
            assert_eq!(entry_name, "c.txt");
            assert_eq!(pattern, r"a\.txt");
        }
        other => panic!("Expected NoSuchRenameTarget, got: {:?}", other),
    }
}

// =============================================================================
// Structured text
// =============================================================================

#[test]
fn test_json_edit_then_rename() {
    let modifications = vec![
        Modification::json("fabric.mixins.json", |mut object| {
            object.insert("refmap".into(), json!("mymod.refmap.json"));
            Ok(object)
        }),
        Modification::rename(r"fabric\.mixins\.json", "mymod.mixins.json").unwrap(),
    ];
    let entry = apply_all(
        &modifications,
        ArchiveEntry::new("fabric.mixins.json", br#"{"package": "p"}"#.to_vec()),
    )
    .unwrap();
    assert_eq!(entry.name, "mymod.mixins.json");
    assert_eq!(
        String::from_utf8(entry.data).unwrap(),
        "{\n  \"package\": \"p\",\n  \"refmap\": \"mymod.refmap.json\"\n}"
    );
}

#[test]
fn test_json_formats() {
    let input = br#"{"b": [1], "a": {"d": true, "c": null}}"#.to_vec();
    let print = |format: JsonFormat| {
        let m = StructuredTextModification::json(EntryMatcher::Any, Ok, format);
        String::from_utf8(m.transform_content(input.clone()).unwrap()).unwrap()
    };

    assert_eq!(
        print(JsonFormat::new().indent(Indent::Compact)),
        r#"{"b":[1],"a":{"d":true,"c":null}}"#
    );
    assert_eq!(
        print(
            JsonFormat::new()
                .indent(Indent::Compact)
                .key_order(KeyOrder::Sorted)
        ),
        r#"{"a":{"c":null,"d":true},"b":[1]}"#
    );
    assert_eq!(
        print(JsonFormat::new().indent(Indent::Tab)),
        "{\n\t\"b\": [\n\t\t1\n\t],\n\t\"a\": {\n\t\t\"d\": true,\n\t\t\"c\": null\n\t}\n}"
    );
    assert!(
        print(JsonFormat::new().indent(Indent::Spaces(4)).trailing_newline(true))
            .ends_with("    }\n}\n")
    );
}

#[test]
fn test_json_edit_error_propagates() {
    let m = Modification::json("a.json", |_| {
        Err(Error::malformed_document(DocumentFormat::Json, "missing 'id'"))
    });
    match m.apply(ArchiveEntry::new("a.json", b"{}".to_vec())) {
        Err(Error::MalformedDocument { reason, .. }) => assert_eq!(reason, "missing 'id'"),
        other => panic!("Expected MalformedDocument, got: {:?}", other),
    }
}

#[test]
fn test_toml_edit() {
    let m = Modification::toml("META-INF/mods.toml", |mut table| {
        if let Some(toml::Value::Array(mods)) = table.get_mut("mods") {
            for entry in mods {
                if let Some(t) = entry.as_table_mut() {
                    t.insert("modId".into(), toml::Value::String("mymod".into()));
                }
            }
        }
        Ok(table)
    });
    let input = b"modLoader = \"javafml\"\n\n[[mods]]\nmodId = \"universal\"\nversion = \"1\"\n";
    let entry = m
        .apply(ArchiveEntry::new("META-INF/mods.toml", input.to_vec()))
        .unwrap();
    let table: toml::Table = toml::from_str(std::str::from_utf8(&entry.data).unwrap()).unwrap();
    assert_eq!(table["modLoader"].as_str(), Some("javafml"));
    assert_eq!(table["mods"][0]["modId"].as_str(), Some("mymod"));
    assert_eq!(table["mods"][0]["version"].as_str(), Some("1"));
}

#[test]
fn test_toml_pretty_arrays() {
    let m = StructuredTextModification::toml(
        EntryMatcher::Any,
        Ok,
        TomlFormat::new().pretty_arrays(true),
    );
    let out = m
        .transform_content(b"authors = [\"a\", \"b\"]\n".to_vec())
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("authors = [\n"), "{}", text);
    let table: toml::Table = toml::from_str(&text).unwrap();
    assert_eq!(table["authors"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_structured_default_matchers() {
    let json = StructuredTextModification::any_json(Ok);
    assert!(json.applies_to("data/x.json"));
    assert!(!json.applies_to("data/x.toml"));
    let toml = StructuredTextModification::any_toml(Ok);
    assert!(toml.applies_to("META-INF/mods.toml"));
    assert!(!toml.applies_to("pack.mcmeta"));
}

// =============================================================================
// Plain text
// =============================================================================

#[test]
fn test_plain_text_edit() {
    let m = PlainTextModification::any_text(|text| text.replace("universal", "mymod"));
    assert!(m.applies_to("README.txt"));
    assert!(!m.applies_to("README.md"));
    let out = m.transform_content(b"universal by nobody".to_vec()).unwrap();
    assert_eq!(out, b"mymod by nobody");
}

#[test]
fn test_plain_text_rejects_invalid_utf8() {
    let m = Modification::plain_text("a.txt", str::to_owned);
    match m.apply(ArchiveEntry::new("a.txt", vec![0xFF, 0xFE])) {
        Err(Error::MalformedDocument { format, .. }) => {
            assert_eq!(format, DocumentFormat::PlainText)
        }
        other => panic!("Expected MalformedDocument, got: {:?}", other),
    }
}

#[test]
fn test_line_rules() {
    let rules = vec![
        LineRule::new("displayName=", "displayName=\"My Mod\""),
        LineRule::new("version=", "version=\"1.0\""),
    ];
    assert_eq!(
        apply_line_rules("  displayName=\"X\"\nversionRange=\"[1,)\"\nversion=\"0\"", &rules),
        "displayName=\"My Mod\"\nversionRange=\"[1,)\"\nversion=\"1.0\"\n"
    );
    assert_eq!(apply_line_rules("", &rules), "\n");
    assert_eq!(apply_line_rules("a\n\n\n", &rules), "a\n");
}

#[test]
fn test_line_rules_modification() {
    let m = PlainTextModification::line_rules(
        "META-INF/mods.toml",
        vec![LineRule::new("modId=\"universal\"", "modId=\"mymod\"")],
    );
    assert_eq!(m.rules().map(<[LineRule]>::len), Some(1));
    let out = m
        .transform_content(b"[[mods]]\n  modId=\"universal\"\n".to_vec())
        .unwrap();
    assert_eq!(out, b"[[mods]]\nmodId=\"mymod\"\n");
}
