//! Fabric preset.
//!
//! Renames the mixin config, refmap and access widener to carry the mod id,
//! points the mixin config at the mod's package, rebuilds `fabric.mod.json`
//! and rewrites refmap keys from the template package to the mod's package.

use serde_json::{Map, Value, json};

use super::{Environment, ModMetadata};
use crate::modification::EntryMatcher;
use crate::{Modification, Result};

/// Mixin configuration of the template.
pub const MIXINS_JSON: &str = "fabric.mixins.json";
/// Mixin refmap of the template.
pub const REFMAP_JSON: &str = "fabric.refmap.json";
/// Access widener of the template.
pub const ACCESS_WIDENER: &str = "fabric.accesswidener";
/// Mod descriptor.
pub const MOD_JSON: &str = "fabric.mod.json";
/// Suffix identifying refmap files.
pub const REFMAP_SUFFIX: &str = "refmap.json";

type Object = Map<String, Value>;

/// Returns the Fabric modifications for `metadata`.
///
/// Content edits are listed before the renames of the same entries; every
/// modification is matched against the entry's original name.
pub fn modifications(metadata: &ModMetadata) -> Result<Vec<Modification>> {
    let mixins = metadata.clone();
    let descriptor = metadata.clone();
    let refmap = metadata.clone();

    Ok(vec![
        Modification::json(MIXINS_JSON, move |object| Ok(edit_mixins_json(&mixins, object))),
        Modification::json(MOD_JSON, move |object| Ok(edit_mod_json(&descriptor, object))),
        Modification::json(EntryMatcher::suffix(REFMAP_SUFFIX), move |object| {
            Ok(edit_refmap_json(&refmap, object))
        }),
        rename_literal(MIXINS_JSON, format!("{}.mixins.json", metadata.id))?,
        rename_literal(REFMAP_JSON, format!("{}.refmap.json", metadata.id))?,
        rename_literal(ACCESS_WIDENER, format!("{}.accesswidener", metadata.id))?,
    ])
}

fn rename_literal(name: &str, replacement: String) -> Result<Modification> {
    // `$` in a mod id must not be read as a capture reference.
    Modification::rename(&regex::escape(name), replacement.replace('$', "$$"))
}

/// Points the mixin config at the mod's package and refmap.
pub fn edit_mixins_json(metadata: &ModMetadata, mut object: Object) -> Object {
    object.insert(
        "package".into(),
        json!(format!("{}.fabric.mixin", metadata.group_id)),
    );
    object.insert(
        "refmap".into(),
        json!(format!("{}.refmap.json", metadata.id)),
    );
    object
}

/// Rebuilds `fabric.mod.json` with the mod's identity, in canonical key
/// order, keeping every key it does not set after the ones it does.
pub fn edit_mod_json(metadata: &ModMetadata, mut original: Object) -> Object {
    let mut ordered = Object::new();

    if let Some(schema) = original.remove("schemaVersion") {
        ordered.insert("schemaVersion".into(), schema);
    }
    ordered.insert("id".into(), json!(metadata.id));
    ordered.insert("version".into(), json!(metadata.version));
    ordered.insert("name".into(), json!(metadata.name));
    ordered.insert("description".into(), json!(metadata.description));
    ordered.insert("authors".into(), json!(metadata.authors));
    if let Some(contributors) = original.remove("contributors") {
        ordered.insert("contributors".into(), contributors);
    }

    let mut contact = take_object(&mut original, "contact");
    for (key, url) in [
        ("homepage", &metadata.homepage_url),
        ("issues", &metadata.issues_url),
        ("sources", &metadata.sources_url),
    ] {
        if let Some(url) = url {
            contact.insert(key.into(), json!(url));
        }
    }
    ordered.insert("contact".into(), Value::Object(contact));

    if let Some(license) = &metadata.license {
        ordered.insert("license".into(), json!(license));
    } else if let Some(license) = original.remove("license") {
        ordered.insert("license".into(), license);
    }
    ordered.insert("icon".into(), json!(metadata.icon_path()));
    ordered.insert(
        "environment".into(),
        json!(match metadata.environment {
            Environment::Both => "*",
            Environment::Client => "client",
            Environment::Server => "server",
        }),
    );

    let mut entrypoints = take_object(&mut original, "entrypoints");
    entrypoints.insert(
        "main".into(),
        json!([format!("{}.fabric.platform.FabricInitializer", metadata.group_id)]),
    );
    entrypoints.insert(
        "client".into(),
        json!([format!(
            "{}.fabric.platform.FabricClientInitializer",
            metadata.group_id
        )]),
    );
    ordered.insert("entrypoints".into(), Value::Object(entrypoints));

    if let Some(jars) = original.remove("jars") {
        ordered.insert("jars".into(), jars);
    }
    ordered.insert("mixins".into(), json!([format!("{}.mixins.json", metadata.id)]));
    ordered.insert(
        "accessWidener".into(),
        json!(format!("{}.accesswidener", metadata.id)),
    );

    for (key, value) in original {
        ordered.entry(key).or_insert(value);
    }
    ordered
}

/// Rewrites the template package to the mod's package in refmap keys.
///
/// Every occurrence is replaced in `mappings` keys; only the first in
/// `data."named:intermediary"` keys.
pub fn edit_refmap_json(metadata: &ModMetadata, mut object: Object) -> Object {
    let template = metadata.template_package.as_str();
    let group_path = metadata.group_path();

    if let Some(mappings) = object_mut(&mut object, "mappings") {
        rekey(mappings, |key| key.replace(template, &group_path));
    }
    if let Some(data) = object_mut(&mut object, "data") {
        if let Some(named) = object_mut(data, "named:intermediary") {
            rekey(named, |key| key.replacen(template, &group_path, 1));
        }
    }
    object
}

/// Removes `key` and returns it as an object, or an empty object if it is
/// absent or of another type.
fn take_object(object: &mut Object, key: &str) -> Object {
    match object.remove(key) {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            log::warn!("replacing non-object '{}' value {}", key, other);
            Object::new()
        }
        None => Object::new(),
    }
}

fn object_mut<'a>(object: &'a mut Object, key: &str) -> Option<&'a mut Object> {
    match object.get_mut(key) {
        Some(Value::Object(inner)) => Some(inner),
        Some(_) => {
            log::warn!("skipping '{}': not an object", key);
            None
        }
        None => None,
    }
}

fn rekey(object: &mut Object, rename: impl Fn(&str) -> String) {
    let entries = std::mem::take(object);
    for (key, value) in entries {
        object.insert(rename(&key), value);
    }
}
