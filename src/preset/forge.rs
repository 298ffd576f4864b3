//! Forge preset.
//!
//! Sets the `@Mod` annotation's value to the mod id and rewrites
//! `META-INF/mods.toml` line by line. Rewriting by line keeps comments and
//! layout of the template descriptor intact.

use super::{Environment, ModMetadata};
use crate::modification::LineRule;
use crate::{Modification, Result};

/// Descriptor of Forge's `@Mod` annotation.
pub const MOD_ANNOTATION: &str = "Lnet/minecraftforge/fml/common/Mod;";
/// Forge's mod descriptor.
pub const MODS_TOML: &str = "META-INF/mods.toml";

/// Returns the Forge modifications for `metadata`.
pub fn modifications(metadata: &ModMetadata) -> Result<Vec<Modification>> {
    Ok(vec![
        Modification::annotation_value(MOD_ANNOTATION, "value", metadata.id.as_str()),
        Modification::line_rules(MODS_TOML, mods_toml_rules(metadata)),
    ])
}

/// Line rules shared by the Forge and NeoForge `mods.toml` descriptors.
///
/// Rules for optional metadata are only produced when the value is set.
pub fn mods_toml_rules(metadata: &ModMetadata) -> Vec<LineRule> {
    let mut rules = Vec::new();
    let assign = |key: &str, value: &str| {
        LineRule::new(format!("{}=", key), format!("{}={}", key, quoted(value)))
    };

    if let Some(license) = &metadata.license {
        rules.push(assign("license", license));
    }
    if let Some(issues) = &metadata.issues_url {
        rules.push(assign("issueTrackerURL", issues));
    }
    rules.push(LineRule::new(
        format!("modId={}", quoted(&metadata.template_id)),
        format!("modId={}", quoted(&metadata.id)),
    ));
    rules.push(assign("version", &metadata.version));
    rules.push(assign("displayName", &metadata.name));
    if let Some(homepage) = &metadata.homepage_url {
        rules.push(assign("displayURL", homepage));
    }
    rules.push(assign("logoFile", &metadata.icon_path()));
    rules.push(assign("authors", &metadata.authors.join(",")));
    rules.push(assign("displayTest", "MATCH_VERSION"));
    rules.push(assign("description", &metadata.description));
    rules.push(LineRule::new(
        format!("[[dependencies.{}]]", metadata.template_id),
        format!("[[dependencies.{}]]", metadata.id),
    ));
    rules.push(assign(
        "side",
        match metadata.environment {
            Environment::Both => "BOTH",
            Environment::Client => "CLIENT",
            Environment::Server => "SERVER",
        },
    ));
    rules
}

/// Renders a TOML basic string.
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
