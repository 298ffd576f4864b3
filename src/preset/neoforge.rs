//! NeoForge preset.
//!
//! Same shape as the Forge preset with NeoForge's annotation and descriptor
//! name.

use super::ModMetadata;
use super::forge::mods_toml_rules;
use crate::{Modification, Result};

/// Descriptor of NeoForge's `@Mod` annotation.
pub const MOD_ANNOTATION: &str = "Lnet/neoforged/fml/common/Mod;";
/// NeoForge's mod descriptor.
pub const MODS_TOML: &str = "META-INF/neoforge.mods.toml";

/// Returns the NeoForge modifications for `metadata`.
pub fn modifications(metadata: &ModMetadata) -> Result<Vec<Modification>> {
    Ok(vec![
        Modification::annotation_value(MOD_ANNOTATION, "value", metadata.id.as_str()),
        Modification::line_rules(MODS_TOML, mods_toml_rules(metadata)),
    ])
}
