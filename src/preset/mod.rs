//! Ready-made modification sets for retargeting a template mod archive.
//!
//! A template jar is built once under a placeholder identity (mod id
//! `universal`, package `dev/huskuraft/universal`). The presets here produce
//! the modifications that stamp a concrete [`ModMetadata`] onto that jar for
//! one loader platform.
//!
//! ```rust
//! use jarmod::preset::{ModMetadata, Platform};
//!
//! # fn main() -> jarmod::Result<()> {
//! let metadata = ModMetadata::new("mymod", "com.example.mymod", "1.0.0", "My Mod")
//!     .authors(["Alice"])
//!     .license("MIT");
//! let modifications = Platform::NeoForge.modifications(&metadata)?;
//! assert!(!modifications.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod fabric;
pub mod forge;
pub mod neoforge;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::DocumentFormat;
use crate::{Error, Modification, Result};

/// Mod id the template archive is built with.
pub const TEMPLATE_ID: &str = "universal";

/// Internal package path the template archive is built with.
pub const TEMPLATE_PACKAGE: &str = "dev/huskuraft/universal";

/// Which game sides a mod runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Client and dedicated server.
    #[default]
    Both,
    /// Client only.
    Client,
    /// Dedicated server only.
    Server,
}

/// Identity and descriptive data of the mod being produced.
///
/// Can be deserialized from TOML:
///
/// ```toml
/// id = "mymod"
/// group_id = "com.example.mymod"
/// version = "1.0.0"
/// name = "My Mod"
/// authors = ["Alice", "Bob"]
/// license = "MIT"
/// environment = "client"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModMetadata {
    /// Mod id, e.g. `mymod`.
    pub id: String,
    /// Java package of the mod, e.g. `com.example.mymod`.
    pub group_id: String,
    /// Mod version.
    pub version: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Authors in display order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// License identifier.
    #[serde(default)]
    pub license: Option<String>,
    /// Project homepage.
    #[serde(default)]
    pub homepage_url: Option<String>,
    /// Issue tracker.
    #[serde(default)]
    pub issues_url: Option<String>,
    /// Source repository.
    #[serde(default)]
    pub sources_url: Option<String>,
    /// Game sides.
    #[serde(default)]
    pub environment: Environment,
    /// Mod id used by the template archive.
    #[serde(default = "default_template_id")]
    pub template_id: String,
    /// Package path used by the template archive.
    #[serde(default = "default_template_package")]
    pub template_package: String,
}

fn default_template_id() -> String {
    TEMPLATE_ID.to_string()
}

fn default_template_package() -> String {
    TEMPLATE_PACKAGE.to_string()
}

impl ModMetadata {
    /// Creates metadata with the required fields; the rest are empty.
    pub fn new(
        id: impl Into<String>,
        group_id: impl Into<String>,
        version: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            version: version.into(),
            name: name.into(),
            description: String::new(),
            authors: Vec::new(),
            license: None,
            homepage_url: None,
            issues_url: None,
            sources_url: None,
            environment: Environment::default(),
            template_id: default_template_id(),
            template_package: default_template_package(),
        }
    }

    /// Parses metadata from a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::malformed_document(DocumentFormat::Toml, e.to_string()))
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the authors.
    pub fn authors<S: Into<String>>(mut self, authors: impl IntoIterator<Item = S>) -> Self {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the license.
    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// Sets the homepage, issue tracker and source URLs.
    pub fn urls(
        mut self,
        homepage: impl Into<String>,
        issues: impl Into<String>,
        sources: impl Into<String>,
    ) -> Self {
        self.homepage_url = Some(homepage.into());
        self.issues_url = Some(issues.into());
        self.sources_url = Some(sources.into());
        self
    }

    /// Sets the environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Returns the group id as an internal path, e.g. `com/example/mymod`.
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Returns the icon path inside the archive.
    pub fn icon_path(&self) -> String {
        format!("assets/{}/icon.png", self.id)
    }
}

/// A mod loader platform with a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Fabric.
    Fabric,
    /// Forge.
    Forge,
    /// NeoForge.
    NeoForge,
}

impl Platform {
    /// Returns the modifications retargeting a template archive for this
    /// platform.
    pub fn modifications(self, metadata: &ModMetadata) -> Result<Vec<Modification>> {
        match self {
            Platform::Fabric => fabric::modifications(metadata),
            Platform::Forge => forge::modifications(metadata),
            Platform::NeoForge => neoforge::modifications(metadata),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Fabric => write!(f, "fabric"),
            Platform::Forge => write!(f, "forge"),
            Platform::NeoForge => write!(f, "neoforge"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fabric" => Ok(Platform::Fabric),
            "forge" => Ok(Platform::Forge),
            "neoforge" => Ok(Platform::NeoForge),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}
