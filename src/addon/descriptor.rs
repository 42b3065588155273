use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::metadata::{Metadata, METADATA_POINT};
use super::version::AddonVersion;
use super::xml::{self, Attributes, Element};
use crate::config::ParserConfig;
use crate::error::{AddonError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonType {
    Skin,
    WebInterface,
    Scraper,
    Plugin,
    Script,
}

impl AddonType {
    /// Classify an addon from its extensions. The first extension that
    /// matches a rule decides; with no match the addon is a script.
    pub fn detect(addon_id: &str, extensions: &[Extension]) -> Self {
        extensions
            .iter()
            .filter_map(Extension::point)
            .find_map(|point| match point {
                "xbmc.gui.skin" => Some(AddonType::Skin),
                "xbmc.gui.webinterface" => Some(AddonType::WebInterface),
                p if p.starts_with("xbmc.metadata.scraper") => Some(AddonType::Scraper),
                "xbmc.python.pluginsource" if !addon_id.starts_with("script") => {
                    Some(AddonType::Plugin)
                }
                _ => None,
            })
            .unwrap_or(AddonType::Script)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddonType::Skin => "skin",
            AddonType::WebInterface => "webinterface",
            AddonType::Scraper => "scraper",
            AddonType::Plugin => "plugin",
            AddonType::Script => "script",
        }
    }
}

impl fmt::Display for AddonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One child of `<requires>`, attributes kept as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dependency(Attributes);

impl Dependency {
    pub fn attributes(&self) -> &Attributes {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn addon(&self) -> Option<&str> {
        self.get("addon")
    }

    /// Minimum version, if declared.
    pub fn version(&self) -> Result<Option<AddonVersion>> {
        self.get("version").map(AddonVersion::parse).transpose()
    }

    pub fn is_optional(&self) -> bool {
        self.get("optional") == Some("true")
    }
}

/// An `<extension>` element's attributes plus its `provides` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Extension(Attributes);

impl Extension {
    fn from_element(element: &Element) -> Self {
        let mut attributes = element.attributes.clone();
        let provides = element
            .find("provides")
            .and_then(|p| p.text.clone())
            .unwrap_or_default();
        attributes.insert("provides".to_string(), provides);
        Extension(attributes)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn point(&self) -> Option<&str> {
        self.get("point")
    }

    pub fn provides(&self) -> &str {
        self.get("provides").unwrap_or_default()
    }
}

/// A parsed `addon.xml`.
#[derive(Debug, Clone, Serialize)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub version: AddonVersion,
    pub provider: Option<String>,
    pub addon_type: AddonType,
    pub dependencies: Vec<Dependency>,
    pub extensions: Vec<Extension>,
    pub metadata: Metadata,
}

impl Addon {
    /// Load the manifest of the addon in `addon_dir` with default options.
    pub fn load(addon_dir: &Path) -> Result<Self> {
        Self::load_with(addon_dir, &ParserConfig::default())
    }

    pub fn load_with(addon_dir: &Path, config: &ParserConfig) -> Result<Self> {
        let path = addon_dir.join(&config.manifest_name);
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AddonError::ManifestNotFound(path.clone()),
            _ => AddonError::IoError(e),
        })?;
        let content = xml::decode(&bytes).map_err(|e| AddonError::MalformedDocument {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, &path, config)
    }

    /// Parse manifest content already in memory.
    pub fn from_str(content: &str, config: &ParserConfig) -> Result<Self> {
        Self::parse(content, Path::new(&config.manifest_name), config)
    }

    fn parse(content: &str, path: &Path, config: &ParserConfig) -> Result<Self> {
        let root = xml::parse(content).map_err(|e| AddonError::MalformedDocument {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let required = |attribute: &'static str| -> Result<String> {
            root.attr(attribute)
                .map(str::to_string)
                .ok_or_else(|| AddonError::MissingAttribute {
                    path: path.to_path_buf(),
                    attribute,
                })
        };

        let id = required("id")?;
        let name = required("name")?;
        let version = AddonVersion::parse(&required("version")?)?;
        let provider = root.attr("provider-name").map(str::to_string);

        let dependencies = match root.find("requires") {
            Some(requires) => requires
                .children
                .iter()
                .map(|dep| Dependency(dep.attributes.clone()))
                .collect(),
            None if config.require_requires => {
                return Err(AddonError::MissingRequiresSection(PathBuf::from(path)));
            }
            None => {
                tracing::debug!("{}: no <requires> section", id);
                Vec::new()
            }
        };

        let mut extensions = Vec::new();
        let mut metadata = Metadata::new(&config.default_lang);
        for ext in root.iter("extension") {
            if ext.attr("point") == Some(METADATA_POINT) {
                metadata = Metadata::parse(ext, &config.default_lang);
            } else {
                extensions.push(Extension::from_element(ext));
            }
        }

        let addon_type = AddonType::detect(&id, &extensions);
        tracing::debug!("parsed {} {} ({})", id, version, addon_type);

        Ok(Addon {
            id,
            name,
            version,
            provider,
            addon_type,
            dependencies,
            extensions,
            metadata,
        })
    }

    pub fn is_broken(&self) -> bool {
        self.metadata.contains("broken")
    }

    /// Reason given in the `broken` metadata field.
    pub fn broken_reason(&self) -> Option<&str> {
        self.metadata.text("broken")
    }

    pub fn summary(&self, lang: &str) -> Option<&str> {
        self.metadata.localized("summary", lang)
    }

    pub fn description(&self, lang: &str) -> Option<&str> {
        self.metadata.localized("description", lang)
    }
}
