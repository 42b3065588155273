use std::collections::BTreeMap;

use serde::Serialize;

use super::xml::Element;

/// Extension point carrying the addon's descriptive metadata.
pub const METADATA_POINT: &str = "xbmc.addon.metadata";

pub const DEFAULT_LANG: &str = "en";

/// Metadata fields that are keyed by language.
pub const LOCALIZED_TAGS: [&str; 3] = ["summary", "description", "disclaimer"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Localized(BTreeMap<String, String>),
}

/// Fields of the `xbmc.addon.metadata` extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(flatten)]
    fields: BTreeMap<String, MetadataValue>,
    #[serde(skip)]
    default_lang: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata::new(DEFAULT_LANG)
    }
}

impl Metadata {
    pub fn new(default_lang: &str) -> Self {
        Metadata {
            fields: BTreeMap::new(),
            default_lang: default_lang.to_string(),
        }
    }

    /// Build metadata from the direct children of a metadata extension.
    ///
    /// Localized tags merge by language, with `default_lang` standing in for
    /// a missing `lang` attribute. Any other tag keeps the text of its last
    /// occurrence.
    pub fn parse(extension: &Element, default_lang: &str) -> Self {
        let mut metadata = Metadata::new(default_lang);
        for child in &extension.children {
            let text = child.text.clone().unwrap_or_default();
            if LOCALIZED_TAGS.contains(&child.tag.as_str()) {
                let lang = child.attr("lang").unwrap_or(default_lang).to_string();
                let entry = metadata
                    .fields
                    .entry(child.tag.clone())
                    .or_insert_with(|| MetadataValue::Localized(BTreeMap::new()));
                if let MetadataValue::Localized(langs) = entry {
                    langs.insert(lang, text);
                }
            } else {
                metadata.fields.insert(child.tag.clone(), MetadataValue::Text(text));
            }
        }
        metadata
    }

    pub fn get(&self, tag: &str) -> Option<&MetadataValue> {
        self.fields.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text of a plain (non-localized) field.
    pub fn text(&self, tag: &str) -> Option<&str> {
        match self.fields.get(tag)? {
            MetadataValue::Text(text) => Some(text),
            MetadataValue::Localized(_) => None,
        }
    }

    /// Localized text for `lang`, falling back to the default language.
    pub fn localized(&self, tag: &str, lang: &str) -> Option<&str> {
        match self.fields.get(tag)? {
            MetadataValue::Localized(langs) => langs
                .get(lang)
                .or_else(|| langs.get(&self.default_lang))
                .map(String::as_str),
            MetadataValue::Text(_) => None,
        }
    }
}
