use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::addon::metadata::DEFAULT_LANG;
use crate::error::{AddonError, Result};

/// Options controlling how manifests are located and read.
#[derive(Debug, Deserialize, Clone)]
pub struct ParserConfig {
    /// Manifest filename inside a package directory.
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    /// Treat a manifest without `<requires>` as an error. When false the
    /// addon simply has no dependencies.
    #[serde(default = "default_true")]
    pub require_requires: bool,
    /// Language key for localized metadata that carries no `lang` attribute.
    #[serde(default = "default_lang")]
    pub default_lang: String,
}

fn default_manifest_name() -> String {
    "addon.xml".to_string()
}
fn default_true() -> bool {
    true
}
fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            manifest_name: default_manifest_name(),
            require_requires: true,
            default_lang: default_lang(),
        }
    }
}

impl ParserConfig {
    /// Load from a TOML file. A missing file (or no path) gives the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(config_path) = path.map(PathBuf::from) else {
            return Ok(Self::default());
        };

        if !config_path.exists() {
            tracing::debug!("config {} not found, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            AddonError::ConfigError(format!("failed to read {}: {}", config_path.display(), e))
        })?;
        content.parse()
    }
}

impl FromStr for ParserConfig {
    type Err = AddonError;

    fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.manifest_name.is_empty() {
            return Err(AddonError::ConfigError(
                "manifest_name must not be empty".to_string(),
            ));
        }
        if config.default_lang.is_empty() {
            return Err(AddonError::ConfigError(
                "default_lang must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::from_str("").unwrap();
        assert_eq!(config.manifest_name, "addon.xml");
        assert!(config.require_requires);
        assert_eq!(config.default_lang, "en");
    }

    #[test]
    fn test_partial_override() {
        let config = ParserConfig::from_str("require_requires = false\n").unwrap();
        assert!(!config.require_requires);
        assert_eq!(config.manifest_name, "addon.xml");
    }

    #[test]
    fn test_invalid_values() {
        assert!(ParserConfig::from_str("manifest_name = \"\"").is_err());
        assert!(matches!(
            ParserConfig::from_str("require_requires = \"yes\""),
            Err(AddonError::TomlError(_))
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ParserConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.manifest_name, "addon.xml");
        assert!(ParserConfig::load(None).unwrap().require_requires);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addonpr.toml");
        std::fs::write(&path, "default_lang = \"de\"\nmanifest_name = \"package.xml\"\n").unwrap();
        let config = ParserConfig::load(Some(&path)).unwrap();
        assert_eq!(config.default_lang, "de");
        assert_eq!(config.manifest_name, "package.xml");
    }
}
