use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AddonError {
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("invalid version number '{0}'")]
    InvalidVersionFormat(String),

    #[error("missing <requires> section in {}", .0.display())]
    MissingRequiresSection(PathBuf),

    #[error("missing root attribute '{attribute}' in {}", path.display())]
    MissingAttribute { path: PathBuf, attribute: &'static str },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("TOML deserialization error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AddonError>;
