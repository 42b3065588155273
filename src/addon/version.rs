use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{AddonError, Result};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").unwrap());

/// Addon version number: `major.minor` or `major.minor.patch`.
///
/// Two-component versions are accepted for older addons but keep their
/// arity, so they render back as `major.minor`. For ordering and equality
/// a missing patch counts as `0`.
#[derive(Debug, Clone)]
pub struct AddonVersion {
    major: u64,
    minor: u64,
    patch: Option<u64>,
}

impl AddonVersion {
    pub fn parse(s: &str) -> Result<Self> {
        let caps = VERSION_RE
            .captures(s)
            .ok_or_else(|| AddonError::InvalidVersionFormat(s.to_string()))?;

        let component = |i: usize| -> Result<Option<u64>> {
            caps.get(i)
                .map(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map_err(|_| AddonError::InvalidVersionFormat(s.to_string()))
                })
                .transpose()
        };

        let major = component(1)?.unwrap_or_default();
        let minor = component(2)?.unwrap_or_default();
        let patch = component(3)?;

        if patch.is_none() {
            tracing::warn!("accepting legacy two-component version \"{}\"", s);
        }

        Ok(AddonVersion { major, minor, patch })
    }

    /// The stored components, two or three of them.
    pub fn components(&self) -> Vec<u64> {
        let mut parts = vec![self.major, self.minor];
        parts.extend(self.patch);
        parts
    }

    pub fn is_legacy(&self) -> bool {
        self.patch.is_none()
    }

    /// Compare against a raw version string, parsing it first.
    pub fn compare_str(&self, other: &str) -> Result<Ordering> {
        Ok(self.cmp(&AddonVersion::parse(other)?))
    }

    fn key(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl FromStr for AddonVersion {
    type Err = AddonError;

    fn from_str(s: &str) -> Result<Self> {
        AddonVersion::parse(s)
    }
}

impl Ord for AddonVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for AddonVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for AddonVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for AddonVersion {}

impl Hash for AddonVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

// An unparseable string never equals a version.
impl PartialEq<str> for AddonVersion {
    fn eq(&self, other: &str) -> bool {
        matches!(self.compare_str(other), Ok(Ordering::Equal))
    }
}

impl PartialEq<&str> for AddonVersion {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for AddonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}

impl Serialize for AddonVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
