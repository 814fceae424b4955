//! Package identification - WHAT package (name + version + source).
//!
//! A package's identity is the `(name, version, source)` triple. Inside a
//! [`BuildGraph`](crate::core::BuildGraph) it is referred to by a cheap
//! [`PackageId`] handle.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::ArtifactKind;

/// Handle to a package registered in a build graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub(crate) u32);

impl PackageId {
    pub(crate) fn new(index: usize) -> Self {
        PackageId(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package#{}", self.0)
    }
}

/// Where a package's source comes from.
///
/// Displayed and parsed as `kind+location`, e.g. `path+vendor/zlib`,
/// `git+https://example.com/repo#abc123`, `registry+default`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceOrigin {
    /// Local filesystem path
    Path(PathBuf),
    /// Git repository, optionally pinned to a revision
    Git { url: String, rev: Option<String> },
    /// Package registry
    Registry(String),
}

impl Default for SourceOrigin {
    fn default() -> Self {
        SourceOrigin::Registry("default".to_string())
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOrigin::Path(path) => write!(f, "path+{}", path.display()),
            SourceOrigin::Git { url, rev: Some(rev) } => write!(f, "git+{}#{}", url, rev),
            SourceOrigin::Git { url, rev: None } => write!(f, "git+{}", url),
            SourceOrigin::Registry(name) => write!(f, "registry+{}", name),
        }
    }
}

impl FromStr for SourceOrigin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, location) = s
            .split_once('+')
            .ok_or_else(|| anyhow::anyhow!("invalid source `{}`: missing kind prefix", s))?;

        if location.is_empty() {
            bail!("invalid source `{}`: empty location", s);
        }

        match kind {
            "path" => Ok(SourceOrigin::Path(PathBuf::from(location))),
            "git" => {
                let (url, rev) = match location.rsplit_once('#') {
                    Some((url, rev)) => (url.to_string(), Some(rev.to_string())),
                    None => (location.to_string(), None),
                };
                Ok(SourceOrigin::Git { url, rev })
            }
            "registry" => Ok(SourceOrigin::Registry(location.to_string())),
            _ => bail!("unknown source kind: {}", kind),
        }
    }
}

impl Serialize for SourceOrigin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceOrigin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The identity of a package. Unique within a resolved graph.
///
/// Ordering is lexicographic by name, then version, then source; this is
/// the order used for every deterministic tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub name: String,
    pub version: Version,
    pub source: SourceOrigin,
}

impl PackageKey {
    /// Get a display string like "name v1.2.3"
    pub fn display_name(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.source)
    }
}

/// A fully resolved package as handed over by the manifest parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub key: PackageKey,

    /// Artifacts this package builds. Dependents link the first link
    /// boundary among them, or the first artifact if there is none.
    pub kinds: Vec<ArtifactKind>,
}

impl PackageSpec {
    /// A registry package producing a single paired artifact.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        PackageSpec {
            key: PackageKey {
                name: name.into(),
                version,
                source: SourceOrigin::default(),
            },
            kinds: vec![ArtifactKind::Paired],
        }
    }

    pub fn with_source(mut self, source: SourceOrigin) -> Self {
        self.key.source = source;
        self
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ArtifactKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Shorthand for a package with one artifact of the given kind.
    pub fn with_kind(self, kind: ArtifactKind) -> Self {
        self.with_kinds([kind])
    }
}
