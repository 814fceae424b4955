//! Artifact definitions - what a package compiles into.
//!
//! An Artifact is one build output of a package: a static archive, a
//! dynamic library, or a matched pair of both built from the same objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::PackageId;

/// The kind of output an artifact produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Static archive only (.a / .lib)
    #[serde(alias = "static", alias = "staticlib")]
    StaticOnly,

    /// Dynamic library only (.so / .dylib / .dll)
    #[serde(alias = "dynamic", alias = "sharedlib", alias = "dylib")]
    DynamicOnly,

    /// Static archive and dynamic library from the same compiled units
    #[serde(alias = "both")]
    Paired,
}

impl Default for ArtifactKind {
    fn default() -> Self {
        ArtifactKind::Paired
    }
}

impl ArtifactKind {
    /// Whether this artifact is a link boundary (emits a dynamic library).
    ///
    /// Duplicated code below a link boundary is merely recompiled; once two
    /// boundaries carrying the same code meet in one link, symbols clash.
    pub fn is_link_boundary(&self) -> bool {
        matches!(self, ArtifactKind::DynamicOnly | ArtifactKind::Paired)
    }

    /// Whether a static archive is produced.
    pub fn has_static_archive(&self) -> bool {
        matches!(self, ArtifactKind::StaticOnly | ArtifactKind::Paired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::StaticOnly => "static-only",
            ArtifactKind::DynamicOnly => "dynamic-only",
            ArtifactKind::Paired => "paired",
        }
    }

    /// File name of the output dependents link against.
    ///
    /// Paired artifacts expose their dynamic library; the static archive
    /// stays available through [`ArtifactKind::archive_filename`].
    pub fn link_filename(&self, name: &str, os: &str) -> String {
        if self.is_link_boundary() {
            dynamic_filename(name, os)
        } else {
            self.archive_filename(name, os)
        }
    }

    /// File name of the static archive for this artifact.
    pub fn archive_filename(&self, name: &str, os: &str) -> String {
        let name = sanitize(name);
        if os == "windows" {
            format!("{}.lib", name)
        } else {
            format!("lib{}.a", name)
        }
    }
}

fn dynamic_filename(name: &str, os: &str) -> String {
    let name = sanitize(name);
    match os {
        "windows" => format!("{}.dll", name),
        "macos" => format!("lib{}.dylib", name),
        _ => format!("lib{}.so", name),
    }
}

/// Library names cannot carry dashes on every platform.
fn sanitize(name: &str) -> String {
    name.replace('-', "_")
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static-only" | "static" | "staticlib" => Ok(ArtifactKind::StaticOnly),
            "dynamic-only" | "dynamic" | "sharedlib" | "dylib" => Ok(ArtifactKind::DynamicOnly),
            "paired" | "both" => Ok(ArtifactKind::Paired),
            _ => Err(format!(
                "unknown artifact kind `{}` (expected static-only, dynamic-only or paired)",
                s
            )),
        }
    }
}

/// Handle to an artifact registered in a [`BuildGraph`](crate::core::BuildGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub(crate) u32);

impl ArtifactId {
    pub(crate) fn new(index: usize) -> Self {
        ArtifactId(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact#{}", self.0)
    }
}

/// A build output of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub package: PackageId,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn is_link_boundary(&self) -> bool {
        self.kind.is_link_boundary()
    }
}
