//! Test fixtures for common graph shapes.
//!
//! This module provides a small builder for naming packages in tests and
//! pre-built graphs for the scenarios the passes care about.

use std::collections::BTreeMap;

use semver::Version;

use crate::core::{ArtifactId, ArtifactKind, BuildGraph, PackageId, PackageSpec};

/// Builds a graph where every package is version 1.0.0 and addressed by name.
#[derive(Debug, Default)]
pub struct GraphFixture {
    pub graph: BuildGraph,
    names: BTreeMap<String, PackageId>,
}

impl GraphFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package with a single artifact.
    pub fn package(mut self, name: &str, kind: ArtifactKind) -> Self {
        let id = self
            .graph
            .add_package(PackageSpec::new(name, Version::new(1, 0, 0)).with_kind(kind))
            .unwrap();
        self.names.insert(name.to_string(), id);
        self
    }

    pub fn paired(self, name: &str) -> Self {
        self.package(name, ArtifactKind::Paired)
    }

    pub fn dynamic(self, name: &str) -> Self {
        self.package(name, ArtifactKind::DynamicOnly)
    }

    pub fn static_only(self, name: &str) -> Self {
        self.package(name, ArtifactKind::StaticOnly)
    }

    /// `from` depends on each of `to`, in order.
    pub fn dep(mut self, from: &str, to: &[&str]) -> Self {
        let from = self.id(from);
        for name in to {
            let to = self.id(name);
            self.graph.add_dependency(from, to).unwrap();
        }
        self
    }

    pub fn foundation(mut self, name: &str) -> Self {
        let art = self.art(name);
        self.graph.set_foundation(art).unwrap();
        self
    }

    pub fn id(&self, name: &str) -> PackageId {
        self.names[name]
    }

    /// Primary artifact of the named package.
    pub fn art(&self, name: &str) -> ArtifactId {
        self.graph.primary_artifact(self.id(name)).unwrap()
    }

    pub fn build(self) -> BuildGraph {
        self.graph
    }
}

/// ArtA and ArtB each embed LeafX; DownstreamD links both; Core is the
/// designated foundation but nothing depends on it yet.
pub fn sibling_diamond() -> GraphFixture {
    GraphFixture::new()
        .paired("core")
        .static_only("leafx")
        .paired("arta")
        .paired("artb")
        .dynamic("downstreamd")
        .dep("arta", &["leafx"])
        .dep("artb", &["leafx"])
        .dep("downstreamd", &["arta", "artb"])
        .foundation("core")
}

/// Like [`sibling_diamond`] but both siblings already share a `hub`
/// link boundary.
pub fn hub_diamond() -> GraphFixture {
    GraphFixture::new()
        .paired("hub")
        .static_only("leafx")
        .paired("arta")
        .paired("artb")
        .dynamic("app")
        .dep("arta", &["hub", "leafx"])
        .dep("artb", &["hub", "leafx"])
        .dep("app", &["arta", "artb"])
}

/// A diamond-free layered graph: every static package sits under exactly
/// one link boundary.
pub fn layered_without_diamonds() -> GraphFixture {
    GraphFixture::new()
        .static_only("zlib")
        .static_only("png")
        .paired("image")
        .static_only("json")
        .paired("config")
        .dynamic("app")
        .dep("png", &["zlib"])
        .dep("image", &["png"])
        .dep("config", &["json"])
        .dep("app", &["image", "config"])
}
