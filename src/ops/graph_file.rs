//! Graph files - resolved package records on disk.
//!
//! A graph file stands in for the manifest parser: a fully
//! version-resolved list of packages, their artifact kinds, and their
//! dependencies.
//!
//! ```toml
//! foundation = "core"
//!
//! [[package]]
//! name = "leafx"
//! version = "1.0.0"
//! kinds = ["static-only"]
//!
//! [[package]]
//! name = "arta"
//! version = "1.0.0"
//! dependencies = ["leafx", "core@1.0.0"]
//!
//! [[package]]
//! name = "artb"
//! version = "1.0.0"
//! dependencies = [{ name = "zlib", source = "path+vendor/zlib" }]
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::{ArtifactKind, BuildGraph, GraphError, PackageId, PackageSpec, SourceOrigin};

/// Conventional graph file name.
pub const GRAPH_FILE_NAME: &str = "Linkgraph.toml";

/// Parsed graph file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphFile {
    /// Fallback ancestor package reference
    #[serde(default)]
    pub foundation: Option<String>,

    #[serde(default, rename = "package")]
    pub packages: Vec<PackageRecord>,
}

/// One resolved package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageRecord {
    pub name: String,
    pub version: Version,

    #[serde(default)]
    pub source: Option<SourceOrigin>,

    #[serde(default = "default_kinds")]
    pub kinds: Vec<ArtifactKind>,

    /// Dependencies in link order
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

/// A dependency as written in the graph file: `"name"`, `"name@version"`,
/// or a table that can also pin the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    Short(String),
    Detailed(PackageRef),
}

impl DependencyRef {
    pub fn to_package_ref(&self) -> Result<PackageRef> {
        match self {
            DependencyRef::Short(reference) => PackageRef::parse(reference),
            DependencyRef::Detailed(reference) => Ok(reference.clone()),
        }
    }
}

impl From<&str> for DependencyRef {
    fn from(reference: &str) -> Self {
        DependencyRef::Short(reference.to_string())
    }
}

/// Selects packages by name, optionally narrowed by version and source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceOrigin>,
}

impl PackageRef {
    /// Parse `name` or `name@version`.
    pub fn parse(reference: &str) -> Result<Self> {
        let (name, version) = match reference.split_once('@') {
            Some((name, version)) => {
                let version: Version = version.parse().with_context(|| {
                    format!("invalid version in package reference `{}`", reference)
                })?;
                (name, Some(version))
            }
            None => (reference, None),
        };

        Ok(PackageRef {
            name: name.to_string(),
            version,
            source: None,
        })
    }

    fn matches(&self, graph: &BuildGraph, id: PackageId) -> bool {
        let Some(key) = graph.package_key(id) else {
            return false;
        };
        self.version.as_ref().map_or(true, |v| &key.version == v)
            && self.source.as_ref().map_or(true, |s| &key.source == s)
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

fn default_kinds() -> Vec<ArtifactKind> {
    vec![ArtifactKind::Paired]
}

impl PackageRecord {
    fn spec(&self) -> PackageSpec {
        PackageSpec::new(&self.name, self.version.clone())
            .with_source(self.source.clone().unwrap_or_default())
            .with_kinds(self.kinds.iter().copied())
    }
}

impl GraphFile {
    /// Load a graph file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read graph file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse graph file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the graph these records describe.
    ///
    /// All packages are registered before any dependency is resolved, so
    /// records may appear in any order. `foundation` takes precedence over
    /// the file's own `foundation` key.
    pub fn build_graph(&self, foundation: Option<&str>) -> Result<BuildGraph> {
        let mut graph = BuildGraph::new();
        let mut ids = Vec::with_capacity(self.packages.len());

        for record in &self.packages {
            ids.push(graph.add_package(record.spec())?);
        }

        for (record, &from) in self.packages.iter().zip(&ids) {
            let requirer = format!("{} v{}", record.name, record.version);
            for dependency in &record.dependencies {
                let reference = dependency.to_package_ref()?;
                let to = resolve_package_ref(&graph, &reference, Some(&requirer))?;
                graph.add_dependency(from, to)?;
            }
        }

        if let Some(reference) = foundation.or(self.foundation.as_deref()) {
            let pkg = resolve_reference(&graph, reference, None)?;
            let artifact = graph.primary_artifact(pkg)?;
            graph.set_foundation(artifact)?;
        }

        tracing::debug!(
            "loaded {} package(s), {} artifact(s), {} edge(s)",
            graph.package_count(),
            graph.artifact_count(),
            graph.edge_count()
        );

        Ok(graph)
    }
}

/// Resolve `name` or `name@version` to a registered package.
pub fn resolve_reference(
    graph: &BuildGraph,
    reference: &str,
    requirer: Option<&str>,
) -> Result<PackageId> {
    resolve_package_ref(graph, &PackageRef::parse(reference)?, requirer)
}

/// Resolve a package reference; it must select exactly one package.
pub fn resolve_package_ref(
    graph: &BuildGraph,
    reference: &PackageRef,
    requirer: Option<&str>,
) -> Result<PackageId> {
    let matches: Vec<PackageId> = graph
        .find_packages_named(&reference.name)
        .into_iter()
        .filter(|&id| reference.matches(graph, id))
        .collect();

    match matches.as_slice() {
        [] => Err(GraphError::UnknownPackage {
            package: reference.to_string(),
            referenced_by: requirer.map(str::to_string),
        }
        .into()),
        [id] => Ok(*id),
        _ => {
            let candidates: Vec<String> = matches
                .iter()
                .filter_map(|&id| graph.package_key(id))
                .map(|key| format!("{}@{} ({})", key.name, key.version, key.source))
                .collect();
            bail!(
                "package reference `{}` is ambiguous; use one of: {}",
                reference,
                candidates.join(", ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAMOND: &str = r#"
foundation = "core"

[[package]]
name = "downstreamd"
version = "1.0.0"
kinds = ["dynamic-only"]
dependencies = ["arta", "artb"]

[[package]]
name = "arta"
version = "1.0.0"
dependencies = ["leafx"]

[[package]]
name = "artb"
version = "1.0.0"
dependencies = ["leafx"]

[[package]]
name = "leafx"
version = "1.0.0"
kinds = ["static-only"]

[[package]]
name = "core"
version = "1.0.0"
source = "path+libs/core"
"#;

    #[test]
    fn test_parse_and_build() {
        let file = GraphFile::parse(DIAMOND).unwrap();
        assert_eq!(file.packages.len(), 5);
        assert_eq!(file.packages[1].kinds, vec![ArtifactKind::Paired]);
        assert_eq!(
            file.packages[4].source,
            Some(SourceOrigin::Path("libs/core".into()))
        );

        let graph = file.build_graph(None).unwrap();
        assert_eq!(graph.package_count(), 5);
        assert_eq!(graph.edge_count(), 4);

        let core = resolve_reference(&graph, "core", None).unwrap();
        assert_eq!(graph.foundation(), Some(graph.primary_artifact(core).unwrap()));
    }

    #[test]
    fn test_foundation_override() {
        let file = GraphFile::parse(DIAMOND).unwrap();
        let graph = file.build_graph(Some("arta")).unwrap();

        let arta = resolve_reference(&graph, "arta", None).unwrap();
        assert_eq!(graph.foundation(), Some(graph.primary_artifact(arta).unwrap()));
    }

    #[test]
    fn test_unknown_dependency() {
        let file = GraphFile::parse(
            r#"
[[package]]
name = "app"
version = "0.1.0"
dependencies = ["missing"]
"#,
        )
        .unwrap();

        let err = file.build_graph(None).unwrap_err();
        let graph_err = err.downcast_ref::<GraphError>().unwrap();
        assert_eq!(
            graph_err,
            &GraphError::UnknownPackage {
                package: "missing".to_string(),
                referenced_by: Some("app v0.1.0".to_string()),
            }
        );
    }

    #[test]
    fn test_cycle_in_file() {
        let file = GraphFile::parse(
            r#"
[[package]]
name = "a"
version = "1.0.0"
dependencies = ["b"]

[[package]]
name = "b"
version = "1.0.0"
dependencies = ["c"]

[[package]]
name = "c"
version = "1.0.0"
dependencies = ["a"]
"#,
        )
        .unwrap();

        let err = file.build_graph(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_versioned_references() {
        let file = GraphFile::parse(
            r#"
[[package]]
name = "zlib"
version = "1.2.0"

[[package]]
name = "zlib"
version = "1.3.0"

[[package]]
name = "app"
version = "1.0.0"
dependencies = ["zlib@1.3.0"]
"#,
        )
        .unwrap();

        let graph = file.build_graph(None).unwrap();
        let zlib = resolve_reference(&graph, "zlib@1.3.0", None).unwrap();
        assert_eq!(graph.package_key(zlib).unwrap().version, Version::new(1, 3, 0));

        let err = resolve_reference(&graph, "zlib", None).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    const NAMESAKES: &str = r#"
[[package]]
name = "zlib"
version = "1.0.0"
kinds = ["static-only"]

[[package]]
name = "zlib"
version = "1.0.0"
source = "path+vendor/zlib"
kinds = ["static-only"]

[[package]]
name = "app"
version = "1.0.0"
dependencies = [{ name = "zlib", source = "path+vendor/zlib" }]
"#;

    #[test]
    fn test_dependency_selected_by_source() {
        let file = GraphFile::parse(NAMESAKES).unwrap();
        assert_eq!(
            file.packages[2].dependencies,
            vec![DependencyRef::Detailed(PackageRef {
                name: "zlib".to_string(),
                version: None,
                source: Some(SourceOrigin::Path("vendor/zlib".into())),
            })]
        );

        let graph = file.build_graph(None).unwrap();
        let app = resolve_reference(&graph, "app", None).unwrap();
        let app_art = graph.primary_artifact(app).unwrap();
        let deps = graph.dependencies_of(app_art);
        assert_eq!(deps.len(), 1);

        let (key, _) = graph.sort_key(deps[0]).unwrap();
        assert_eq!(key.source, SourceOrigin::Path("vendor/zlib".into()));
    }

    #[test]
    fn test_ambiguous_reference_lists_sources() {
        let file = GraphFile::parse(&NAMESAKES.replace(
            r#"[{ name = "zlib", source = "path+vendor/zlib" }]"#,
            r#"["zlib@1.0.0"]"#,
        ))
        .unwrap();

        let err = file.build_graph(None).unwrap_err().to_string();
        assert!(err.contains("`zlib@1.0.0` is ambiguous"), "{}", err);
        assert!(err.contains("zlib@1.0.0 (registry+default)"), "{}", err);
        assert!(err.contains("zlib@1.0.0 (path+vendor/zlib)"), "{}", err);
    }

    #[test]
    fn test_unknown_source_reference() {
        let file = GraphFile::parse(&NAMESAKES.replace(
            "path+vendor/zlib\" }",
            "git+https://example.com/zlib.git\" }",
        ))
        .unwrap();

        let err = file.build_graph(None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GraphError>(),
            Some(&GraphError::UnknownPackage {
                package: "zlib (git+https://example.com/zlib.git)".to_string(),
                referenced_by: Some("app v1.0.0".to_string()),
            })
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = GraphFile::parse(
            r#"
[[package]]
name = "app"
version = "1.0.0"
deps = ["zlib"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("deps"));
    }
}
