//! BuildGraph - the artifact dependency graph.
//!
//! Packages register one artifact per declared kind; edges run from the
//! artifact whose link step needs an output to the artifact producing it.
//! Nodes are never removed, so an artifact's node index is its id.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::core::{Artifact, ArtifactId, ArtifactKind, GraphError, PackageId, PackageKey, PackageSpec};

/// How an edge came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeOrigin {
    /// Declared by the package manifest
    Declared,
    /// Added by the consolidation planner
    Consolidation,
}

/// Whether an edge still embeds its target's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum EdgeState {
    /// The target's output is linked through this edge
    Direct,
    /// Kept for compile-time resolution; the code is provided by `ancestor`
    SatisfiedViaAncestor { ancestor: ArtifactId },
}

impl EdgeState {
    /// The ancestor now providing the target's code, if any.
    pub fn ancestor(&self) -> Option<ArtifactId> {
        match self {
            EdgeState::Direct => None,
            EdgeState::SatisfiedViaAncestor { ancestor } => Some(*ancestor),
        }
    }
}

/// A dependency edge between two artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    /// Global insertion sequence; orders a node's edges for linking.
    pub seq: u64,
    /// Package whose declaration (or consolidation) produced this edge
    pub package: PackageId,
    pub origin: EdgeOrigin,
    pub state: EdgeState,
}

impl DependencyEdge {
    pub fn is_satisfied_via_ancestor(&self) -> bool {
        matches!(self.state, EdgeState::SatisfiedViaAncestor { .. })
    }
}

/// Flat description of one edge, for listings and comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeView {
    pub from: ArtifactId,
    pub to: ArtifactId,
    pub origin: EdgeOrigin,
    pub state: EdgeState,
}

#[derive(Debug, Clone)]
struct PackageEntry {
    key: PackageKey,
    artifacts: Vec<ArtifactId>,
}

/// The artifact dependency graph for one build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    graph: DiGraph<ArtifactId, DependencyEdge>,
    packages: Vec<PackageEntry>,
    artifacts: Vec<Artifact>,
    key_to_package: BTreeMap<PackageKey, PackageId>,
    foundation: Option<ArtifactId>,
    next_seq: u64,
}

impl BuildGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package and one artifact per declared kind.
    pub fn add_package(&mut self, spec: PackageSpec) -> Result<PackageId, GraphError> {
        if self.key_to_package.contains_key(&spec.key) {
            return Err(GraphError::DuplicatePackage {
                package: spec.key.to_string(),
            });
        }
        if spec.kinds.is_empty() {
            return Err(GraphError::NoArtifacts {
                package: spec.key.to_string(),
            });
        }

        let pkg_id = PackageId::new(self.packages.len());
        let mut artifacts = Vec::new();
        let mut seen = BTreeSet::new();

        for kind in spec.kinds {
            // One artifact per kind
            if !seen.insert(kind) {
                continue;
            }
            let id = ArtifactId::new(self.artifacts.len());
            let node = self.graph.add_node(id);
            debug_assert_eq!(node.index(), id.index());

            self.artifacts.push(Artifact {
                id,
                package: pkg_id,
                kind,
            });
            artifacts.push(id);
        }

        tracing::debug!("registered {} ({} artifacts)", spec.key, artifacts.len());

        self.key_to_package.insert(spec.key.clone(), pkg_id);
        self.packages.push(PackageEntry {
            key: spec.key,
            artifacts,
        });

        Ok(pkg_id)
    }

    /// Declare that package `from` depends on package `to`.
    ///
    /// Every artifact of `from` gains an edge to the primary artifact of
    /// `to`. Fails without modifying the graph if the edge would close a
    /// cycle.
    pub fn add_dependency(&mut self, from: PackageId, to: PackageId) -> Result<(), GraphError> {
        let sources = self.artifacts_of(from)?.to_vec();
        let target = self.primary_artifact(to)?;

        for &source in &sources {
            self.check_acyclic(source, target)?;
        }
        for source in sources {
            self.insert_edge(source, target, from, EdgeOrigin::Declared);
        }

        Ok(())
    }

    /// Declare an artifact-level dependency.
    pub fn add_artifact_dependency(
        &mut self,
        from: ArtifactId,
        to: ArtifactId,
    ) -> Result<(), GraphError> {
        let package = self.artifact(from)?.package;
        self.artifact(to)?;
        self.check_acyclic(from, to)?;
        self.insert_edge(from, to, package, EdgeOrigin::Declared);
        Ok(())
    }

    /// Add an edge on behalf of the consolidation planner.
    ///
    /// Returns `true` if a new edge was created. An existing edge is reset
    /// to [`EdgeState::Direct`], since the caller needs it to embed.
    pub(crate) fn add_consolidation_edge(
        &mut self,
        from: ArtifactId,
        to: ArtifactId,
    ) -> Result<bool, GraphError> {
        let package = self.artifact(from)?.package;
        self.artifact(to)?;

        if let Some(edge) = self.graph.find_edge(node(from), node(to)) {
            self.graph[edge].state = EdgeState::Direct;
            return Ok(false);
        }

        self.check_acyclic(from, to)?;
        self.insert_edge(from, to, package, EdgeOrigin::Consolidation);
        Ok(true)
    }

    /// Mark the edge `from -> to` as satisfied through `ancestor`.
    ///
    /// Returns `false` if no such edge exists.
    pub(crate) fn mark_satisfied(
        &mut self,
        from: ArtifactId,
        to: ArtifactId,
        ancestor: ArtifactId,
    ) -> bool {
        match self.graph.find_edge(node(from), node(to)) {
            Some(edge) => {
                self.graph[edge].state = EdgeState::SatisfiedViaAncestor { ancestor };
                true
            }
            None => false,
        }
    }

    fn insert_edge(&mut self, from: ArtifactId, to: ArtifactId, package: PackageId, origin: EdgeOrigin) {
        if self.graph.contains_edge(node(from), node(to)) {
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.graph.add_edge(
            node(from),
            node(to),
            DependencyEdge {
                seq,
                package,
                origin,
                state: EdgeState::Direct,
            },
        );
    }

    fn check_acyclic(&self, from: ArtifactId, to: ArtifactId) -> Result<(), GraphError> {
        if !self.reaches(to, from) {
            return Ok(());
        }

        // to ->* from, closed by the new from -> to
        let mut cycle = vec![from];
        cycle.extend(self.path_between(to, from).unwrap_or_else(|| vec![to, from]));
        Err(GraphError::Cycle {
            cycle: cycle.iter().map(|&a| self.describe(a)).collect(),
        })
    }

    /// Designate the fallback ancestor used when a diamond has no common
    /// ancestor link boundary.
    pub fn set_foundation(&mut self, artifact: ArtifactId) -> Result<(), GraphError> {
        self.artifact(artifact)?;
        self.foundation = Some(artifact);
        Ok(())
    }

    pub fn foundation(&self) -> Option<ArtifactId> {
        self.foundation
    }

    /// Get the artifacts produced by a package, in declaration order.
    pub fn artifacts_of(&self, pkg_id: PackageId) -> Result<&[ArtifactId], GraphError> {
        self.packages
            .get(pkg_id.index())
            .map(|entry| entry.artifacts.as_slice())
            .ok_or_else(|| GraphError::UnknownPackage {
                package: pkg_id.to_string(),
                referenced_by: None,
            })
    }

    /// The artifact dependents of a package link against.
    ///
    /// A package that builds a dynamic library exposes it, so its code is
    /// never embedded by dependents. Otherwise the first declared artifact.
    pub fn primary_artifact(&self, pkg_id: PackageId) -> Result<ArtifactId, GraphError> {
        let artifacts = self.artifacts_of(pkg_id)?;
        let primary = artifacts
            .iter()
            .copied()
            .find(|&a| self.artifacts[a.index()].is_link_boundary())
            .unwrap_or(artifacts[0]);
        Ok(primary)
    }

    pub fn package_key(&self, pkg_id: PackageId) -> Option<&PackageKey> {
        self.packages.get(pkg_id.index()).map(|entry| &entry.key)
    }

    pub fn artifact(&self, id: ArtifactId) -> Result<&Artifact, GraphError> {
        self.artifacts
            .get(id.index())
            .ok_or_else(|| GraphError::UnknownArtifact {
                artifact: id.to_string(),
            })
    }

    /// All artifacts, in registration order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// All packages, in registration order.
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &PackageKey)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, entry)| (PackageId::new(i), &entry.key))
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Look up a package by its exact identity.
    pub fn find_package(&self, key: &PackageKey) -> Option<PackageId> {
        self.key_to_package.get(key).copied()
    }

    /// All packages with the given name, ordered by version then source.
    pub fn find_packages_named(&self, name: &str) -> Vec<PackageId> {
        self.key_to_package
            .iter()
            .filter(|(key, _)| key.name == name)
            .map(|(_, &id)| id)
            .collect()
    }

    pub fn is_link_boundary(&self, id: ArtifactId) -> bool {
        self.artifacts
            .get(id.index())
            .map(|a| a.is_link_boundary())
            .unwrap_or(false)
    }

    /// Get direct dependencies of an artifact, in insertion (link) order.
    pub fn dependencies_of(&self, id: ArtifactId) -> Vec<ArtifactId> {
        self.dependency_edges(id).into_iter().map(|(to, _)| to).collect()
    }

    /// Outgoing edges of an artifact with their metadata, in link order.
    pub fn dependency_edges(&self, id: ArtifactId) -> Vec<(ArtifactId, &DependencyEdge)> {
        if id.index() >= self.artifacts.len() {
            return Vec::new();
        }

        let mut edges: Vec<_> = self
            .graph
            .edges(node(id))
            .map(|e| (self.graph[e.target()], e.weight()))
            .collect();
        edges.sort_by_key(|(_, edge)| edge.seq);
        edges
    }

    /// Get artifacts that depend on the given artifact.
    pub fn dependents_of(&self, id: ArtifactId) -> Vec<ArtifactId> {
        if id.index() >= self.artifacts.len() {
            return Vec::new();
        }

        let mut dependents: Vec<_> = self
            .graph
            .neighbors_directed(node(id), Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        dependents.sort();
        dependents
    }

    pub fn edge(&self, from: ArtifactId, to: ArtifactId) -> Option<&DependencyEdge> {
        self.find_edge(from, to).map(|e| &self.graph[e])
    }

    fn find_edge(&self, from: ArtifactId, to: ArtifactId) -> Option<EdgeIndex> {
        if from.index() >= self.artifacts.len() || to.index() >= self.artifacts.len() {
            return None;
        }
        self.graph.find_edge(node(from), node(to))
    }

    /// Every edge, ordered by source artifact then link order.
    pub fn edges(&self) -> Vec<EdgeView> {
        self.artifacts
            .iter()
            .flat_map(|a| {
                self.dependency_edges(a.id)
                    .into_iter()
                    .map(move |(to, edge)| EdgeView {
                        from: a.id,
                        to,
                        origin: edge.origin,
                        state: edge.state,
                    })
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get artifacts in topological order (dependencies before dependents).
    pub fn topological_order(&self) -> Result<Vec<ArtifactId>, GraphError> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(nodes) => {
                // toposort puts a before b for a -> b, i.e. dependents first.
                let mut order: Vec<_> = nodes.into_iter().map(|n| self.graph[n]).collect();
                order.reverse();
                Ok(order)
            }
            Err(cycle) => Err(self.cycle_through(self.graph[cycle.node_id()])),
        }
    }

    /// Fail fast if the graph contains a cycle.
    pub fn validate_acyclic(&self) -> Result<(), GraphError> {
        self.topological_order().map(|_| ())
    }

    fn cycle_through(&self, start: ArtifactId) -> GraphError {
        for next in self.dependencies_of(start) {
            if let Some(path) = self.path_between(next, start) {
                let mut cycle = vec![start];
                cycle.extend(path);
                return GraphError::Cycle {
                    cycle: cycle.iter().map(|&a| self.describe(a)).collect(),
                };
            }
        }
        GraphError::Cycle {
            cycle: vec![self.describe(start)],
        }
    }

    /// Whether `to` is reachable from `from` (reflexive).
    pub fn reaches(&self, from: ArtifactId, to: ArtifactId) -> bool {
        if from.index() >= self.artifacts.len() || to.index() >= self.artifacts.len() {
            return false;
        }
        petgraph::algo::has_path_connecting(&self.graph, node(from), node(to), None)
    }

    /// Every artifact reachable from `from`, excluding `from` itself.
    pub fn reachable_from(&self, from: ArtifactId) -> BTreeSet<ArtifactId> {
        let mut visited = BTreeSet::new();
        let mut stack = self.dependencies_of(from);

        while let Some(current) = stack.pop() {
            if visited.insert(current) {
                stack.extend(self.dependencies_of(current));
            }
        }

        visited
    }

    /// Shortest edge distance from `from` to everything it reaches,
    /// including itself at distance 0.
    pub fn distances_from(&self, from: ArtifactId) -> BTreeMap<ArtifactId, usize> {
        let mut distances = BTreeMap::new();
        let mut queue = VecDeque::new();
        distances.insert(from, 0);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            let next_distance = distances[&current] + 1;
            for dep in self.dependencies_of(current) {
                if !distances.contains_key(&dep) {
                    distances.insert(dep, next_distance);
                    queue.push_back(dep);
                }
            }
        }

        distances
    }

    /// Shortest path from `from` to `to`, both inclusive.
    ///
    /// Ties resolve toward earlier-declared edges, so the path is stable
    /// across runs.
    pub fn path_between(&self, from: ArtifactId, to: ArtifactId) -> Option<Vec<ArtifactId>> {
        let mut parents: BTreeMap<ArtifactId, Option<ArtifactId>> = BTreeMap::new();
        let mut queue = VecDeque::new();
        parents.insert(from, None);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to];
                let mut cursor = parents[&to];
                while let Some(parent) = cursor {
                    path.push(parent);
                    cursor = parents[&parent];
                }
                path.reverse();
                return Some(path);
            }

            for dep in self.dependencies_of(current) {
                if !parents.contains_key(&dep) {
                    parents.insert(dep, Some(current));
                    queue.push_back(dep);
                }
            }
        }

        None
    }

    /// Whether another package shares this one's name and version, so only
    /// the source tells them apart.
    pub fn has_namesake(&self, pkg_id: PackageId) -> bool {
        let Some(key) = self.package_key(pkg_id) else {
            return false;
        };
        self.key_to_package
            .keys()
            .filter(|k| k.name == key.name && k.version == key.version)
            .count()
            > 1
    }

    /// Human-readable artifact name like "zlib v1.3.1 [static-only]".
    ///
    /// The source is appended only when a namesake exists.
    pub fn describe(&self, id: ArtifactId) -> String {
        let Some(artifact) = self.artifacts.get(id.index()) else {
            return id.to_string();
        };
        let entry = &self.packages[artifact.package.index()];

        let mut name = entry.key.display_name();
        if self.has_namesake(artifact.package) {
            name = format!("{} ({})", name, entry.key.source);
        }
        if entry.artifacts.len() > 1 {
            name = format!("{} [{}]", name, artifact.kind);
        }
        name
    }

    /// Render a path of artifacts as "a v1 -> b v1 -> c v1".
    pub fn describe_path(&self, path: &[ArtifactId]) -> String {
        path.iter()
            .map(|&a| self.describe(a))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Package identity of an artifact, used for deterministic tie-breaks.
    pub fn sort_key(&self, id: ArtifactId) -> Option<(&PackageKey, ArtifactKind)> {
        let artifact = self.artifacts.get(id.index())?;
        Some((&self.packages[artifact.package.index()].key, artifact.kind))
    }
}

fn node(id: ArtifactId) -> NodeIndex {
    NodeIndex::new(id.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn pkg(graph: &mut BuildGraph, name: &str, kind: ArtifactKind) -> PackageId {
        graph
            .add_package(PackageSpec::new(name, Version::new(1, 0, 0)).with_kind(kind))
            .unwrap()
    }

    #[test]
    fn test_graph_basic() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);
        let b = pkg(&mut graph, "b", ArtifactKind::StaticOnly);

        graph.add_dependency(a, b).unwrap();

        let art_a = graph.primary_artifact(a).unwrap();
        let art_b = graph.primary_artifact(b).unwrap();
        assert_eq!(graph.dependencies_of(art_a), vec![art_b]);
        assert_eq!(graph.dependents_of(art_b), vec![art_a]);
        assert_eq!(graph.package_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dependencies_keep_insertion_order() {
        let mut graph = BuildGraph::new();
        let app = pkg(&mut graph, "app", ArtifactKind::DynamicOnly);
        let names = ["zeta", "alpha", "mid", "beta"];
        let deps: Vec<_> = names
            .iter()
            .map(|n| pkg(&mut graph, n, ArtifactKind::StaticOnly))
            .collect();

        for &dep in &deps {
            graph.add_dependency(app, dep).unwrap();
        }

        let expected: Vec<_> = deps
            .iter()
            .map(|&d| graph.primary_artifact(d).unwrap())
            .collect();
        assert_eq!(
            graph.dependencies_of(graph.primary_artifact(app).unwrap()),
            expected
        );
    }

    #[test]
    fn test_namesakes_described_with_source() {
        let mut graph = BuildGraph::new();
        let vendored = graph
            .add_package(
                PackageSpec::new("zlib", Version::new(1, 0, 0))
                    .with_source("path+vendor/zlib".parse().unwrap())
                    .with_kind(ArtifactKind::StaticOnly),
            )
            .unwrap();
        let registry = pkg(&mut graph, "zlib", ArtifactKind::StaticOnly);
        let app = pkg(&mut graph, "app", ArtifactKind::Paired);

        assert!(graph.has_namesake(vendored));
        assert!(graph.has_namesake(registry));
        assert!(!graph.has_namesake(app));

        let vendored_art = graph.primary_artifact(vendored).unwrap();
        let registry_art = graph.primary_artifact(registry).unwrap();
        assert_eq!(graph.describe(vendored_art), "zlib v1.0.0 (path+vendor/zlib)");
        assert_eq!(graph.describe(registry_art), "zlib v1.0.0 (registry+default)");
        assert_eq!(graph.describe(graph.primary_artifact(app).unwrap()), "app v1.0.0");
    }

    #[test]
    fn test_multi_artifact_package() {
        let mut graph = BuildGraph::new();
        let z = graph
            .add_package(
                PackageSpec::new("zlib", Version::new(1, 3, 0))
                    .with_kinds([ArtifactKind::StaticOnly, ArtifactKind::DynamicOnly]),
            )
            .unwrap();
        let app = pkg(&mut graph, "app", ArtifactKind::Paired);

        graph.add_dependency(app, z).unwrap();

        let artifacts = graph.artifacts_of(z).unwrap();
        assert_eq!(artifacts.len(), 2);
        // Dependents link the dynamic library, not the archive declared first
        assert_eq!(graph.primary_artifact(z).unwrap(), artifacts[1]);
        assert_eq!(
            graph.dependencies_of(graph.primary_artifact(app).unwrap()),
            vec![artifacts[1]]
        );
        assert_eq!(graph.describe(artifacts[1]), "zlib v1.3.0 [dynamic-only]");
    }

    #[test]
    fn test_duplicate_package_rejected() {
        let mut graph = BuildGraph::new();
        pkg(&mut graph, "a", ArtifactKind::Paired);

        let err = graph
            .add_package(PackageSpec::new("a", Version::new(1, 0, 0)))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicatePackage { .. }));

        // Same name, different version is a distinct package
        graph
            .add_package(PackageSpec::new("a", Version::new(2, 0, 0)))
            .unwrap();
        assert_eq!(graph.find_packages_named("a").len(), 2);
    }

    #[test]
    fn test_empty_kinds_rejected() {
        let mut graph = BuildGraph::new();
        let err = graph
            .add_package(PackageSpec::new("a", Version::new(1, 0, 0)).with_kinds([]))
            .unwrap_err();
        assert!(matches!(err, GraphError::NoArtifacts { .. }));
    }

    #[test]
    fn test_unknown_package() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);

        let err = graph.add_dependency(a, PackageId::new(42)).unwrap_err();
        assert!(matches!(err, GraphError::UnknownPackage { .. }));

        let err = graph.add_dependency(PackageId::new(7), a).unwrap_err();
        assert!(matches!(err, GraphError::UnknownPackage { .. }));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_three_cycle_rejected() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);
        let b = pkg(&mut graph, "b", ArtifactKind::Paired);
        let c = pkg(&mut graph, "c", ArtifactKind::Paired);

        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, c).unwrap();
        let err = graph.add_dependency(c, a).unwrap_err();

        assert_eq!(
            err,
            GraphError::Cycle {
                cycle: vec![
                    "c v1.0.0".to_string(),
                    "a v1.0.0".to_string(),
                    "b v1.0.0".to_string(),
                    "c v1.0.0".to_string(),
                ]
            }
        );
        // Rejected edge leaves the graph untouched
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.validate_acyclic().is_ok());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);
        assert!(matches!(
            graph.add_dependency(a, a),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_topological_order() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);
        let b = pkg(&mut graph, "b", ArtifactKind::Paired);
        let c = pkg(&mut graph, "c", ArtifactKind::StaticOnly);

        // a -> b -> c
        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, c).unwrap();

        let order = graph.topological_order().unwrap();
        let pos = |p: PackageId| {
            let art = graph.primary_artifact(p).unwrap();
            order.iter().position(|&id| id == art).unwrap()
        };

        assert!(pos(c) < pos(b));
        assert!(pos(b) < pos(a));
    }

    #[test]
    fn test_paths_and_distances() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);
        let b = pkg(&mut graph, "b", ArtifactKind::Paired);
        let c = pkg(&mut graph, "c", ArtifactKind::StaticOnly);

        graph.add_dependency(a, b).unwrap();
        graph.add_dependency(b, c).unwrap();
        graph.add_dependency(a, c).unwrap();

        let [art_a, art_b, art_c] = [a, b, c].map(|p| graph.primary_artifact(p).unwrap());

        assert!(graph.reaches(art_a, art_c));
        assert!(graph.reaches(art_a, art_a));
        assert!(!graph.reaches(art_c, art_a));
        assert_eq!(graph.path_between(art_a, art_c), Some(vec![art_a, art_c]));
        assert_eq!(graph.path_between(art_c, art_a), None);

        let distances = graph.distances_from(art_a);
        assert_eq!(distances[&art_a], 0);
        assert_eq!(distances[&art_b], 1);
        assert_eq!(distances[&art_c], 1);

        assert_eq!(
            graph.reachable_from(art_a),
            [art_b, art_c].into_iter().collect()
        );
    }

    #[test]
    fn test_consolidation_edge_and_marking() {
        let mut graph = BuildGraph::new();
        let a = pkg(&mut graph, "a", ArtifactKind::Paired);
        let core = pkg(&mut graph, "core", ArtifactKind::Paired);
        let leaf = pkg(&mut graph, "leaf", ArtifactKind::StaticOnly);
        graph.add_dependency(a, leaf).unwrap();

        let [art_a, art_core, art_leaf] = [a, core, leaf].map(|p| graph.primary_artifact(p).unwrap());

        assert!(graph.add_consolidation_edge(art_core, art_leaf).unwrap());
        assert!(!graph.add_consolidation_edge(art_core, art_leaf).unwrap());
        assert!(graph.mark_satisfied(art_a, art_leaf, art_core));
        assert!(!graph.mark_satisfied(art_core, art_a, art_core));

        let edges = graph.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(
            edges[0].state,
            EdgeState::SatisfiedViaAncestor { ancestor: art_core }
        );
        assert_eq!(edges[1].origin, EdgeOrigin::Consolidation);
    }
}
