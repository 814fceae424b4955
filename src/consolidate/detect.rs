//! Duplication detection.
//!
//! A link boundary embeds every static artifact it reaches without passing
//! through another link boundary. When two boundaries inside one
//! boundary's closure embed the same static package, the downstream link
//! sees its symbols twice: a diamond.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::{ArtifactId, BuildGraph, EdgeState, GraphError, PackageId};

/// What a link boundary pulls into its own output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingClosure {
    pub root: ArtifactId,
    /// Static artifacts compiled into the root, dependents before dependencies.
    pub embedded: Vec<ArtifactId>,
    /// Link boundaries the root links against directly, in first-seen order.
    pub dynamic: Vec<ArtifactId>,
    /// Edges walked into embedded artifacts, as `(from, to)`.
    pub routes: Vec<(ArtifactId, ArtifactId)>,
}

impl EmbeddingClosure {
    pub fn embeds(&self, artifact: ArtifactId) -> bool {
        self.embedded.contains(&artifact)
    }
}

/// Compute what `root` embeds.
///
/// An edge marked satisfied-via-ancestor is skipped only when `root`
/// reaches that ancestor; a root outside the ancestor's reach still needs
/// the code and embeds it, and the ancestor itself walks it as the owner.
pub fn embedding_closure(graph: &BuildGraph, root: ArtifactId) -> EmbeddingClosure {
    let mut walk = Walk {
        graph,
        root,
        root_reach: None,
        visited: BTreeSet::new(),
        postorder: Vec::new(),
        dynamic: Vec::new(),
        routes: Vec::new(),
    };
    walk.visit(root);

    // Reverse postorder over edges visited last-to-first keeps declared
    // link order among siblings while putting dependents first.
    let mut embedded = walk.postorder;
    embedded.reverse();
    embedded.retain(|&a| a != root);

    let mut dynamic = walk.dynamic;
    dynamic.reverse();

    EmbeddingClosure {
        root,
        embedded,
        dynamic,
        routes: walk.routes,
    }
}

struct Walk<'a> {
    graph: &'a BuildGraph,
    root: ArtifactId,
    /// Everything the root reaches, filled on the first satisfied edge
    root_reach: Option<BTreeSet<ArtifactId>>,
    visited: BTreeSet<ArtifactId>,
    postorder: Vec<ArtifactId>,
    dynamic: Vec<ArtifactId>,
    routes: Vec<(ArtifactId, ArtifactId)>,
}

impl Walk<'_> {
    fn root_reaches(&mut self, artifact: ArtifactId) -> bool {
        let (graph, root) = (self.graph, self.root);
        self.root_reach
            .get_or_insert_with(|| graph.reachable_from(root))
            .contains(&artifact)
    }

    fn visit(&mut self, current: ArtifactId) {
        self.visited.insert(current);

        for (target, edge) in self.graph.dependency_edges(current).into_iter().rev() {
            if let EdgeState::SatisfiedViaAncestor { ancestor } = edge.state {
                if ancestor != self.root && self.root_reaches(ancestor) {
                    continue;
                }
            }

            if self.graph.is_link_boundary(target) {
                // Its code lives in its own library
                if !self.dynamic.contains(&target) {
                    self.dynamic.push(target);
                }
                continue;
            }

            self.routes.push((current, target));
            if !self.visited.contains(&target) {
                self.visit(target);
            }
        }

        self.postorder.push(current);
    }
}

/// A package embedded by two or more link boundaries below one boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiamondFinding {
    pub duplicated_package: PackageId,
    pub duplicated_artifact: ArtifactId,
    /// The link boundary where the copies meet
    pub converging_at: ArtifactId,
    /// Every boundary embedding its own copy, sorted
    pub via_boundaries: Vec<ArtifactId>,
    /// Per via boundary: converging point -> boundary -> duplicated artifact
    pub paths: Vec<Vec<ArtifactId>>,
}

impl DiamondFinding {
    /// Deduplication key: the same diamond seen from several downstream
    /// artifacts is one finding.
    pub fn key(&self) -> (ArtifactId, Vec<ArtifactId>) {
        (self.duplicated_artifact, self.via_boundaries.clone())
    }
}

/// Embedding closures of link boundaries, computed on first use.
///
/// Only valid while the graph is unchanged; clear it after every rewrite.
#[derive(Debug, Default)]
pub(crate) struct ClosureCache {
    closures: BTreeMap<ArtifactId, EmbeddingClosure>,
}

impl ClosureCache {
    pub(crate) fn get(&mut self, graph: &BuildGraph, boundary: ArtifactId) -> &EmbeddingClosure {
        self.closures
            .entry(boundary)
            .or_insert_with(|| embedding_closure(graph, boundary))
    }

    pub(crate) fn clear(&mut self) {
        self.closures.clear();
    }

    pub(crate) fn embedders_below(
        &mut self,
        graph: &BuildGraph,
        converging_at: ArtifactId,
        artifact: ArtifactId,
    ) -> Vec<ArtifactId> {
        boundaries_below(graph, converging_at)
            .into_iter()
            .filter(|&b| self.get(graph, b).embeds(artifact))
            .collect()
    }
}

/// The boundaries in `converging_at`'s closure (itself included) that embed
/// `artifact`.
pub fn embedders_below(
    graph: &BuildGraph,
    converging_at: ArtifactId,
    artifact: ArtifactId,
) -> Vec<ArtifactId> {
    ClosureCache::default().embedders_below(graph, converging_at, artifact)
}

/// Every link boundary in the graph that embeds `artifact`.
pub fn embedders_of(graph: &BuildGraph, artifact: ArtifactId) -> Vec<ArtifactId> {
    graph
        .artifacts()
        .iter()
        .filter(|a| a.is_link_boundary())
        .map(|a| a.id)
        .filter(|&b| embedding_closure(graph, b).embeds(artifact))
        .collect()
}

fn boundaries_below(graph: &BuildGraph, top: ArtifactId) -> BTreeSet<ArtifactId> {
    let mut boundaries: BTreeSet<_> = graph
        .reachable_from(top)
        .into_iter()
        .filter(|&a| graph.is_link_boundary(a))
        .collect();
    if graph.is_link_boundary(top) {
        boundaries.insert(top);
    }
    boundaries
}

/// Find every diamond in the graph.
///
/// Link boundaries are examined leaves first, so each finding reports the
/// nearest point where its copies converge. Fails fast on a cyclic graph.
pub fn detect(graph: &BuildGraph) -> Result<Vec<DiamondFinding>, GraphError> {
    detect_with(graph, &mut ClosureCache::default())
}

/// [`detect`] filling `cache`, so the caller can reuse the closures until
/// it next changes the graph.
pub(crate) fn detect_with(
    graph: &BuildGraph,
    cache: &mut ClosureCache,
) -> Result<Vec<DiamondFinding>, GraphError> {
    let order = graph.topological_order()?;

    let mut findings = Vec::new();
    let mut seen = BTreeSet::new();

    for &converging_at in order.iter().filter(|&&a| graph.is_link_boundary(a)) {
        let mut embedders: BTreeMap<ArtifactId, Vec<ArtifactId>> = BTreeMap::new();

        for boundary in boundaries_below(graph, converging_at) {
            for &embedded in &cache.get(graph, boundary).embedded {
                embedders.entry(embedded).or_default().push(boundary);
            }
        }

        for (artifact, via) in embedders {
            if via.len() < 2 {
                continue;
            }

            // Closures only embed static artifacts, so every entry here is a
            // real second copy
            let package = graph.artifact(artifact)?.package;
            let finding = build_finding(graph, package, artifact, converging_at, via);
            if seen.insert(finding.key()) {
                tracing::debug!(
                    "diamond: {} embedded by {} below {}",
                    graph.describe(artifact),
                    finding
                        .via_boundaries
                        .iter()
                        .map(|&b| graph.describe(b))
                        .collect::<Vec<_>>()
                        .join(", "),
                    graph.describe(converging_at)
                );
                findings.push(finding);
            }
        }
    }

    Ok(findings)
}

pub(crate) fn build_finding(
    graph: &BuildGraph,
    package: PackageId,
    artifact: ArtifactId,
    converging_at: ArtifactId,
    mut via: Vec<ArtifactId>,
) -> DiamondFinding {
    via.sort();
    via.dedup();

    let paths = via
        .iter()
        .map(|&boundary| {
            let mut path = graph
                .path_between(converging_at, boundary)
                .unwrap_or_else(|| vec![boundary]);
            if let Some(rest) = graph.path_between(boundary, artifact) {
                path.extend(rest.into_iter().skip(1));
            }
            path
        })
        .collect();

    DiamondFinding {
        duplicated_package: package,
        duplicated_artifact: artifact,
        converging_at,
        via_boundaries: via,
        paths,
    }
}
