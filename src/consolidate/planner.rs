//! Consolidation planning.
//!
//! For every diamond, pick one link boundary that all diverging boundaries
//! depend on and let it own the duplicated package. The other boundaries
//! keep their edges for compile-time resolution, but those edges are marked
//! satisfied-via-ancestor so nothing below the ancestor embeds a copy.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::consolidate::detect::{
    build_finding, detect, detect_with, embedding_closure, ClosureCache, DiamondFinding,
};
use crate::consolidate::ConsolidateError;
use crate::core::{ArtifactId, BuildGraph};

/// One rewrite applied to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consolidation {
    pub finding: DiamondFinding,
    /// The link boundary that now owns the package
    pub ancestor: ArtifactId,
    /// Whether the ancestor is the configured foundation fallback
    pub via_foundation: bool,
    pub added_edges: Vec<(ArtifactId, ArtifactId)>,
    pub satisfied_edges: Vec<(ArtifactId, ArtifactId)>,
}

/// Outcome of [`consolidate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsolidationReport {
    /// Every distinct diamond found, across all rounds
    pub findings: Vec<DiamondFinding>,
    pub consolidations: Vec<Consolidation>,
    pub rounds: usize,
}

impl ConsolidationReport {
    /// Whether the graph was left untouched.
    pub fn is_unchanged(&self) -> bool {
        self.consolidations.is_empty()
    }
}

/// Rewrite `graph` until no diamond remains.
///
/// Moving a package onto an ancestor can change which boundaries embed
/// its own dependencies, so detection runs again after every round. A
/// graph without diamonds is returned unmodified.
pub fn consolidate(graph: &mut BuildGraph) -> Result<ConsolidationReport, ConsolidateError> {
    let mut report = ConsolidationReport::default();
    let mut seen = BTreeSet::new();
    let max_rounds = graph.artifact_count() + 1;

    while report.rounds < max_rounds {
        let mut cache = ClosureCache::default();
        let findings = detect_with(graph, &mut cache)?;
        if findings.is_empty() {
            tracing::info!(
                "consolidated {} diamond(s) in {} round(s)",
                report.consolidations.len(),
                report.rounds
            );
            return Ok(report);
        }

        report.rounds += 1;
        for finding in findings {
            if seen.insert(finding.key()) {
                report.findings.push(finding.clone());
            }

            // An earlier rewrite this round may already have resolved it
            let via =
                cache.embedders_below(graph, finding.converging_at, finding.duplicated_artifact);
            if via.len() < 2 {
                continue;
            }
            let live = build_finding(
                graph,
                finding.duplicated_package,
                finding.duplicated_artifact,
                finding.converging_at,
                via,
            );

            let consolidation = resolve_finding(graph, live)?;
            cache.clear();
            report.consolidations.push(consolidation);
        }
    }

    match detect(graph)?.into_iter().next() {
        Some(finding) => Err(unresolvable(graph, &finding)),
        None => Ok(report),
    }
}

fn resolve_finding(
    graph: &mut BuildGraph,
    finding: DiamondFinding,
) -> Result<Consolidation, ConsolidateError> {
    let target = finding.duplicated_artifact;

    let (ancestor, via_foundation) = match nearest_common_ancestor(graph, &finding) {
        Some(ancestor) => (ancestor, false),
        None => match usable_foundation(graph, &finding) {
            Some(foundation) => (foundation, true),
            None => return Err(unresolvable(graph, &finding)),
        },
    };

    tracing::debug!(
        "moving {} onto {}{}",
        graph.describe(target),
        graph.describe(ancestor),
        if via_foundation { " (foundation)" } else { "" }
    );

    let mut added_edges = Vec::new();

    // Boundaries that do not yet see the foundation must link against it
    for &boundary in &finding.via_boundaries {
        if boundary != ancestor && !graph.reaches(boundary, ancestor) {
            graph.add_consolidation_edge(boundary, ancestor)?;
            added_edges.push((boundary, ancestor));
        }
    }

    if graph.add_consolidation_edge(ancestor, target)? {
        added_edges.push((ancestor, target));
    }

    let mut satisfied_edges = Vec::new();
    for &boundary in &finding.via_boundaries {
        if boundary == ancestor {
            continue;
        }
        let closure = embedding_closure(graph, boundary);
        for &(from, to) in &closure.routes {
            if to == target && graph.mark_satisfied(from, to, ancestor) {
                satisfied_edges.push((from, to));
            }
        }
    }

    Ok(Consolidation {
        finding,
        ancestor,
        via_foundation,
        added_edges,
        satisfied_edges,
    })
}

/// The link boundary every via boundary reaches (itself counts) with the
/// smallest worst-case distance. Ties go to the smallest package identity.
fn nearest_common_ancestor(graph: &BuildGraph, finding: &DiamondFinding) -> Option<ArtifactId> {
    let target = finding.duplicated_artifact;
    let target_package = finding.duplicated_package;
    // An ancestor the target reaches would close a cycle
    let below_target = graph.reachable_from(target);

    let distances: Vec<BTreeMap<ArtifactId, usize>> = finding
        .via_boundaries
        .iter()
        .map(|&b| graph.distances_from(b))
        .collect();

    graph
        .artifacts()
        .iter()
        .filter(|a| a.is_link_boundary())
        .filter(|a| a.package != target_package && !below_target.contains(&a.id))
        .filter_map(|a| {
            let worst = distances
                .iter()
                .map(|d| d.get(&a.id).copied())
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .max()?;
            Some((worst, graph.sort_key(a.id)?, a.id))
        })
        .min()
        .map(|(_, _, id)| id)
}

fn usable_foundation(graph: &BuildGraph, finding: &DiamondFinding) -> Option<ArtifactId> {
    let foundation = graph.foundation()?;
    let artifact = graph.artifact(foundation).ok()?;

    if !artifact.is_link_boundary() || artifact.package == finding.duplicated_package {
        tracing::warn!(
            "foundation {} cannot own {}",
            graph.describe(foundation),
            graph.describe(finding.duplicated_artifact)
        );
        return None;
    }
    if graph.reaches(finding.duplicated_artifact, foundation) {
        return None;
    }
    // Edges from the boundaries to the foundation must not close a cycle
    let blocked = finding
        .via_boundaries
        .iter()
        .any(|&b| b != foundation && graph.reaches(foundation, b));
    if blocked {
        return None;
    }

    Some(foundation)
}

fn unresolvable(graph: &BuildGraph, finding: &DiamondFinding) -> ConsolidateError {
    ConsolidateError::UnresolvableDuplication {
        package: graph.describe(finding.duplicated_artifact),
        converging_at: graph.describe(finding.converging_at),
        boundaries: finding
            .via_boundaries
            .iter()
            .map(|&b| graph.describe(b))
            .collect(),
        paths: finding
            .paths
            .iter()
            .map(|p| graph.describe_path(p))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EdgeOrigin, EdgeState};
    use crate::test_support::*;

    #[test]
    fn test_sibling_diamond_moves_onto_foundation() {
        let mut fx = sibling_diamond();
        let report = consolidate(&mut fx.graph).unwrap();

        let core = fx.art("core");
        let leafx = fx.art("leafx");
        let arta = fx.art("arta");
        let artb = fx.art("artb");

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].converging_at, fx.art("downstreamd"));
        assert_eq!(report.consolidations.len(), 1);

        let c = &report.consolidations[0];
        assert_eq!(c.ancestor, core);
        assert!(c.via_foundation);
        assert!(c.added_edges.contains(&(core, leafx)));
        assert!(c.added_edges.contains(&(arta, core)));
        assert!(c.added_edges.contains(&(artb, core)));

        for boundary in [arta, artb] {
            assert_eq!(
                fx.graph.edge(boundary, leafx).unwrap().state,
                EdgeState::SatisfiedViaAncestor { ancestor: core }
            );
        }
        let owner = fx.graph.edge(core, leafx).unwrap();
        assert_eq!(owner.origin, EdgeOrigin::Consolidation);
        assert_eq!(owner.state, EdgeState::Direct);

        assert!(detect(&fx.graph).unwrap().is_empty());
    }

    #[test]
    fn test_common_hub_preferred_over_foundation() {
        let mut fx = hub_diamond().paired("base").foundation("base");
        let report = consolidate(&mut fx.graph).unwrap();

        let c = &report.consolidations[0];
        assert_eq!(c.ancestor, fx.art("hub"));
        assert!(!c.via_foundation);
        assert_eq!(c.added_edges, vec![(fx.art("hub"), fx.art("leafx"))]);
        assert!(fx.graph.edge(fx.art("base"), fx.art("leafx")).is_none());
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        // Both siblings reach `near` directly and `far` through it.
        let mut fx = GraphFixture::new()
            .paired("far")
            .paired("near")
            .static_only("leaf")
            .paired("a")
            .paired("b")
            .dynamic("app")
            .dep("near", &["far"])
            .dep("a", &["near", "leaf"])
            .dep("b", &["near", "leaf"])
            .dep("app", &["a", "b"]);

        let report = consolidate(&mut fx.graph).unwrap();
        assert_eq!(report.consolidations[0].ancestor, fx.art("near"));
    }

    #[test]
    fn test_equal_distance_tie_breaks_by_name() {
        let mut fx = GraphFixture::new()
            .paired("zeta")
            .paired("alpha")
            .static_only("leaf")
            .paired("a")
            .paired("b")
            .dynamic("app")
            .dep("a", &["zeta", "alpha", "leaf"])
            .dep("b", &["zeta", "alpha", "leaf"])
            .dep("app", &["a", "b"]);

        let report = consolidate(&mut fx.graph).unwrap();
        assert_eq!(report.consolidations[0].ancestor, fx.art("alpha"));
    }

    #[test]
    fn test_inner_boundary_owns_when_downstream_embeds() {
        let mut fx = GraphFixture::new()
            .static_only("leaf")
            .paired("inner")
            .dynamic("d")
            .dep("inner", &["leaf"])
            .dep("d", &["inner", "leaf"]);

        let report = consolidate(&mut fx.graph).unwrap();
        let c = &report.consolidations[0];
        assert_eq!(c.ancestor, fx.art("inner"));
        assert!(c.added_edges.is_empty());
        assert_eq!(c.satisfied_edges, vec![(fx.art("d"), fx.art("leaf"))]);
    }

    #[test]
    fn test_no_ancestor_no_foundation_is_unresolvable() {
        // Same shape as sibling_diamond, no foundation configured
        let mut graph = GraphFixture::new()
            .static_only("leafx")
            .paired("arta")
            .paired("artb")
            .dynamic("downstreamd")
            .dep("arta", &["leafx"])
            .dep("artb", &["leafx"])
            .dep("downstreamd", &["arta", "artb"])
            .build();

        let err = consolidate(&mut graph).unwrap_err();
        match err {
            ConsolidateError::UnresolvableDuplication {
                package,
                converging_at,
                boundaries,
                paths,
            } => {
                assert_eq!(package, "leafx v1.0.0");
                assert_eq!(converging_at, "downstreamd v1.0.0");
                assert_eq!(boundaries, vec!["arta v1.0.0", "artb v1.0.0"]);
                assert_eq!(paths.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_foundation_below_a_boundary_is_unusable() {
        // The foundation depends on arta, so artb -> foundation is fine but
        // arta can't be moved onto something that needs arta.
        let mut graph = GraphFixture::new()
            .static_only("leafx")
            .paired("arta")
            .paired("artb")
            .paired("base")
            .dynamic("d")
            .dep("arta", &["leafx"])
            .dep("artb", &["leafx"])
            .dep("base", &["arta"])
            .dep("d", &["arta", "artb"])
            .foundation("base")
            .build();

        assert!(matches!(
            consolidate(&mut graph),
            Err(ConsolidateError::UnresolvableDuplication { .. })
        ));
    }

    #[test]
    fn test_diamond_free_graph_unchanged() {
        let mut fx = layered_without_diamonds();
        let before = fx.graph.edges();

        let report = consolidate(&mut fx.graph).unwrap();

        assert!(report.is_unchanged());
        assert!(report.findings.is_empty());
        assert_eq!(fx.graph.edges(), before);
    }

    #[test]
    fn test_transitive_static_chain_consolidates() {
        // leaf pulls in util; both are duplicated below app.
        let mut fx = GraphFixture::new()
            .paired("hub")
            .static_only("util")
            .static_only("leaf")
            .paired("a")
            .paired("b")
            .dynamic("app")
            .dep("leaf", &["util"])
            .dep("a", &["hub", "leaf"])
            .dep("b", &["hub", "leaf"])
            .dep("app", &["a", "b"]);

        consolidate(&mut fx.graph).unwrap();

        assert!(detect(&fx.graph).unwrap().is_empty());
        assert_eq!(
            crate::consolidate::detect::embedders_of(&fx.graph, fx.art("util")),
            vec![fx.art("hub")]
        );
        assert_eq!(
            crate::consolidate::detect::embedders_of(&fx.graph, fx.art("leaf")),
            vec![fx.art("hub")]
        );
    }

    #[test]
    fn test_consolidation_is_deterministic() {
        let mut first = hub_diamond();
        let mut second = hub_diamond();

        let r1 = consolidate(&mut first.graph).unwrap();
        let r2 = consolidate(&mut second.graph).unwrap();

        assert_eq!(r1, r2);
        assert_eq!(first.graph.edges(), second.graph.edges());
    }
}
