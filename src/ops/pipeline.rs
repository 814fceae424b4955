//! The planning pipeline.
//!
//! Load, validate, consolidate and emit as one deterministic pass. Running
//! it twice over the same input yields byte-identical plans.

use anyhow::Result;

use crate::builder::{DuplicateEmbedding, LinkPlan, LinkPlanOptions};
use crate::consolidate::{
    consolidate, detect, embedders_of, ConsolidateError, ConsolidationReport, DiamondFinding,
};
use crate::core::{ArtifactId, BuildGraph, PackageId};
use crate::ops::graph_file::{resolve_reference, GraphFile};
use crate::util::Config;

/// Options for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Foundation set on the command line; beats the graph file's own
    pub foundation: Option<String>,

    /// Configured foundation, used when neither the command line nor the
    /// graph file names one
    pub default_foundation: Option<String>,

    pub link: LinkPlanOptions,
}

impl PlanOptions {
    pub fn from_config(config: &Config) -> Self {
        PlanOptions {
            foundation: None,
            default_foundation: config.plan.foundation.clone(),
            link: config.link_options(),
        }
    }

    fn foundation_for<'a>(&'a self, file: &'a GraphFile) -> Option<&'a str> {
        self.foundation
            .as_deref()
            .or(file.foundation.as_deref())
            .or(self.default_foundation.as_deref())
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The graph after consolidation
    pub graph: BuildGraph,
    pub report: ConsolidationReport,
    pub plan: LinkPlan,
    /// Static artifacts the emitted plan still embeds twice; empty unless
    /// consolidation missed a route
    pub duplicates: Vec<DuplicateEmbedding>,
}

/// Run the pipeline over an already-built graph.
pub fn plan_graph(
    mut graph: BuildGraph,
    link: &LinkPlanOptions,
) -> Result<PlanOutcome, ConsolidateError> {
    graph.validate_acyclic()?;

    let report = consolidate(&mut graph)?;
    let plan = LinkPlan::emit(&graph, link)?;

    let duplicates = plan.duplicate_embeddings();
    for dup in &duplicates {
        tracing::debug!(
            "{} is still embedded {} times beneath {}",
            graph.describe(dup.artifact),
            dup.embedded_by.len(),
            graph.describe(dup.converging_at)
        );
    }

    tracing::info!(
        "planned {} artifact(s), {} consolidation(s)",
        plan.len(),
        report.consolidations.len()
    );

    Ok(PlanOutcome {
        graph,
        report,
        plan,
        duplicates,
    })
}

/// Build the graph a file describes and run the pipeline over it.
pub fn plan_file(file: &GraphFile, opts: &PlanOptions) -> Result<PlanOutcome> {
    let graph = file.build_graph(opts.foundation_for(file))?;
    Ok(plan_graph(graph, &opts.link)?)
}

/// Detection only; the graph is left as declared.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub graph: BuildGraph,
    pub findings: Vec<DiamondFinding>,
}

pub fn check_file(file: &GraphFile, opts: &PlanOptions) -> Result<CheckOutcome> {
    let graph = file.build_graph(opts.foundation_for(file))?;
    let findings = detect(&graph)?;

    tracing::info!("found {} diamond(s)", findings.len());

    Ok(CheckOutcome { graph, findings })
}

/// Who ends up embedding a package's code after consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub package: PackageId,
    pub artifacts: Vec<ArtifactExplanation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactExplanation {
    pub artifact: ArtifactId,
    /// Each embedding boundary with its path down to the artifact
    pub embedded_by: Vec<(ArtifactId, Vec<ArtifactId>)>,
    /// Dependency edges into the artifact that an ancestor now satisfies
    pub satisfied_from: Vec<(ArtifactId, ArtifactId)>,
}

/// Explain where `reference` (`name` or `name@version`) is linked.
pub fn explain(outcome: &PlanOutcome, reference: &str) -> Result<Explanation> {
    let graph = &outcome.graph;
    let package = resolve_reference(graph, reference, None)?;

    let mut artifacts = Vec::new();
    for &artifact in graph.artifacts_of(package)? {
        let embedded_by = embedders_of(graph, artifact)
            .into_iter()
            .map(|boundary| {
                let path = graph
                    .path_between(boundary, artifact)
                    .unwrap_or_else(|| vec![boundary]);
                (boundary, path)
            })
            .collect();

        let satisfied_from = graph
            .dependents_of(artifact)
            .into_iter()
            .filter_map(|from| {
                let ancestor = graph.edge(from, artifact)?.state.ancestor()?;
                Some((from, ancestor))
            })
            .collect();

        artifacts.push(ArtifactExplanation {
            artifact,
            embedded_by,
            satisfied_from,
        });
    }

    Ok(Explanation { package, artifacts })
}
