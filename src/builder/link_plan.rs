//! Link plan generation.
//!
//! A LinkPlan lists, for every artifact in build order, the inputs the
//! external linker (or archiver) receives. Link boundaries get their full
//! embedding closure flattened into one line, with each physical output
//! listed once.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consolidate::embedding_closure;
use crate::core::{ArtifactId, ArtifactKind, BuildGraph, GraphError};
use crate::util::hash::{sha256_bytes, sha256_str};

/// Where outputs live and which platform naming they follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPlanOptions {
    /// Root of the build output tree
    pub out_dir: PathBuf,
    /// Target OS for library file naming ("linux", "macos", "windows")
    pub os: String,
}

impl Default for LinkPlanOptions {
    fn default() -> Self {
        LinkPlanOptions {
            out_dir: PathBuf::from("target").join("linkfold"),
            os: std::env::consts::OS.to_string(),
        }
    }
}

/// What a link input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkInputKind {
    /// The artifact's own compiled objects
    Objects,
    StaticArchive,
    DynamicLibrary,
}

/// A single input on a link line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInput {
    pub kind: LinkInputKind,
    pub artifact: ArtifactId,
    pub path: PathBuf,
}

/// The link inputs of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPlanEntry {
    pub artifact: ArtifactId,
    /// Display name like "leafx v1.0.0"
    pub name: String,
    pub kind: ArtifactKind,
    /// Files this artifact produces
    pub outputs: Vec<PathBuf>,
    /// Inputs in link order
    pub inputs: Vec<LinkInput>,
}

impl LinkPlanEntry {
    pub fn is_link_boundary(&self) -> bool {
        self.kind.is_link_boundary()
    }

    fn inputs_of_kind(&self, kind: LinkInputKind) -> impl Iterator<Item = &LinkInput> + '_ {
        self.inputs.iter().filter(move |i| i.kind == kind)
    }
}

/// A static artifact compiled into more than one boundary beneath the same
/// link boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEmbedding {
    pub converging_at: ArtifactId,
    pub artifact: ArtifactId,
    pub embedded_by: Vec<ArtifactId>,
}

/// Per-artifact link inputs for the whole graph, leaves first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPlan {
    pub entries: Vec<LinkPlanEntry>,
}

impl LinkPlan {
    /// Emit the plan for every artifact in the graph.
    pub fn emit(graph: &BuildGraph, opts: &LinkPlanOptions) -> Result<Self, GraphError> {
        let layout = Layout { graph, opts };
        let mut entries = Vec::new();

        for artifact in graph.topological_order()? {
            let kind = graph.artifact(artifact)?.kind;
            let mut inputs = vec![LinkInput {
                kind: LinkInputKind::Objects,
                artifact,
                path: layout.objects_dir(artifact),
            }];

            if kind.is_link_boundary() {
                let closure = embedding_closure(graph, artifact);
                inputs.extend(closure.embedded.iter().map(|&a| layout.link_input(a)));
                inputs.extend(closure.dynamic.iter().map(|&a| layout.link_input(a)));
            } else {
                let mut seen = BTreeSet::new();
                for (target, edge) in graph.dependency_edges(artifact) {
                    if edge.is_satisfied_via_ancestor() || !seen.insert(target) {
                        continue;
                    }
                    inputs.push(layout.link_input(target));
                }
            }

            entries.push(LinkPlanEntry {
                artifact,
                name: graph.describe(artifact),
                kind,
                outputs: layout.outputs(artifact),
                inputs,
            });
        }

        tracing::debug!("emitted link plan for {} artifact(s)", entries.len());

        Ok(LinkPlan { entries })
    }

    pub fn entry(&self, artifact: ArtifactId) -> Option<&LinkPlanEntry> {
        self.entries.iter().find(|e| e.artifact == artifact)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// sha256 of the compact JSON form; equal plans hash equal across runs.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        serde_json::to_vec(self).map(|bytes| sha256_bytes(&bytes))
    }

    /// Static artifacts embedded by two boundaries under one boundary.
    ///
    /// Works on the plan alone: a boundary's closure is itself plus every
    /// dynamic library reachable through the entries' inputs.
    pub fn duplicate_embeddings(&self) -> Vec<DuplicateEmbedding> {
        let by_id: BTreeMap<ArtifactId, &LinkPlanEntry> =
            self.entries.iter().map(|e| (e.artifact, e)).collect();
        let mut violations = Vec::new();

        for top in self.entries.iter().filter(|e| e.is_link_boundary()) {
            let mut boundaries = BTreeSet::new();
            let mut stack = vec![top.artifact];
            while let Some(current) = stack.pop() {
                if !boundaries.insert(current) {
                    continue;
                }
                if let Some(entry) = by_id.get(&current) {
                    stack.extend(
                        entry
                            .inputs_of_kind(LinkInputKind::DynamicLibrary)
                            .map(|i| i.artifact),
                    );
                }
            }

            let mut embedders: BTreeMap<ArtifactId, Vec<ArtifactId>> = BTreeMap::new();
            for boundary in &boundaries {
                if let Some(entry) = by_id.get(boundary) {
                    for input in entry.inputs_of_kind(LinkInputKind::StaticArchive) {
                        embedders.entry(input.artifact).or_default().push(*boundary);
                    }
                }
            }

            for (artifact, embedded_by) in embedders {
                if embedded_by.len() > 1 {
                    violations.push(DuplicateEmbedding {
                        converging_at: top.artifact,
                        artifact,
                        embedded_by,
                    });
                }
            }
        }

        violations
    }
}

struct Layout<'a> {
    graph: &'a BuildGraph,
    opts: &'a LinkPlanOptions,
}

impl Layout<'_> {
    /// `<out>/<name>-<version>`, plus a short source hash when another
    /// package shares the name and version.
    fn package_dir(&self, artifact: ArtifactId) -> PathBuf {
        let Ok(owner) = self.graph.artifact(artifact).map(|a| a.package) else {
            return self.opts.out_dir.join(artifact.to_string());
        };
        let Some(key) = self.graph.package_key(owner) else {
            return self.opts.out_dir.join(artifact.to_string());
        };
        let mut dir = format!("{}-{}", key.name, key.version);
        if self.graph.has_namesake(owner) {
            let digest = sha256_str(&key.source.to_string());
            dir.push('-');
            dir.push_str(&digest[..8]);
        }
        self.opts.out_dir.join(dir)
    }

    fn package_name(&self, artifact: ArtifactId) -> Option<(&str, String)> {
        let (key, _) = self.graph.sort_key(artifact)?;
        Some((key.name.as_str(), key.version.to_string()))
    }

    fn kind(&self, artifact: ArtifactId) -> ArtifactKind {
        self.graph
            .artifact(artifact)
            .map(|a| a.kind)
            .unwrap_or_default()
    }

    fn objects_dir(&self, artifact: ArtifactId) -> PathBuf {
        self.package_dir(artifact)
            .join("obj")
            .join(self.kind(artifact).as_str())
    }

    fn lib_path(&self, artifact: ArtifactId, file: String) -> PathBuf {
        self.package_dir(artifact).join("lib").join(file)
    }

    fn file_stem(&self, artifact: ArtifactId) -> String {
        self.package_name(artifact)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| artifact.to_string())
    }

    fn link_input(&self, artifact: ArtifactId) -> LinkInput {
        let kind = self.kind(artifact);
        let stem = self.file_stem(artifact);
        LinkInput {
            kind: if kind.is_link_boundary() {
                LinkInputKind::DynamicLibrary
            } else {
                LinkInputKind::StaticArchive
            },
            artifact,
            path: self.lib_path(artifact, kind.link_filename(&stem, &self.opts.os)),
        }
    }

    fn outputs(&self, artifact: ArtifactId) -> Vec<PathBuf> {
        let kind = self.kind(artifact);
        let stem = self.file_stem(artifact);
        let mut outputs = Vec::new();
        if kind.has_static_archive() {
            outputs.push(self.lib_path(artifact, kind.archive_filename(&stem, &self.opts.os)));
        }
        if kind.is_link_boundary() {
            outputs.push(self.lib_path(artifact, kind.link_filename(&stem, &self.opts.os)));
        }
        outputs
    }
}

/// Render a plan entry's inputs as one path per line, for `linkfold plan`.
pub fn render_inputs(entry: &LinkPlanEntry, base: Option<&Path>) -> Vec<String> {
    entry
        .inputs
        .iter()
        .map(|input| {
            let path = match base {
                Some(base) => input.path.strip_prefix(base).unwrap_or(&input.path),
                None => &input.path,
            };
            let tag = match input.kind {
                LinkInputKind::Objects => "obj",
                LinkInputKind::StaticArchive => "static",
                LinkInputKind::DynamicLibrary => "dylib",
            };
            format!("[{}] {}", tag, path.display())
        })
        .collect()
}
