//! Core data structures for linkfold.
//!
//! This module contains the graph model the passes operate on:
//! - Package identity and specs
//! - Artifacts and their kinds
//! - The artifact dependency graph

pub mod artifact;
pub mod errors;
pub mod graph;
pub mod package;

pub use artifact::{Artifact, ArtifactId, ArtifactKind};
pub use errors::GraphError;
pub use graph::{BuildGraph, DependencyEdge, EdgeOrigin, EdgeState, EdgeView};
pub use package::{PackageId, PackageKey, PackageSpec, SourceOrigin};
