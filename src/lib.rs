//! linkfold - diamond consolidation and link planning for native builds
//!
//! This crate provides the core library functionality for linkfold: the
//! artifact dependency graph, duplicate-embedding detection, graph
//! consolidation, and link plan emission.

pub mod builder;
pub mod consolidate;
pub mod core;
pub mod ops;
pub mod util;

/// Test fixtures for linkfold unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a small graph builder and the canonical diamond shapes.
#[cfg(test)]
pub mod test_support;

pub use builder::{LinkPlan, LinkPlanOptions};
pub use consolidate::{consolidate, detect, ConsolidateError, ConsolidationReport, DiamondFinding};
pub use core::{ArtifactId, ArtifactKind, BuildGraph, GraphError, PackageId, PackageKey, PackageSpec};
pub use ops::{GraphFile, PlanOptions};
