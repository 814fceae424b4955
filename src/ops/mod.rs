//! High-level operations.
//!
//! This module contains the implementation of linkfold commands.

pub mod graph_file;
pub mod pipeline;

pub use graph_file::{
    resolve_package_ref, resolve_reference, DependencyRef, GraphFile, PackageRecord, PackageRef,
    GRAPH_FILE_NAME,
};
pub use pipeline::{
    check_file, explain, plan_file, plan_graph, ArtifactExplanation, CheckOutcome, Explanation,
    PlanOptions, PlanOutcome,
};
