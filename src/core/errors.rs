//! Build graph error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A structural problem with the input graph.
///
/// None of these are retried: the graph itself must change before the
/// outcome can.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum GraphError {
    #[error("cycle detected in dependency graph: {}", cycle.join(" -> "))]
    #[diagnostic(code(linkfold::graph::cycle))]
    Cycle { cycle: Vec<String> },

    #[error("unknown package `{package}`")]
    #[diagnostic(code(linkfold::graph::unknown_package))]
    UnknownPackage {
        package: String,
        referenced_by: Option<String>,
    },

    #[error("unknown artifact `{artifact}`")]
    #[diagnostic(code(linkfold::graph::unknown_artifact))]
    UnknownArtifact { artifact: String },

    #[error("package `{package}` is registered more than once")]
    #[diagnostic(code(linkfold::graph::duplicate_package))]
    DuplicatePackage { package: String },

    #[error("package `{package}` declares no artifacts")]
    #[diagnostic(code(linkfold::graph::no_artifacts))]
    NoArtifacts { package: String },
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::Cycle { cycle } => Diagnostic::error("cycle detected in dependency graph")
                .with_context(format!("cycle: {}", cycle.join(" -> ")))
                .with_suggestion(
                    "Break the cycle by removing or restructuring dependencies".to_string(),
                ),

            GraphError::UnknownPackage {
                package,
                referenced_by,
            } => {
                let mut diag = Diagnostic::error(format!("unknown package `{}`", package));

                if let Some(requirer) = referenced_by {
                    diag = diag.with_context(format!("required by `{}`", requirer));
                }

                diag.with_suggestion(format!("Register `{}` in the graph before depending on it", package))
                    .with_suggestion(suggestions::PACKAGE_REFERENCE)
            }

            GraphError::UnknownArtifact { artifact } => {
                Diagnostic::error(format!("unknown artifact `{}`", artifact))
                    .with_context("the artifact handle does not belong to this graph")
            }

            GraphError::DuplicatePackage { package } => {
                Diagnostic::error(format!("package `{}` is registered more than once", package))
                    .with_context("every (name, version, source) must appear exactly once in a resolved graph")
                    .with_suggestion("Remove the duplicate entry or fix its version/source")
            }

            GraphError::NoArtifacts { package } => {
                Diagnostic::error(format!("package `{}` declares no artifacts", package))
                    .with_suggestion("Declare at least one of: static-only, dynamic-only, paired")
            }
        }
    }
}
