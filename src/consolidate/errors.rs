//! Consolidation error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::GraphError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while rewriting the graph to remove diamonds.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ConsolidateError {
    #[error(
        "cannot consolidate duplicated package `{package}`: no common ancestor link boundary for {}",
        boundaries.join(", ")
    )]
    #[diagnostic(
        code(linkfold::consolidate::unresolvable),
        help("add an explicit dependency from every diverging boundary to one shared library, or configure a foundation")
    )]
    UnresolvableDuplication {
        package: String,
        converging_at: String,
        boundaries: Vec<String>,
        /// One rendered path per diverging boundary
        paths: Vec<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

impl ConsolidateError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConsolidateError::UnresolvableDuplication {
                package,
                converging_at,
                boundaries,
                paths,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "`{}` would be linked more than once into `{}`",
                    package, converging_at
                ));

                for boundary in boundaries {
                    diag = diag.with_context(format!("`{}` embeds its own copy", boundary));
                }
                for path in paths {
                    diag = diag.with_context(format!("path: {}", path));
                }

                diag.with_suggestion(format!(
                    "Make {} depend on one shared library that can own `{}`",
                    boundaries
                        .iter()
                        .map(|b| format!("`{}`", b))
                        .collect::<Vec<_>>()
                        .join(" and "),
                    package
                ))
                .with_suggestion(suggestions::CONFIGURE_FOUNDATION)
            }

            ConsolidateError::Graph(err) => err.to_diagnostic(),
        }
    }
}
