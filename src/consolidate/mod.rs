//! Diamond detection and consolidation.
//!
//! This module finds packages whose compiled code would be linked more
//! than once beneath a single link boundary, and rewrites the graph so
//! each such package is owned by one shared ancestor.

pub mod detect;
pub mod errors;
pub mod planner;

pub use detect::{detect, embedders_of, embedding_closure, DiamondFinding, EmbeddingClosure};
pub use errors::ConsolidateError;
pub use planner::{consolidate, Consolidation, ConsolidationReport};
