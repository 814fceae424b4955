//! Link planning.
//!
//! This module turns a consolidated graph into the per-artifact link lines
//! handed to the external compiler/linker.

pub mod link_plan;

pub use link_plan::{
    render_inputs, DuplicateEmbedding, LinkInput, LinkInputKind, LinkPlan, LinkPlanEntry,
    LinkPlanOptions,
};
