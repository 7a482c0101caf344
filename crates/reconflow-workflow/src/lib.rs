//! Reconflow Workflow
//!
//! This crate provides the edit-time workflow graph: the nodes (tool
//! invocations with their parameters) and edges the user composes in the
//! builder.
//!
//! Key properties:
//! - Node and edge ids are assigned by the caller and never reassigned
//! - Every edge references nodes present in the same workflow
//! - Mutations either succeed completely or leave the graph unchanged
//! - Cycles are allowed while editing; [`Graph::topological_order`] reports
//!   them when a run is prepared

mod error;
mod graph;
mod node;
mod workflow;

pub use error::WorkflowError;
pub use graph::{CycleError, Graph};
pub use node::{NodeParams, WorkflowEdge, WorkflowNode, param_envelope};
pub use workflow::Workflow;
