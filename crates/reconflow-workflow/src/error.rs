use thiserror::Error;

/// Structural errors raised by workflow mutations.
///
/// A mutation that returns one of these leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("edge not found: {0}")]
  EdgeNotFound(String),

  #[error("duplicate node id: {0}")]
  DuplicateNodeId(String),

  #[error("duplicate edge id: {0}")]
  DuplicateEdgeId(String),

  /// An edge endpoint does not exist in the graph.
  #[error("edge '{edge_id}' references unknown node(s): {}", missing.join(", "))]
  DanglingReference {
    edge_id: String,
    missing: Vec<String>,
  },
}
