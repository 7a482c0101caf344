//! Reconflow Store
//!
//! Save and load whole workflows by id. A workflow is always written in one
//! piece, in the same shape it is submitted for runs.

mod fs_store;

pub use fs_store::FsWorkflowStore;

use async_trait::async_trait;
use reconflow_workflow::Workflow;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested workflow was not found.
  #[error("workflow not found: {0}")]
  NotFound(String),

  /// The id cannot be used as a storage key.
  #[error("invalid workflow id '{0}'")]
  InvalidId(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid workflow document: {0}")]
  Json(#[from] serde_json::Error),

  /// A remote store failed.
  #[error("remote store error: {message}")]
  Remote { message: String },
}

/// Storage for workflows.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
  /// Create or replace a workflow.
  async fn save(&self, workflow: &Workflow) -> Result<(), StoreError>;

  /// Get a workflow by id.
  async fn get(&self, workflow_id: &str) -> Result<Workflow, StoreError>;

  /// List all stored workflows, ordered by id.
  async fn list(&self) -> Result<Vec<Workflow>, StoreError>;
}
