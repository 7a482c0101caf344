use async_trait::async_trait;

use crate::error::{ChannelError, SubmissionError};
use crate::submission::RunRequest;

/// The execution backend a session submits runs to.
#[async_trait]
pub trait RunBackend: Send + Sync {
  /// Submit a run and return the backend-assigned run id.
  async fn submit(&self, request: &RunRequest) -> Result<String, SubmissionError>;

  /// Open the event channel for a run.
  async fn connect(&self, run_id: &str) -> Result<Box<dyn EventChannel>, ChannelError>;
}

/// A long-lived stream of text frames for one run.
#[async_trait]
pub trait EventChannel: Send {
  /// The next frame, `None` once the channel has closed cleanly.
  async fn recv(&mut self) -> Option<Result<String, ChannelError>>;

  /// Close the channel and release its resources.
  async fn close(&mut self);
}
