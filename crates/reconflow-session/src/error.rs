use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionPhase;

/// Why a run could not be started.
///
/// Lists every offending node, not just the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("run submission rejected: {}", summarize(.issues))]
pub struct SubmissionError {
  pub issues: Vec<SubmissionIssue>,
}

impl SubmissionError {
  pub fn new(issues: Vec<SubmissionIssue>) -> Self {
    Self { issues }
  }

  /// A single issue not tied to any node.
  pub fn rejected(message: impl Into<String>) -> Self {
    Self::new(vec![SubmissionIssue {
      node_id: None,
      reason: SubmissionReason::Rejected {
        message: message.into(),
      },
    }])
  }

  /// Ids of the nodes named by at least one issue, in issue order.
  pub fn node_ids(&self) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for id in self.issues.iter().filter_map(|i| i.node_id.as_deref()) {
      if !ids.contains(&id) {
        ids.push(id);
      }
    }
    ids
  }
}

fn summarize(issues: &[SubmissionIssue]) -> String {
  issues
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

/// One reason a submission was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionIssue {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_id: Option<String>,
  pub reason: SubmissionReason,
}

impl SubmissionIssue {
  pub fn for_node(node_id: impl Into<String>, reason: SubmissionReason) -> Self {
    Self {
      node_id: Some(node_id.into()),
      reason,
    }
  }
}

impl fmt::Display for SubmissionIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.node_id {
      Some(node_id) => write!(f, "node '{}': {}", node_id, self.reason),
      None => write!(f, "{}", self.reason),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionReason {
  #[error("workflow contains a cycle through {}", .nodes.join(", "))]
  Cycle { nodes: Vec<String> },

  #[error("unknown tool '{tool}'")]
  UnknownTool { tool: String },

  #[error("required argument '{arg}' is empty")]
  MissingRequired { arg: String },

  #[error("argument '{arg}' is invalid: {message}")]
  InvalidParam { arg: String, message: String },

  #[error("workflow has no nodes")]
  EmptyWorkflow,

  /// Rejected by the execution backend for a reason it did not classify.
  #[error("{message}")]
  Rejected { message: String },

  /// The execution backend could not be reached.
  #[error("execution backend unavailable: {message}")]
  Unavailable { message: String },
}

/// Errors raised by an event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelError {
  #[error("failed to open event channel: {message}")]
  Connect { message: String },

  #[error("event channel disconnected: {message}")]
  Disconnected { message: String },
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum SessionFailure {
  #[error(transparent)]
  Submission(SubmissionError),

  #[error(transparent)]
  Channel(ChannelError),

  /// The backend reported that the run failed.
  #[error("run failed: {message}")]
  Backend { message: String },

  #[error("run cancelled")]
  Cancelled,
}

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
  #[error("cannot {action} while session is {phase}")]
  InvalidTransition {
    phase: SessionPhase,
    action: &'static str,
  },

  /// The workflow failed validation. The session is now `Failed`.
  #[error(transparent)]
  Submission(#[from] SubmissionError),

  #[error("session task failed: {message}")]
  Task { message: String },
}
