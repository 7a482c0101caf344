//! Wire format of the run event channel.
//!
//! Each text frame is one JSON object tagged by `type`:
//!
//! ```text
//! {"type":"log","node":"n1","stream":"stdout","line":"..."}
//! {"type":"node_status","node":"n1","status":"running","argv":["subfinder","-d","x"]}
//! {"type":"node_status","node":"n1","status":"ok","returncode":0,"out":"/runs/.../subs.txt"}
//! {"type":"run_status","status":"started","order":["n1","n2"]}
//! {"type":"run_status","status":"finished"}
//! ```

use serde::{Deserialize, Serialize};

use crate::node_state::NodeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
  Stdout,
  Stderr,
}

/// Run-level status reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Started,
  Finished,
  /// A node exited unsuccessfully and the backend stopped the run.
  Failed,
  /// The backend itself failed.
  Error,
}

/// One inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
  Log {
    node: String,
    line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stream: Option<LogStream>,
  },

  #[serde(alias = "node_status")]
  Status {
    node: String,
    status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    argv: Option<Vec<String>>,
    #[serde(default, rename = "returncode", skip_serializing_if = "Option::is_none")]
    exit_code: Option<i64>,
    #[serde(default, rename = "out", skip_serializing_if = "Option::is_none")]
    output: Option<String>,
  },

  RunStatus {
    status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
  },
}

impl ChannelMessage {
  pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  pub fn log(node: impl Into<String>, line: impl Into<String>) -> Self {
    Self::Log {
      node: node.into(),
      line: line.into(),
      stream: None,
    }
  }

  pub fn status(node: impl Into<String>, status: NodeStatus) -> Self {
    Self::Status {
      node: node.into(),
      status,
      argv: None,
      exit_code: None,
      output: None,
    }
  }

  pub fn run_status(status: RunStatus) -> Self {
    Self::RunStatus {
      status,
      order: None,
      error: None,
    }
  }

  /// The node this event targets, if it is a node event.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      Self::Log { node, .. } | Self::Status { node, .. } => Some(node),
      Self::RunStatus { .. } => None,
    }
  }
}
