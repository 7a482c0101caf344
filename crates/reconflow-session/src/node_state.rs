//! Per-node runtime state driven by channel events.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution status of one node within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  #[default]
  Idle,
  Running,
  Ok,
  Error,
}

impl NodeStatus {
  /// `Ok` and `Error` end a node's run.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Ok | Self::Error)
  }
}

impl fmt::Display for NodeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Idle => "idle",
      Self::Running => "running",
      Self::Ok => "ok",
      Self::Error => "error",
    };
    f.write_str(s)
  }
}

/// Bounded tail of log lines. Oldest lines are discarded once full.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTail {
  lines: VecDeque<String>,
  capacity: usize,
  dropped: u64,
}

impl LogTail {
  pub const DEFAULT_CAPACITY: usize = 400;

  pub fn new(capacity: usize) -> Self {
    Self {
      lines: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
      capacity,
      dropped: 0,
    }
  }

  pub fn push(&mut self, line: impl Into<String>) {
    if self.capacity == 0 {
      self.dropped += 1;
      return;
    }
    if self.lines.len() == self.capacity {
      self.lines.pop_front();
      self.dropped += 1;
    }
    self.lines.push_back(line.into());
  }

  pub fn lines(&self) -> impl Iterator<Item = &str> {
    self.lines.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Number of lines discarded to stay within capacity.
  pub fn dropped(&self) -> u64 {
    self.dropped
  }
}

impl Default for LogTail {
  fn default() -> Self {
    Self::new(Self::DEFAULT_CAPACITY)
  }
}

/// Result of applying a status event to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
  Changed { from: NodeStatus, to: NodeStatus },
  /// Same status as before.
  Unchanged,
  /// The node is terminal, or the event would move it backwards.
  Ignored { current: NodeStatus },
}

/// Status and log tail for one node in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRuntimeState {
  status: NodeStatus,
  logs: LogTail,
  argv: Option<Vec<String>>,
  exit_code: Option<i64>,
  output: Option<String>,
}

impl NodeRuntimeState {
  pub fn new(log_capacity: usize) -> Self {
    Self {
      status: NodeStatus::Idle,
      logs: LogTail::new(log_capacity),
      argv: None,
      exit_code: None,
      output: None,
    }
  }

  pub fn status(&self) -> NodeStatus {
    self.status
  }

  pub fn logs(&self) -> &LogTail {
    &self.logs
  }

  /// The argument vector the backend reported when it started the node.
  pub fn argv(&self) -> Option<&[String]> {
    self.argv.as_deref()
  }

  pub fn exit_code(&self) -> Option<i64> {
    self.exit_code
  }

  /// Output file the node produced, if the backend reported one.
  pub fn output(&self) -> Option<&str> {
    self.output.as_deref()
  }

  pub fn append_log(&mut self, line: impl Into<String>) {
    self.logs.push(line);
  }

  /// Apply a status event.
  ///
  /// Terminal statuses are final: once `Ok` or `Error`, later events are
  /// ignored. A running node never returns to `Idle`.
  pub fn apply_status(&mut self, status: NodeStatus) -> StatusChange {
    let current = self.status;
    if current == status {
      return StatusChange::Unchanged;
    }
    if current.is_terminal() || status == NodeStatus::Idle {
      return StatusChange::Ignored { current };
    }
    self.status = status;
    StatusChange::Changed {
      from: current,
      to: status,
    }
  }

  /// Record the details carried by a status event.
  ///
  /// Only fields present on the event overwrite what is stored.
  pub(crate) fn record_details(
    &mut self,
    argv: Option<Vec<String>>,
    exit_code: Option<i64>,
    output: Option<String>,
  ) {
    if argv.is_some() {
      self.argv = argv;
    }
    if exit_code.is_some() {
      self.exit_code = exit_code;
    }
    if output.is_some() {
      self.output = output;
    }
  }
}

impl Default for NodeRuntimeState {
  fn default() -> Self {
    Self::new(LogTail::DEFAULT_CAPACITY)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_initial_state_is_idle() {
    let state = NodeRuntimeState::default();
    assert_eq!(state.status(), NodeStatus::Idle);
    assert!(state.logs().is_empty());
  }

  #[test]
  fn test_forward_transitions() {
    let mut state = NodeRuntimeState::default();
    assert_eq!(
      state.apply_status(NodeStatus::Running),
      StatusChange::Changed {
        from: NodeStatus::Idle,
        to: NodeStatus::Running
      }
    );
    assert_eq!(state.apply_status(NodeStatus::Running), StatusChange::Unchanged);
    assert_eq!(
      state.apply_status(NodeStatus::Ok),
      StatusChange::Changed {
        from: NodeStatus::Running,
        to: NodeStatus::Ok
      }
    );
  }

  #[test]
  fn test_idle_may_jump_to_terminal() {
    let mut state = NodeRuntimeState::default();
    state.apply_status(NodeStatus::Error);
    assert_eq!(state.status(), NodeStatus::Error);
  }

  #[test]
  fn test_terminal_never_regresses() {
    for terminal in [NodeStatus::Ok, NodeStatus::Error] {
      let mut state = NodeRuntimeState::default();
      state.apply_status(NodeStatus::Running);
      state.apply_status(terminal);

      for late in [NodeStatus::Running, NodeStatus::Idle, NodeStatus::Ok, NodeStatus::Error] {
        state.apply_status(late);
        assert_eq!(state.status(), terminal);
      }
    }
  }

  #[test]
  fn test_running_does_not_return_to_idle() {
    let mut state = NodeRuntimeState::default();
    state.apply_status(NodeStatus::Running);
    assert_eq!(
      state.apply_status(NodeStatus::Idle),
      StatusChange::Ignored {
        current: NodeStatus::Running
      }
    );
  }

  #[test]
  fn test_log_tail_is_bounded() {
    let mut tail = LogTail::new(3);
    for i in 0..5 {
      tail.push(format!("line {}", i));
    }
    assert_eq!(tail.lines().collect::<Vec<_>>(), vec!["line 2", "line 3", "line 4"]);
    assert_eq!(tail.dropped(), 2);
  }

  #[test]
  fn test_logs_independent_of_status() {
    let mut state = NodeRuntimeState::default();
    state.apply_status(NodeStatus::Ok);
    state.append_log("late line");
    assert_eq!(state.logs().len(), 1);
    assert_eq!(state.status(), NodeStatus::Ok);
  }

  #[test]
  fn test_record_details_keeps_earlier_fields() {
    let mut state = NodeRuntimeState::default();
    state.record_details(Some(vec!["httpx".to_string()]), None, None);
    state.record_details(None, Some(0), Some("out.txt".to_string()));

    assert_eq!(state.argv(), Some(&["httpx".to_string()][..]));
    assert_eq!(state.exit_code(), Some(0));
    assert_eq!(state.output(), Some("out.txt"));
  }
}
