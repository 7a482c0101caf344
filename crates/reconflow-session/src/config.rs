use crate::node_state::LogTail;

/// Configuration for run sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
  /// Log lines kept per node. Older lines are discarded.
  pub log_tail_capacity: usize,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      log_tail_capacity: LogTail::DEFAULT_CAPACITY,
    }
  }
}
