//! Session events and notifiers.
//!
//! A session reports every phase change, node status change and log line to
//! its notifier, so a presentation layer can render state without polling.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::SessionFailure;
use crate::node_state::NodeStatus;
use crate::session::SessionPhase;

/// Events emitted by a run session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
  /// The session moved to a new phase.
  PhaseChanged {
    run_id: Option<String>,
    phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<SessionFailure>,
  },

  /// A node's status changed.
  NodeStatusChanged {
    run_id: String,
    node_id: String,
    from: NodeStatus,
    to: NodeStatus,
  },

  /// A log line was appended to a node.
  NodeLog {
    run_id: String,
    node_id: String,
    line: String,
  },
}

/// Receives session events.
pub trait SessionNotifier: Send + Sync {
  fn notify(&self, event: SessionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl SessionNotifier for NoopNotifier {
  fn notify(&self, _event: SessionEvent) {}
}

/// A notifier that forwards events to an unbounded channel.
///
/// Sending never blocks the session.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<SessionEvent>) -> Self {
    Self { sender }
  }
}

impl SessionNotifier for ChannelNotifier {
  fn notify(&self, event: SessionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

impl<N: SessionNotifier + ?Sized> SessionNotifier for std::sync::Arc<N> {
  fn notify(&self, event: SessionEvent) {
    (**self).notify(event);
  }
}
