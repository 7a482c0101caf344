//! The run session state machine.
//!
//! ```text
//! Idle ──begin_submission──▶ Submitting ──start_streaming──▶ Streaming
//!                                │                               │
//!                       invalid or rejected             ┌────────┴────────┐
//!                                ▼                 clean close       abnormal close
//!                              Failed              or finished         or cancel
//!                                                       ▼                 ▼
//!                                                   Completed           Failed
//! ```
//!
//! A session is single use. Re-running a workflow creates a new session.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use reconflow_catalog::ToolCatalog;
use reconflow_workflow::Workflow;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{ChannelError, SessionError, SessionFailure, SubmissionError};
use crate::events::{NoopNotifier, SessionEvent, SessionNotifier};
use crate::message::{ChannelMessage, RunStatus};
use crate::node_state::{NodeRuntimeState, StatusChange};
use crate::submission::{RunRequest, prepare_run};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  Idle,
  Submitting,
  Streaming,
  Completed,
  Failed,
}

impl SessionPhase {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Failed)
  }
}

impl fmt::Display for SessionPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Idle => "idle",
      Self::Submitting => "submitting",
      Self::Streaming => "streaming",
      Self::Completed => "completed",
      Self::Failed => "failed",
    };
    f.write_str(s)
  }
}

/// The live execution context for one submitted workflow.
///
/// Holds a read-only snapshot of the workflow taken at creation, so edits to
/// the builder's workflow never reach a session. Node runtime state is owned
/// by the session and addressed by node id.
pub struct RunSession<N: SessionNotifier = NoopNotifier> {
  workflow: Arc<Workflow>,
  config: SessionConfig,
  notifier: N,
  phase: SessionPhase,
  run_id: Option<String>,
  request: Option<Arc<RunRequest>>,
  nodes: HashMap<String, NodeRuntimeState>,
  execution_order: Option<Vec<String>>,
  failure: Option<SessionFailure>,
  channel_open: bool,
  dropped_events: u64,
}

impl RunSession<NoopNotifier> {
  pub fn new(workflow: &Workflow, config: SessionConfig) -> Self {
    Self::with_notifier(workflow, config, NoopNotifier)
  }
}

impl<N: SessionNotifier> RunSession<N> {
  pub fn with_notifier(workflow: &Workflow, config: SessionConfig, notifier: N) -> Self {
    let workflow = Arc::new(workflow.clone());
    let nodes = fresh_nodes(&workflow, &config);
    Self {
      workflow,
      config,
      notifier,
      phase: SessionPhase::Idle,
      run_id: None,
      request: None,
      nodes,
      execution_order: None,
      failure: None,
      channel_open: false,
      dropped_events: 0,
    }
  }

  pub fn phase(&self) -> SessionPhase {
    self.phase
  }

  pub fn run_id(&self) -> Option<&str> {
    self.run_id.as_deref()
  }

  /// The workflow snapshot this session runs.
  pub fn workflow(&self) -> &Arc<Workflow> {
    &self.workflow
  }

  /// The bound and rendered request, once submission has been prepared.
  pub fn request(&self) -> Option<&Arc<RunRequest>> {
    self.request.as_ref()
  }

  pub fn node(&self, node_id: &str) -> Option<&NodeRuntimeState> {
    self.nodes.get(node_id)
  }

  /// All node states, ordered by node id.
  pub fn nodes(&self) -> BTreeMap<&str, &NodeRuntimeState> {
    self.nodes.iter().map(|(id, state)| (id.as_str(), state)).collect()
  }

  /// Execution order reported by the backend when the run started.
  pub fn execution_order(&self) -> Option<&[String]> {
    self.execution_order.as_deref()
  }

  pub fn failure(&self) -> Option<&SessionFailure> {
    self.failure.as_ref()
  }

  pub fn is_channel_open(&self) -> bool {
    self.channel_open
  }

  /// Events dropped because they were malformed or named an unknown node.
  pub fn dropped_events(&self) -> u64 {
    self.dropped_events
  }

  /// Whether every node has reached `ok` or `error`.
  pub fn all_nodes_terminal(&self) -> bool {
    self.nodes.values().all(|n| n.status().is_terminal())
  }

  /// `Idle → Submitting`: bind and render the snapshot.
  ///
  /// On a validation error the session moves straight to `Failed` and the
  /// error is returned.
  pub fn begin_submission(
    &mut self,
    catalog: &ToolCatalog,
    project: &str,
    inputs: BTreeMap<String, String>,
  ) -> Result<Arc<RunRequest>, SessionError> {
    self.expect_phase(SessionPhase::Idle, "submit")?;
    self.set_phase(SessionPhase::Submitting);

    match prepare_run(&self.workflow, catalog, project, inputs) {
      Ok(request) => {
        let request = Arc::new(request);
        self.request = Some(request.clone());
        Ok(request)
      }
      Err(e) => {
        info!(workflow_id = %self.workflow.id, error = %e, "run submission invalid");
        self.fail(SessionFailure::Submission(e.clone()));
        Err(SessionError::Submission(e))
      }
    }
  }

  /// `Submitting → Failed`: the backend refused the run.
  pub fn submission_rejected(&mut self, error: SubmissionError) -> Result<(), SessionError> {
    self.expect_phase(SessionPhase::Submitting, "reject submission")?;
    info!(workflow_id = %self.workflow.id, error = %error, "run submission rejected");
    self.fail(SessionFailure::Submission(error));
    Ok(())
  }

  /// `Submitting → Streaming`: the backend accepted the run.
  ///
  /// Every node starts the run `idle` with an empty log.
  pub fn start_streaming(&mut self, run_id: impl Into<String>) -> Result<(), SessionError> {
    self.expect_phase(SessionPhase::Submitting, "start streaming")?;
    let run_id = run_id.into();
    info!(workflow_id = %self.workflow.id, run_id = %run_id, "run accepted");

    self.nodes = fresh_nodes(&self.workflow, &self.config);
    self.run_id = Some(run_id);
    self.channel_open = true;
    self.set_phase(SessionPhase::Streaming);
    Ok(())
  }

  /// Apply one raw channel frame. Malformed frames are dropped.
  pub fn apply_text(&mut self, text: &str) {
    match ChannelMessage::parse(text) {
      Ok(message) => self.apply(message),
      Err(e) => {
        self.dropped_events += 1;
        info!(run_id = ?self.run_id, error = %e, "dropping malformed event");
      }
    }
  }

  /// Apply one decoded channel message.
  ///
  /// Only has an effect while streaming. Events for nodes outside the
  /// snapshot are dropped.
  pub fn apply(&mut self, message: ChannelMessage) {
    if self.phase != SessionPhase::Streaming {
      debug!(run_id = ?self.run_id, phase = %self.phase, "ignoring event outside streaming");
      return;
    }
    let run_id = self.run_id.clone().unwrap_or_default();

    match message {
      ChannelMessage::Log { node, line, .. } => {
        let Some(state) = self.nodes.get_mut(&node) else {
          self.drop_unknown(&node);
          return;
        };
        state.append_log(line.clone());
        self.notifier.notify(SessionEvent::NodeLog {
          run_id,
          node_id: node,
          line,
        });
      }
      ChannelMessage::Status {
        node,
        status,
        argv,
        exit_code,
        output,
      } => {
        let Some(state) = self.nodes.get_mut(&node) else {
          self.drop_unknown(&node);
          return;
        };
        match state.apply_status(status) {
          StatusChange::Changed { from, to } => {
            state.record_details(argv, exit_code, output);
            debug!(
              run_id = %run_id,
              node_id = %node,
              from = %from,
              to = %to,
              "node status changed"
            );
            self.notifier.notify(SessionEvent::NodeStatusChanged {
              run_id,
              node_id: node,
              from,
              to,
            });
          }
          StatusChange::Unchanged => state.record_details(argv, exit_code, output),
          StatusChange::Ignored { current } => {
            debug!(
              run_id = %run_id,
              node_id = %node,
              current = %current,
              requested = %status,
              "ignoring status regression"
            );
          }
        }
      }
      ChannelMessage::RunStatus { status, order, error } => match status {
        RunStatus::Started => {
          if let Some(order) = order {
            self.execution_order = Some(order);
          }
        }
        RunStatus::Finished => {
          self.channel_open = false;
          self.set_phase(SessionPhase::Completed);
        }
        RunStatus::Failed | RunStatus::Error => {
          let message = error.unwrap_or_else(|| "a node exited with an error".to_string());
          self.fail(SessionFailure::Backend { message });
        }
      },
    }
  }

  /// The channel closed cleanly.
  pub fn channel_closed(&mut self) {
    if self.phase != SessionPhase::Streaming {
      self.channel_open = false;
      return;
    }
    self.channel_open = false;
    self.set_phase(SessionPhase::Completed);
  }

  /// The channel failed.
  ///
  /// Fails the session unless every node had already finished. Nodes keep
  /// their last known status.
  pub fn channel_failed(&mut self, error: ChannelError) {
    if self.phase.is_terminal() {
      self.channel_open = false;
      return;
    }
    warn!(run_id = ?self.run_id, error = %error, "event channel failed");
    if self.phase == SessionPhase::Streaming && self.all_nodes_terminal() {
      self.channel_open = false;
      self.set_phase(SessionPhase::Completed);
    } else {
      self.fail(SessionFailure::Channel(error));
    }
  }

  /// User-initiated stop. Node state is kept for inspection.
  pub fn cancel(&mut self) {
    if self.phase.is_terminal() {
      return;
    }
    info!(run_id = ?self.run_id, "run cancelled");
    self.fail(SessionFailure::Cancelled);
  }

  fn fail(&mut self, failure: SessionFailure) {
    self.channel_open = false;
    self.failure = Some(failure);
    self.set_phase(SessionPhase::Failed);
  }

  fn set_phase(&mut self, phase: SessionPhase) {
    self.phase = phase;
    self.notifier.notify(SessionEvent::PhaseChanged {
      run_id: self.run_id.clone(),
      phase,
      failure: if phase == SessionPhase::Failed {
        self.failure.clone()
      } else {
        None
      },
    });
  }

  fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> Result<(), SessionError> {
    if self.phase == expected {
      Ok(())
    } else {
      Err(SessionError::InvalidTransition {
        phase: self.phase,
        action,
      })
    }
  }

  fn drop_unknown(&mut self, node_id: &str) {
    self.dropped_events += 1;
    info!(run_id = ?self.run_id, node_id = %node_id, "dropping event for unknown node");
  }
}

fn fresh_nodes(workflow: &Workflow, config: &SessionConfig) -> HashMap<String, NodeRuntimeState> {
  workflow
    .nodes()
    .into_iter()
    .map(|n| (n.id.clone(), NodeRuntimeState::new(config.log_tail_capacity)))
    .collect()
}
