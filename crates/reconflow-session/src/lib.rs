//! Reconflow Run Session
//!
//! Submits a workflow snapshot to an execution backend and reconciles the
//! resulting event stream into per-node runtime state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SessionRunner                          │
//! │  - start(workflow, target, notifier) → RunHandle            │
//! │  - select! over the event channel and a CancellationToken   │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RunSession                           │
//! │  - Idle → Submitting → Streaming → Completed | Failed       │
//! │  - demultiplexes events by node id                          │
//! │  - reports changes to a SessionNotifier                     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    NodeRuntimeState                         │
//! │  - idle → running → ok | error (terminal)                   │
//! │  - bounded log tail                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod config;
mod error;
mod events;
mod message;
mod node_state;
mod runner;
mod session;
mod submission;

pub use backend::{EventChannel, RunBackend};
pub use config::SessionConfig;
pub use error::{
  ChannelError, SessionError, SessionFailure, SubmissionError, SubmissionIssue, SubmissionReason,
};
pub use events::{ChannelNotifier, NoopNotifier, SessionEvent, SessionNotifier};
pub use message::{ChannelMessage, LogStream, RunStatus};
pub use node_state::{LogTail, NodeRuntimeState, NodeStatus, StatusChange};
pub use runner::{RunHandle, RunTarget, SessionRunner};
pub use session::{RunSession, SessionPhase};
pub use submission::{RunRequest, SubmittedNode, SubmittedWorkflow, prepare_run};
