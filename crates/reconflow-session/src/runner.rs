//! Drives a run session against an execution backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use reconflow_catalog::ToolCatalog;
use reconflow_workflow::Workflow;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::backend::{EventChannel, RunBackend};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::SessionNotifier;
use crate::session::RunSession;

/// Target of a run: the environment label and run-wide inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTarget {
  pub project: String,
  pub inputs: BTreeMap<String, String>,
}

impl RunTarget {
  pub fn new(project: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      inputs: BTreeMap::new(),
    }
  }

  pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.inputs.insert(key.into(), value.into());
    self
  }
}

/// Runs workflows on a backend, one fresh [`RunSession`] per run.
///
/// # Usage
///
/// ```ignore
/// let runner = SessionRunner::new(backend, catalog, SessionConfig::default());
/// let handle = runner.start(&workflow, RunTarget::new("acme"), notifier);
///
/// // Later, from a Ctrl-C handler or UI button
/// handle.stop();
///
/// let session = handle.wait().await?;
/// ```
pub struct SessionRunner<B: RunBackend> {
  backend: Arc<B>,
  catalog: Arc<ToolCatalog>,
  config: SessionConfig,
}

impl<B: RunBackend> Clone for SessionRunner<B> {
  fn clone(&self) -> Self {
    Self {
      backend: self.backend.clone(),
      catalog: self.catalog.clone(),
      config: self.config.clone(),
    }
  }
}

impl<B: RunBackend + 'static> SessionRunner<B> {
  pub fn new(backend: Arc<B>, catalog: Arc<ToolCatalog>, config: SessionConfig) -> Self {
    Self {
      backend,
      catalog,
      config,
    }
  }

  pub fn catalog(&self) -> &ToolCatalog {
    &self.catalog
  }

  /// Start a run in the background.
  pub fn start<N>(&self, workflow: &Workflow, target: RunTarget, notifier: N) -> RunHandle<N>
  where
    N: SessionNotifier + 'static,
  {
    let session = RunSession::with_notifier(workflow, self.config.clone(), notifier);
    let cancel = CancellationToken::new();
    let runner = self.clone();
    let task_cancel = cancel.clone();
    let task = tokio::spawn(async move { runner.execute(session, target, task_cancel).await });
    RunHandle { cancel, task }
  }

  /// Drive `session` from submission until it reaches a terminal phase.
  ///
  /// Never fails: every outcome is recorded on the returned session.
  #[instrument(
    name = "run_session",
    skip_all,
    fields(workflow_id = %session.workflow().id, project = %target.project)
  )]
  pub async fn execute<N: SessionNotifier>(
    &self,
    mut session: RunSession<N>,
    target: RunTarget,
    cancel: CancellationToken,
  ) -> RunSession<N> {
    let request = match session.begin_submission(&self.catalog, &target.project, target.inputs) {
      Ok(request) => request,
      Err(_) => return session,
    };

    let submitted = tokio::select! {
      _ = cancel.cancelled() => {
        session.cancel();
        return session;
      }
      result = self.backend.submit(&request) => result,
    };
    let run_id = match submitted {
      Ok(run_id) => run_id,
      Err(e) => {
        if let Err(err) = session.submission_rejected(e) {
          warn!(error = %err, "could not record submission rejection");
        }
        return session;
      }
    };
    if let Err(e) = session.start_streaming(&run_id) {
      warn!(run_id = %run_id, error = %e, "could not start streaming");
      return session;
    }

    let connected = tokio::select! {
      _ = cancel.cancelled() => {
        session.cancel();
        return session;
      }
      result = self.backend.connect(&run_id) => result,
    };
    let mut channel = match connected {
      Ok(channel) => channel,
      Err(e) => {
        session.channel_failed(e);
        return session;
      }
    };

    stream_events(&mut session, channel.as_mut(), &cancel).await;
    channel.close().await;

    info!(
      run_id = %run_id,
      phase = %session.phase(),
      dropped_events = session.dropped_events(),
      "run session finished"
    );
    session
  }
}

async fn stream_events<N: SessionNotifier>(
  session: &mut RunSession<N>,
  channel: &mut dyn EventChannel,
  cancel: &CancellationToken,
) {
  loop {
    tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        session.cancel();
        return;
      }
      frame = channel.recv() => match frame {
        Some(Ok(text)) => {
          session.apply_text(&text);
          if session.phase().is_terminal() {
            return;
          }
        }
        Some(Err(e)) => {
          session.channel_failed(e);
          return;
        }
        None => {
          session.channel_closed();
          return;
        }
      },
    }
  }
}

/// Handle to a run started with [`SessionRunner::start`].
pub struct RunHandle<N: SessionNotifier> {
  cancel: CancellationToken,
  task: JoinHandle<RunSession<N>>,
}

impl<N: SessionNotifier> RunHandle<N> {
  /// Stop the run. The session ends `Failed` with its node state intact.
  pub fn stop(&self) {
    self.cancel.cancel();
  }

  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Wait for the session to reach a terminal phase.
  pub async fn wait(self) -> Result<RunSession<N>, SessionError> {
    self.task.await.map_err(|e| SessionError::Task {
      message: e.to_string(),
    })
  }
}
