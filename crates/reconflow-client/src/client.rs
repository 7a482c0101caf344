use async_trait::async_trait;
use reconflow_catalog::{CatalogError, CatalogSource, ToolDef};
use reconflow_session::{ChannelError, EventChannel, RunBackend, RunRequest, SubmissionError};
use reconflow_store::{StoreError, WorkflowStore};
use reconflow_workflow::Workflow;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::rejection::{submission_error, unavailable};
use crate::ws::WsChannel;

#[derive(Debug, Deserialize)]
struct ToolsResponse {
  tools: Vec<ToolDef>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
  run_id: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowsResponse {
  workflows: Vec<Workflow>,
}

/// Client for the execution backend's HTTP API and run event channels.
///
/// | Operation      | Endpoint                  |
/// |----------------|---------------------------|
/// | catalog fetch  | `GET  /api/tools`         |
/// | run submission | `POST /api/run`           |
/// | event channel  | `WS   /ws/run/{run_id}`   |
/// | save workflow  | `POST /api/workflows`     |
/// | list workflows | `GET  /api/workflows`     |
/// | get workflow   | `GET  /api/workflows/{id}`|
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: Client,
  config: ClientConfig,
}

impl ApiClient {
  pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
    let http = Client::builder().timeout(config.request_timeout).build()?;
    Ok(Self { http, config })
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub async fn fetch_tools(&self) -> Result<Vec<ToolDef>, ClientError> {
    let url = self.config.api_url(&["api", "tools"])?;
    let response = self.http.get(url).send().await?;
    let body: ToolsResponse = read_json(response).await?;
    Ok(body.tools)
  }

  pub async fn save_workflow(&self, workflow: &Workflow) -> Result<(), ClientError> {
    let url = self.config.api_url(&["api", "workflows"])?;
    let response = self.http.post(url).json(workflow).send().await?;
    ensure_success(response).await?;
    Ok(())
  }

  pub async fn list_workflows(&self) -> Result<Vec<Workflow>, ClientError> {
    let url = self.config.api_url(&["api", "workflows"])?;
    let response = self.http.get(url).send().await?;
    let body: WorkflowsResponse = read_json(response).await?;
    Ok(body.workflows)
  }

  pub async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow, ClientError> {
    let url = self.config.api_url(&["api", "workflows", workflow_id])?;
    let response = self.http.get(url).send().await?;
    read_json(response).await
  }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  Err(ClientError::Status {
    status: status.as_u16(),
    body,
  })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
  let response = ensure_success(response).await?;
  Ok(response.json().await?)
}

#[async_trait]
impl CatalogSource for ApiClient {
  async fn fetch(&self) -> Result<Vec<ToolDef>, CatalogError> {
    self.fetch_tools().await.map_err(|e| CatalogError::fetch(e.to_string()))
  }
}

#[async_trait]
impl RunBackend for ApiClient {
  #[instrument(skip_all, fields(workflow_id = %request.workflow.id, project = %request.project))]
  async fn submit(&self, request: &RunRequest) -> Result<String, SubmissionError> {
    let url = self
      .config
      .api_url(&["api", "run"])
      .map_err(|e| unavailable(e.to_string()))?;
    let response = self
      .http
      .post(url)
      .json(request)
      .send()
      .await
      .map_err(|e| unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(submission_error(status.as_u16(), &body));
    }

    let body: RunResponse = response
      .json()
      .await
      .map_err(|e| unavailable(format!("unreadable run response: {}", e)))?;
    info!(run_id = %body.run_id, "run submitted");
    Ok(body.run_id)
  }

  async fn connect(&self, run_id: &str) -> Result<Box<dyn EventChannel>, ChannelError> {
    let url = self
      .config
      .event_channel_url(run_id)
      .map_err(|e| ChannelError::Connect {
        message: e.to_string(),
      })?;
    let channel = WsChannel::connect(&url).await?;
    Ok(Box::new(channel))
  }
}

#[async_trait]
impl WorkflowStore for ApiClient {
  async fn save(&self, workflow: &Workflow) -> Result<(), StoreError> {
    self.save_workflow(workflow).await.map_err(remote)
  }

  async fn get(&self, workflow_id: &str) -> Result<Workflow, StoreError> {
    match self.get_workflow(workflow_id).await {
      Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
        Err(StoreError::NotFound(workflow_id.to_string()))
      }
      result => result.map_err(remote),
    }
  }

  async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
    let mut workflows = self.list_workflows().await.map_err(remote)?;
    workflows.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(workflows)
  }
}

fn remote(e: ClientError) -> StoreError {
  StoreError::Remote {
    message: e.to_string(),
  }
}
