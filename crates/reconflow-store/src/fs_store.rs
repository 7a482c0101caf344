use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reconflow_workflow::Workflow;
use tokio::fs;
use tracing::{info, warn};

use crate::{StoreError, WorkflowStore};

/// Filesystem-based workflow store.
///
/// One JSON document per workflow:
/// ```text
/// {root}/
/// ├── wf-recon.json
/// └── wf-web.json
/// ```
pub struct FsWorkflowStore {
  root: PathBuf,
}

impl FsWorkflowStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path_for(&self, workflow_id: &str) -> Result<PathBuf, StoreError> {
    let valid = !workflow_id.is_empty()
      && workflow_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
      && !workflow_id.starts_with('.');
    if !valid {
      return Err(StoreError::InvalidId(workflow_id.to_string()));
    }
    Ok(self.root.join(format!("{}.json", workflow_id)))
  }
}

#[async_trait]
impl WorkflowStore for FsWorkflowStore {
  async fn save(&self, workflow: &Workflow) -> Result<(), StoreError> {
    let path = self.path_for(&workflow.id)?;
    fs::create_dir_all(&self.root).await?;

    let content = serde_json::to_vec_pretty(workflow)?;
    // Write then rename so a reader never sees a partial document
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, &path).await?;

    info!(workflow_id = %workflow.id, path = %path.display(), "workflow saved");
    Ok(())
  }

  async fn get(&self, workflow_id: &str) -> Result<Workflow, StoreError> {
    let path = self.path_for(workflow_id)?;
    let content = match fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(StoreError::NotFound(workflow_id.to_string()));
      }
      Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
  }

  async fn list(&self) -> Result<Vec<Workflow>, StoreError> {
    let mut workflows = Vec::new();
    if !self.root.exists() {
      return Ok(workflows);
    }

    let mut entries = fs::read_dir(&self.root).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some("json") {
        continue;
      }
      let content = fs::read_to_string(&path).await?;
      match serde_json::from_str::<Workflow>(&content) {
        Ok(workflow) => workflows.push(workflow),
        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable workflow"),
      }
    }

    workflows.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(workflows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reconflow_catalog::ParamValue;
  use reconflow_workflow::WorkflowNode;
  use tempfile::TempDir;

  fn workflow(id: &str) -> Workflow {
    let mut wf = Workflow::new(id, "recon");
    wf.add_node(
      WorkflowNode::new("n1", "subfinder").with_param("domain", ParamValue::text("a.com")),
    )
    .unwrap();
    wf.add_node(WorkflowNode::new("n2", "httpx")).unwrap();
    wf.connect("e1", "n1", "n2").unwrap();
    wf
  }

  #[tokio::test]
  async fn test_save_and_get() {
    let temp = TempDir::new().unwrap();
    let store = FsWorkflowStore::new(temp.path().join("workflows"));

    let wf = workflow("wf-1");
    store.save(&wf).await.unwrap();

    let loaded = store.get("wf-1").await.unwrap();
    assert_eq!(loaded, wf);
    assert!(temp.path().join("workflows/wf-1.json").exists());
  }

  #[tokio::test]
  async fn test_save_replaces() {
    let temp = TempDir::new().unwrap();
    let store = FsWorkflowStore::new(temp.path());

    let mut wf = workflow("wf-1");
    store.save(&wf).await.unwrap();
    wf.remove_node("n2").unwrap();
    store.save(&wf).await.unwrap();

    let loaded = store.get("wf-1").await.unwrap();
    assert_eq!(loaded.node_count(), 1);
    assert_eq!(loaded.edge_count(), 0);
  }

  #[tokio::test]
  async fn test_get_missing() {
    let temp = TempDir::new().unwrap();
    let store = FsWorkflowStore::new(temp.path());

    let result = store.get("nope").await;
    assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "nope"));
  }

  #[tokio::test]
  async fn test_list_sorted_and_skips_other_files() {
    let temp = TempDir::new().unwrap();
    let store = FsWorkflowStore::new(temp.path());

    store.save(&workflow("wf-b")).await.unwrap();
    store.save(&workflow("wf-a")).await.unwrap();
    std::fs::write(temp.path().join("notes.txt"), "hi").unwrap();
    std::fs::write(temp.path().join("broken.json"), "{").unwrap();

    let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|w| w.id).collect();
    assert_eq!(ids, vec!["wf-a", "wf-b"]);
  }

  #[tokio::test]
  async fn test_list_missing_root() {
    let temp = TempDir::new().unwrap();
    let store = FsWorkflowStore::new(temp.path().join("absent"));
    assert!(store.list().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_rejects_path_like_ids() {
    let temp = TempDir::new().unwrap();
    let store = FsWorkflowStore::new(temp.path());

    for id in ["../escape", "a/b", "", ".hidden"] {
      assert!(matches!(store.get(id).await, Err(StoreError::InvalidId(_))));
    }
  }
}
