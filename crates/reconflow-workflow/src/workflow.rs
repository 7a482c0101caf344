use std::collections::HashMap;

use reconflow_catalog::ParamValue;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node::{NodeParams, WorkflowEdge, WorkflowNode};

/// A named graph of tool nodes, as composed in the builder.
///
/// The workflow exclusively owns its nodes and edges. All mutations keep the
/// structural invariants (unique ids, no dangling edge endpoints) or fail
/// without changing anything.
///
/// Serialized with nodes and edges as arrays, in id order:
/// ```json
/// { "id": "wf-1", "name": "recon", "nodes": [...], "edges": [...] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDoc", into = "WorkflowDoc")]
pub struct Workflow {
  pub id: String,
  pub name: String,
  nodes: HashMap<String, WorkflowNode>,
  edges: Vec<WorkflowEdge>,
}

/// Wire form of a [`Workflow`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkflowDoc {
  id: String,
  name: String,
  #[serde(default)]
  nodes: Vec<WorkflowNode>,
  #[serde(default)]
  edges: Vec<WorkflowEdge>,
}

impl Workflow {
  /// Create an empty workflow.
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      nodes: HashMap::new(),
      edges: Vec::new(),
    }
  }

  /// Build a workflow from parts, validating every invariant.
  pub fn from_parts(
    id: impl Into<String>,
    name: impl Into<String>,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
  ) -> Result<Self, WorkflowError> {
    let mut workflow = Self::new(id, name);
    for node in nodes {
      workflow.add_node(node)?;
    }
    for edge in edges {
      workflow.add_edge(edge)?;
    }
    Ok(workflow)
  }

  /// Add a node. Fails if a node with the same id exists.
  pub fn add_node(&mut self, node: WorkflowNode) -> Result<(), WorkflowError> {
    if self.nodes.contains_key(&node.id) {
      return Err(WorkflowError::DuplicateNodeId(node.id));
    }
    self.nodes.insert(node.id.clone(), node);
    Ok(())
  }

  /// Remove a node together with every edge that touches it.
  pub fn remove_node(&mut self, node_id: &str) -> Result<WorkflowNode, WorkflowError> {
    let node = self
      .nodes
      .remove(node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;
    self.edges.retain(|edge| !edge.touches(node_id));
    Ok(node)
  }

  /// Add an edge. Both endpoints must exist; cycles are not checked here.
  pub fn add_edge(&mut self, edge: WorkflowEdge) -> Result<(), WorkflowError> {
    if self.edges.iter().any(|e| e.id == edge.id) {
      return Err(WorkflowError::DuplicateEdgeId(edge.id));
    }

    let mut missing = Vec::new();
    for endpoint in [&edge.source, &edge.target] {
      if !self.nodes.contains_key(endpoint) && !missing.contains(endpoint) {
        missing.push(endpoint.clone());
      }
    }
    if !missing.is_empty() {
      return Err(WorkflowError::DanglingReference {
        edge_id: edge.id,
        missing,
      });
    }

    self.edges.push(edge);
    Ok(())
  }

  /// Convenience for [`add_edge`](Self::add_edge) from ids.
  pub fn connect(
    &mut self,
    edge_id: impl Into<String>,
    source: impl Into<String>,
    target: impl Into<String>,
  ) -> Result<(), WorkflowError> {
    self.add_edge(WorkflowEdge::new(edge_id, source, target))
  }

  /// Remove an edge by id.
  pub fn remove_edge(&mut self, edge_id: &str) -> Result<WorkflowEdge, WorkflowError> {
    let index = self
      .edges
      .iter()
      .position(|e| e.id == edge_id)
      .ok_or_else(|| WorkflowError::EdgeNotFound(edge_id.to_string()))?;
    Ok(self.edges.remove(index))
  }

  /// Replace a node's parameter map.
  pub fn set_node_params(
    &mut self,
    node_id: &str,
    params: NodeParams,
  ) -> Result<(), WorkflowError> {
    self.node_mut(node_id)?.params = params;
    Ok(())
  }

  /// Set a single parameter on a node.
  pub fn set_node_param(
    &mut self,
    node_id: &str,
    name: impl Into<String>,
    value: ParamValue,
  ) -> Result<(), WorkflowError> {
    self.node_mut(node_id)?.params.insert(name.into(), value);
    Ok(())
  }

  /// Change a node's display label.
  pub fn set_node_label(
    &mut self,
    node_id: &str,
    label: impl Into<String>,
  ) -> Result<(), WorkflowError> {
    self.node_mut(node_id)?.label = label.into();
    Ok(())
  }

  fn node_mut(&mut self, node_id: &str) -> Result<&mut WorkflowNode, WorkflowError> {
    self
      .nodes
      .get_mut(node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&WorkflowNode> {
    self.nodes.get(node_id)
  }

  /// Nodes sorted by id.
  pub fn nodes(&self) -> Vec<&WorkflowNode> {
    let mut nodes: Vec<&WorkflowNode> = self.nodes.values().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    nodes
  }

  pub fn edges(&self) -> &[WorkflowEdge] {
    &self.edges
  }

  /// Edges whose source or target is `node_id`.
  pub fn edges_touching<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> {
    self.edges.iter().filter(move |e| e.touches(node_id))
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  /// Build the graph structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(self.nodes.values(), &self.edges)
  }
}

impl TryFrom<WorkflowDoc> for Workflow {
  type Error = WorkflowError;

  fn try_from(doc: WorkflowDoc) -> Result<Self, Self::Error> {
    Workflow::from_parts(doc.id, doc.name, doc.nodes, doc.edges)
  }
}

impl From<Workflow> for WorkflowDoc {
  fn from(workflow: Workflow) -> Self {
    let mut nodes: Vec<WorkflowNode> = workflow.nodes.into_values().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    Self {
      id: workflow.id,
      name: workflow.name,
      nodes,
      edges: workflow.edges,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn recon_workflow() -> Workflow {
    let mut wf = Workflow::new("wf-1", "recon");
    wf.add_node(WorkflowNode::new("n1", "subfinder")).unwrap();
    wf.add_node(WorkflowNode::new("n2", "httpx")).unwrap();
    wf.add_node(WorkflowNode::new("n3", "nuclei")).unwrap();
    wf.connect("e1", "n1", "n2").unwrap();
    wf.connect("e2", "n2", "n3").unwrap();
    wf
  }

  #[test]
  fn test_duplicate_node_rejected() {
    let mut wf = recon_workflow();
    let err = wf.add_node(WorkflowNode::new("n1", "nmap")).unwrap_err();

    assert_eq!(err, WorkflowError::DuplicateNodeId("n1".to_string()));
    assert_eq!(wf.get_node("n1").unwrap().tool, "subfinder");
    assert_eq!(wf.node_count(), 3);
  }

  #[test]
  fn test_remove_node_cascades_edges() {
    let mut wf = recon_workflow();
    let removed = wf.remove_node("n2").unwrap();

    assert_eq!(removed.tool, "httpx");
    assert_eq!(wf.node_count(), 2);
    assert_eq!(wf.edge_count(), 0);
    assert_eq!(wf.edges_touching("n2").count(), 0);
  }

  #[test]
  fn test_remove_missing_node() {
    let mut wf = recon_workflow();
    assert_eq!(
      wf.remove_node("n9").unwrap_err(),
      WorkflowError::NodeNotFound("n9".to_string())
    );
    assert_eq!(wf.edge_count(), 2);
  }

  #[test]
  fn test_add_edge_dangling_reference() {
    let mut wf = Workflow::new("wf", "single");
    wf.add_node(WorkflowNode::new("n1", "subfinder")).unwrap();

    let err = wf.connect("e1", "n1", "n404").unwrap_err();

    assert_eq!(
      err,
      WorkflowError::DanglingReference {
        edge_id: "e1".to_string(),
        missing: vec!["n404".to_string()],
      }
    );
    assert_eq!(wf.edge_count(), 0);
  }

  #[test]
  fn test_add_edge_both_endpoints_missing() {
    let mut wf = Workflow::new("wf", "empty");
    let err = wf.connect("e1", "a", "b").unwrap_err();
    assert!(matches!(
      err,
      WorkflowError::DanglingReference { missing, .. } if missing == ["a", "b"]
    ));
  }

  #[test]
  fn test_add_edge_allows_cycles() {
    let mut wf = recon_workflow();
    wf.connect("e3", "n3", "n1").unwrap();

    assert_eq!(wf.edge_count(), 3);
    assert!(!wf.graph().is_acyclic());
  }

  #[test]
  fn test_duplicate_edge_id_rejected() {
    let mut wf = recon_workflow();
    let err = wf.connect("e1", "n1", "n3").unwrap_err();
    assert_eq!(err, WorkflowError::DuplicateEdgeId("e1".to_string()));
    assert_eq!(wf.edge_count(), 2);
  }

  #[test]
  fn test_remove_edge() {
    let mut wf = recon_workflow();
    let edge = wf.remove_edge("e1").unwrap();
    assert_eq!(edge.source, "n1");
    assert_eq!(wf.edge_count(), 1);
    assert!(matches!(wf.remove_edge("e1"), Err(WorkflowError::EdgeNotFound(_))));
  }

  #[test]
  fn test_set_node_params() {
    let mut wf = recon_workflow();
    let mut params = NodeParams::new();
    params.insert("domain".to_string(), ParamValue::text("example.com"));

    wf.set_node_params("n1", params.clone()).unwrap();
    assert_eq!(wf.get_node("n1").unwrap().params, params);

    wf.set_node_param("n1", "all", ParamValue::Bool(true)).unwrap();
    assert_eq!(wf.get_node("n1").unwrap().params.len(), 2);

    assert!(matches!(
      wf.set_node_params("missing", NodeParams::new()),
      Err(WorkflowError::NodeNotFound(_))
    ));
  }

  #[test]
  fn test_serialize_round_trip() {
    let wf = recon_workflow();
    let value = serde_json::to_value(&wf).unwrap();

    assert_eq!(value["nodes"][0]["id"], "n1");
    assert_eq!(value["edges"][1], json!({"id": "e2", "source": "n2", "target": "n3"}));

    let back: Workflow = serde_json::from_value(value).unwrap();
    assert_eq!(back, wf);
  }

  #[test]
  fn test_deserialize_rejects_dangling_edge() {
    let result: Result<Workflow, _> = serde_json::from_value(json!({
      "id": "wf",
      "name": "broken",
      "nodes": [{"id": "n1", "tool": "httpx", "label": "probe"}],
      "edges": [{"id": "e1", "source": "n1", "target": "ghost"}]
    }));
    assert!(result.is_err());
  }
}
