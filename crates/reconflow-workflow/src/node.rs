use std::collections::HashMap;

use reconflow_catalog::ParamValue;
use serde::{Deserialize, Serialize};

/// Parameters the user has set on a node, keyed by argument name.
pub type NodeParams = HashMap<String, ParamValue>;

/// One tool invocation in a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
  pub id: String,

  /// Catalog id of the tool this node runs.
  pub tool: String,

  pub label: String,

  /// Only the arguments the user has touched. Unset arguments fall back to
  /// catalog defaults when the node is bound.
  #[serde(default, with = "param_envelope")]
  pub params: NodeParams,
}

impl WorkflowNode {
  /// Create a node with no parameters, labelled with the tool id.
  pub fn new(id: impl Into<String>, tool: impl Into<String>) -> Self {
    let tool = tool.into();
    Self {
      id: id.into(),
      label: tool.clone(),
      tool,
      params: HashMap::new(),
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = label.into();
    self
  }

  pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
    self.params.insert(name.into(), value);
    self
  }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
  pub id: String,
  pub source: String,
  pub target: String,
}

impl WorkflowEdge {
  pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      source: source.into(),
      target: target.into(),
    }
  }

  /// Whether either endpoint is `node_id`.
  pub fn touches(&self, node_id: &str) -> bool {
    self.source == node_id || self.target == node_id
  }
}

/// Serializes params in the `{ "name": { "value": ... } }` shape the builder
/// and the backend exchange.
pub mod param_envelope {
  use std::collections::{BTreeMap, HashMap};

  use reconflow_catalog::ParamValue;
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  #[derive(Serialize)]
  struct EnvelopeRef<'a> {
    value: &'a ParamValue,
  }

  #[derive(Deserialize)]
  struct Envelope {
    #[serde(default)]
    value: ParamValue,
  }

  pub fn serialize<S: Serializer>(
    params: &HashMap<String, ParamValue>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    let sorted: BTreeMap<&String, EnvelopeRef<'_>> = params
      .iter()
      .map(|(name, value)| (name, EnvelopeRef { value }))
      .collect();
    sorted.serialize(serializer)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<HashMap<String, ParamValue>, D::Error> {
    let raw: HashMap<String, Envelope> = HashMap::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(name, env)| (name, env.value)).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_params_use_value_envelope() {
    let node =
      WorkflowNode::new("n1", "subfinder").with_param("domain", ParamValue::text("example.com"));

    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(
      value,
      json!({
        "id": "n1",
        "tool": "subfinder",
        "label": "subfinder",
        "params": { "domain": { "value": "example.com" } }
      })
    );

    let back: WorkflowNode = serde_json::from_value(value).unwrap();
    assert_eq!(back, node);
  }

  #[test]
  fn test_missing_params_default_to_empty() {
    let node: WorkflowNode =
      serde_json::from_value(json!({"id": "n1", "tool": "httpx", "label": "probe"})).unwrap();
    assert!(node.params.is_empty());
  }

  #[test]
  fn test_edge_touches() {
    let edge = WorkflowEdge::new("e1", "a", "b");
    assert!(edge.touches("a"));
    assert!(edge.touches("b"));
    assert!(!edge.touches("c"));
  }
}
