use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;

use crate::node::{WorkflowEdge, WorkflowNode};

/// The workflow contains a cycle, so no execution order exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workflow contains a cycle through: {}", nodes.join(", "))]
pub struct CycleError {
  /// Nodes that could not be ordered (members of, or downstream of, a cycle).
  pub nodes: Vec<String>,
}

/// Graph structure for traversal and analysis.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: node_id -> list of downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges, sorted.
  entry_points: Vec<String>,
}

impl Graph {
  /// Build a graph from nodes and edges.
  ///
  /// Parallel edges between the same pair of nodes collapse into one
  /// dependency.
  pub fn new<'a>(
    nodes: impl IntoIterator<Item = &'a WorkflowNode>,
    edges: impl IntoIterator<Item = &'a WorkflowEdge>,
  ) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for node in nodes {
      adjacency.entry(node.id.clone()).or_default();
      reverse_adjacency.entry(node.id.clone()).or_default();
    }

    let mut seen = HashSet::new();
    for edge in edges {
      if !adjacency.contains_key(&edge.source) || !adjacency.contains_key(&edge.target) {
        continue;
      }
      if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
        continue;
      }
      adjacency
        .entry(edge.source.clone())
        .or_default()
        .push(edge.target.clone());
      reverse_adjacency
        .entry(edge.target.clone())
        .or_default()
        .push(edge.source.clone());
    }

    let mut entry_points: Vec<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.is_empty())
      .map(|(id, _)| id.clone())
      .collect();
    entry_points.sort();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
    }
  }

  /// Get entry points (nodes with no incoming edges).
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Order nodes so every node comes after all of its upstream nodes.
  ///
  /// Kahn's algorithm; among nodes that are ready at the same time the
  /// smallest id goes first, so the order is deterministic.
  pub fn topological_order(&self) -> Result<Vec<String>, CycleError> {
    let mut in_degree: HashMap<&str, usize> = self
      .reverse_adjacency
      .iter()
      .map(|(id, upstream)| (id.as_str(), upstream.len()))
      .collect();

    let mut ready: BTreeSet<&str> = in_degree
      .iter()
      .filter(|(_, degree)| **degree == 0)
      .map(|(id, _)| *id)
      .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(id) = ready.pop_first() {
      order.push(id.to_string());
      for next in self.downstream(id) {
        if let Some(degree) = in_degree.get_mut(next.as_str()) {
          *degree -= 1;
          if *degree == 0 {
            ready.insert(next.as_str());
          }
        }
      }
    }

    if order.len() == in_degree.len() {
      return Ok(order);
    }

    let mut stuck: Vec<String> = in_degree
      .into_iter()
      .filter(|(_, degree)| *degree > 0)
      .map(|(id, _)| id.to_string())
      .collect();
    stuck.sort();
    Err(CycleError { nodes: stuck })
  }

  /// Whether the graph is acyclic.
  pub fn is_acyclic(&self) -> bool {
    self.topological_order().is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn nodes(ids: &[&str]) -> Vec<WorkflowNode> {
    ids.iter().map(|id| WorkflowNode::new(*id, "tool")).collect()
  }

  fn edges(pairs: &[(&str, &str)]) -> Vec<WorkflowEdge> {
    pairs
      .iter()
      .enumerate()
      .map(|(i, (s, t))| WorkflowEdge::new(format!("e{}", i), *s, *t))
      .collect()
  }

  #[test]
  fn test_linear_order() {
    let n = nodes(&["c", "a", "b"]);
    let e = edges(&[("a", "b"), ("b", "c")]);
    let graph = Graph::new(&n, &e);

    assert_eq!(graph.entry_points(), ["a"]);
    assert_eq!(graph.downstream("a"), ["b"]);
    assert_eq!(graph.upstream("c"), ["b"]);
    assert_eq!(graph.topological_order().unwrap(), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_diamond_order_is_deterministic() {
    let n = nodes(&["root", "left", "right", "join"]);
    let e = edges(&[
      ("root", "right"),
      ("root", "left"),
      ("left", "join"),
      ("right", "join"),
    ]);
    let graph = Graph::new(&n, &e);

    assert_eq!(
      graph.topological_order().unwrap(),
      vec!["root", "left", "right", "join"]
    );
  }

  #[test]
  fn test_cycle_detected() {
    let n = nodes(&["a", "b", "c", "d"]);
    let e = edges(&[("a", "b"), ("b", "c"), ("c", "b"), ("c", "d")]);
    let graph = Graph::new(&n, &e);

    let err = graph.topological_order().unwrap_err();
    assert_eq!(err.nodes, vec!["b", "c", "d"]);
    assert!(!graph.is_acyclic());
  }

  #[test]
  fn test_self_loop_is_cycle() {
    let n = nodes(&["a"]);
    let e = edges(&[("a", "a")]);
    let graph = Graph::new(&n, &e);

    assert!(graph.entry_points().is_empty());
    assert_eq!(graph.topological_order().unwrap_err().nodes, vec!["a"]);
  }

  #[test]
  fn test_parallel_edges_collapse() {
    let n = nodes(&["a", "b"]);
    let e = edges(&[("a", "b"), ("a", "b")]);
    let graph = Graph::new(&n, &e);

    assert_eq!(graph.downstream("a").len(), 1);
    assert_eq!(graph.topological_order().unwrap(), vec!["a", "b"]);
  }

  #[test]
  fn test_empty_graph() {
    let graph = Graph::new(&[], &[]);
    assert!(graph.topological_order().unwrap().is_empty());
  }
}
