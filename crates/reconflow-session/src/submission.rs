//! Turning an edited workflow into a run request.

use std::collections::{BTreeMap, HashMap};

use reconflow_binder::{BindingIssue, bind_and_render};
use reconflow_catalog::{ParamValue, ToolCatalog};
use reconflow_workflow::{Workflow, WorkflowEdge, param_envelope};
use serde::{Deserialize, Serialize};

use crate::error::{SubmissionError, SubmissionIssue, SubmissionReason};

/// Body of a run submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
  pub workflow: SubmittedWorkflow,
  /// Target environment label.
  pub project: String,
  /// Run-wide inputs such as `domain` or `url`.
  #[serde(default)]
  pub inputs: BTreeMap<String, String>,
}

/// Snapshot of a workflow with every node bound and rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedWorkflow {
  pub id: String,
  pub name: String,
  /// Nodes in execution order.
  pub nodes: Vec<SubmittedNode>,
  pub edges: Vec<WorkflowEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedNode {
  pub id: String,
  pub tool: String,
  pub label: String,
  /// Complete, normalized params: one entry per declared argument.
  #[serde(with = "param_envelope")]
  pub params: HashMap<String, ParamValue>,
  /// The rendered command. This is what the backend executes.
  pub argv: Vec<String>,
}

impl SubmittedWorkflow {
  pub fn node(&self, node_id: &str) -> Option<&SubmittedNode> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  pub fn order(&self) -> Vec<&str> {
    self.nodes.iter().map(|n| n.id.as_str()).collect()
  }
}

/// Validate, bind and render a workflow for submission.
///
/// Every problem across every node is collected before failing: cycles,
/// unknown tools, missing required arguments and invalid values. Unknown
/// params are dropped, not reported.
pub fn prepare_run(
  workflow: &Workflow,
  catalog: &ToolCatalog,
  project: &str,
  inputs: BTreeMap<String, String>,
) -> Result<RunRequest, SubmissionError> {
  if workflow.node_count() == 0 {
    return Err(SubmissionError::new(vec![SubmissionIssue {
      node_id: None,
      reason: SubmissionReason::EmptyWorkflow,
    }]));
  }

  let mut issues = Vec::new();

  let order = match workflow.graph().topological_order() {
    Ok(order) => order,
    Err(cycle) => {
      issues.push(SubmissionIssue {
        node_id: None,
        reason: SubmissionReason::Cycle {
          nodes: cycle.nodes.clone(),
        },
      });
      // Still bind every node so all issues surface together.
      workflow.nodes().iter().map(|n| n.id.clone()).collect()
    }
  };

  let mut nodes = Vec::with_capacity(order.len());
  for node_id in &order {
    let Some(node) = workflow.get_node(node_id) else {
      continue;
    };
    let Some(tool) = catalog.get(&node.tool) else {
      issues.push(SubmissionIssue::for_node(
        &node.id,
        SubmissionReason::UnknownTool {
          tool: node.tool.clone(),
        },
      ));
      continue;
    };

    let (bound, argv) = bind_and_render(tool, &node.params);
    for issue in bound.issues() {
      let reason = match issue {
        BindingIssue::MissingRequired { arg } => {
          SubmissionReason::MissingRequired { arg: arg.clone() }
        }
        BindingIssue::InvalidValue { arg, message } => SubmissionReason::InvalidParam {
          arg: arg.clone(),
          message: message.clone(),
        },
        BindingIssue::UnknownArgument { .. } => continue,
      };
      issues.push(SubmissionIssue::for_node(&node.id, reason));
    }

    nodes.push(SubmittedNode {
      id: node.id.clone(),
      tool: node.tool.clone(),
      label: node.label.clone(),
      params: bound.into_values(),
      argv,
    });
  }

  if !issues.is_empty() {
    return Err(SubmissionError::new(issues));
  }

  Ok(RunRequest {
    workflow: SubmittedWorkflow {
      id: workflow.id.clone(),
      name: workflow.name.clone(),
      nodes,
      edges: workflow.edges().to_vec(),
    },
    project: project.to_string(),
    inputs,
  })
}
