use std::collections::HashMap;

use reconflow_catalog::{ParamValue, ToolDef};
use reconflow_workflow::NodeParams;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::coerce::{coerce, coerce_param, empty_value};
use crate::error::BindError;

/// An advisory problem found while binding a node's parameters.
///
/// Issues never block editing. Submission turns them into errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingIssue {
  /// A required argument resolved to an empty or unset value.
  MissingRequired { arg: String },
  /// A stored or default value could not be coerced to the argument's type.
  InvalidValue { arg: String, message: String },
  /// The node carries a value for an argument the tool does not declare.
  UnknownArgument { arg: String },
}

impl BindingIssue {
  pub fn arg(&self) -> &str {
    match self {
      Self::MissingRequired { arg }
      | Self::InvalidValue { arg, .. }
      | Self::UnknownArgument { arg } => arg,
    }
  }

  /// Whether submission must be blocked because of this issue.
  pub fn is_blocking(&self) -> bool {
    !matches!(self, Self::UnknownArgument { .. })
  }
}

/// A complete, normalized parameter set for one node.
///
/// Holds a value for every argument the tool declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
  values: HashMap<String, ParamValue>,
  issues: Vec<BindingIssue>,
}

impl BoundParams {
  pub fn get(&self, arg: &str) -> Option<&ParamValue> {
    self.values.get(arg)
  }

  pub fn values(&self) -> &HashMap<String, ParamValue> {
    &self.values
  }

  pub fn into_values(self) -> HashMap<String, ParamValue> {
    self.values
  }

  pub fn issues(&self) -> &[BindingIssue] {
    &self.issues
  }

  /// True when no issue would block submission.
  pub fn is_complete(&self) -> bool {
    !self.issues.iter().any(BindingIssue::is_blocking)
  }
}

/// Bind a node's params against its tool definition.
///
/// Arguments missing from `params` take their declared default, or the
/// type's empty value. Issues are reported in argument declaration order,
/// followed by unknown arguments sorted by name.
pub fn bind(tool: &ToolDef, params: &NodeParams) -> BoundParams {
  let mut bound = BoundParams::default();

  for spec in &tool.args {
    let resolved = match params.get(&spec.name) {
      Some(value) => match coerce_param(spec, value) {
        Ok(value) => Some(value),
        Err(e) => {
          bound.issues.push(BindingIssue::InvalidValue {
            arg: spec.name.clone(),
            message: e.to_string(),
          });
          None
        }
      },
      None => None,
    };

    // A required argument needs a stored value or a usable default.
    let (value, supplied) = match resolved {
      Some(value) => (value, true),
      None => match &spec.default {
        Some(default) => match coerce(spec, default) {
          Ok(value) => (value, true),
          Err(e) => {
            debug!(
              tool = %tool.id,
              arg = %spec.name,
              error = %e,
              "default does not fit argument type"
            );
            bound.issues.push(BindingIssue::InvalidValue {
              arg: spec.name.clone(),
              message: format!("default: {}", e),
            });
            (empty_value(spec.arg_type), false)
          }
        },
        None => (empty_value(spec.arg_type), false),
      },
    };

    if spec.required && (!supplied || value.is_empty()) {
      bound.issues.push(BindingIssue::MissingRequired {
        arg: spec.name.clone(),
      });
    }

    bound.values.insert(spec.name.clone(), value);
  }

  let mut unknown: Vec<&String> = params
    .keys()
    .filter(|name| tool.arg(name).is_none())
    .collect();
  unknown.sort();
  bound.issues.extend(
    unknown
      .into_iter()
      .map(|arg| BindingIssue::UnknownArgument { arg: arg.clone() }),
  );

  bound
}

/// Coerce one raw editor value and store it on a node's params.
///
/// On error the params are left unchanged.
pub fn set_param(
  tool: &ToolDef,
  params: &mut NodeParams,
  arg: &str,
  raw: &Value,
) -> Result<(), BindError> {
  let spec = tool.arg(arg).ok_or_else(|| BindError::UnknownArgument {
    tool: tool.id.clone(),
    arg: arg.to_string(),
  })?;
  let value = coerce(spec, raw)?;
  params.insert(arg.to_string(), value);
  Ok(())
}
