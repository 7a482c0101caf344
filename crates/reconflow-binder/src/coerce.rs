//! Coercion of raw editor values into typed parameter values.

use reconflow_catalog::{ArgSpec, ArgType, ParamValue, Scalar};
use serde_json::Value;

use crate::error::BindError;

/// The value an argument takes when it has neither a user value nor a default.
///
/// Enums resolve to [`ParamValue::Unset`], which is distinct from every option.
pub fn empty_value(arg_type: ArgType) -> ParamValue {
  match arg_type {
    ArgType::String => ParamValue::Text(String::new()),
    ArgType::Number => ParamValue::Number(0.0),
    ArgType::Boolean => ParamValue::Bool(false),
    ArgType::Enum => ParamValue::Unset,
    ArgType::StringList | ArgType::NumberList | ArgType::EnumList => ParamValue::List(Vec::new()),
  }
}

/// Coerce a raw JSON value to the shape required by `spec`.
///
/// - number arguments parse strings (an empty string is `0`)
/// - boolean arguments accept booleans, numbers and the usual truthy strings
/// - list arguments always produce a list; a string is split into one
///   element per non-empty line
/// - enum values must be one of the declared options
pub fn coerce(spec: &ArgSpec, raw: &Value) -> Result<ParamValue, BindError> {
  match spec.arg_type {
    ArgType::String => coerce_string(spec, raw).map(ParamValue::Text),
    ArgType::Number => coerce_number(spec, raw).map(ParamValue::Number),
    ArgType::Boolean => coerce_bool(spec, raw).map(ParamValue::Bool),
    ArgType::Enum => coerce_enum(spec, raw),
    ArgType::StringList => list_items(spec, raw)?
      .iter()
      .map(|item| coerce_string(spec, item).map(Scalar::Text))
      .collect::<Result<Vec<_>, _>>()
      .map(ParamValue::List),
    ArgType::NumberList => list_items(spec, raw)?
      .iter()
      .map(|item| coerce_number(spec, item).map(Scalar::Number))
      .collect::<Result<Vec<_>, _>>()
      .map(ParamValue::List),
    ArgType::EnumList => list_items(spec, raw)?
      .iter()
      .map(|item| coerce_option(spec, item).map(Scalar::Text))
      .collect::<Result<Vec<_>, _>>()
      .map(ParamValue::List),
  }
}

/// Re-coerce an already typed value, e.g. one loaded from a saved workflow.
pub fn coerce_param(spec: &ArgSpec, value: &ParamValue) -> Result<ParamValue, BindError> {
  coerce(spec, &to_json(value))
}

fn to_json(value: &ParamValue) -> Value {
  match value {
    ParamValue::Unset => Value::Null,
    ParamValue::Bool(b) => Value::Bool(*b),
    ParamValue::Number(n) => number_json(*n),
    ParamValue::Text(s) => Value::String(s.clone()),
    ParamValue::List(items) => Value::Array(
      items
        .iter()
        .map(|item| match item {
          Scalar::Number(n) => number_json(*n),
          Scalar::Text(s) => Value::String(s.clone()),
        })
        .collect(),
    ),
  }
}

fn number_json(n: f64) -> Value {
  serde_json::Number::from_f64(n)
    .map(Value::Number)
    .unwrap_or(Value::Null)
}

fn invalid(spec: &ArgSpec, message: impl Into<String>) -> BindError {
  BindError::InvalidValue {
    arg: spec.name.clone(),
    expected: spec.arg_type,
    message: message.into(),
  }
}

fn coerce_string(spec: &ArgSpec, raw: &Value) -> Result<String, BindError> {
  match raw {
    Value::Null => Ok(String::new()),
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) => Ok(Scalar::Number(n.as_f64().unwrap_or_default()).to_string()),
    Value::Bool(b) => Ok(b.to_string()),
    Value::Array(_) | Value::Object(_) => Err(invalid(spec, format!("got {}", raw))),
  }
}

fn coerce_number(spec: &ArgSpec, raw: &Value) -> Result<f64, BindError> {
  match raw {
    Value::Null => Ok(0.0),
    Value::Number(n) => n
      .as_f64()
      .ok_or_else(|| invalid(spec, format!("'{}' is out of range", n))),
    Value::String(s) if s.trim().is_empty() => Ok(0.0),
    Value::String(s) => s
      .trim()
      .parse::<f64>()
      .ok()
      .filter(|n| n.is_finite())
      .ok_or_else(|| invalid(spec, format!("'{}' is not a number", s))),
    Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
    Value::Array(_) | Value::Object(_) => Err(invalid(spec, format!("got {}", raw))),
  }
}

fn coerce_bool(spec: &ArgSpec, raw: &Value) -> Result<bool, BindError> {
  match raw {
    Value::Null => Ok(false),
    Value::Bool(b) => Ok(*b),
    Value::Number(n) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
    Value::String(s) => match s.trim().to_lowercase().as_str() {
      "true" | "1" | "yes" | "on" => Ok(true),
      "false" | "0" | "no" | "off" | "" => Ok(false),
      other => Err(invalid(spec, format!("'{}' is not a boolean", other))),
    },
    Value::Array(_) | Value::Object(_) => Err(invalid(spec, format!("got {}", raw))),
  }
}

fn coerce_enum(spec: &ArgSpec, raw: &Value) -> Result<ParamValue, BindError> {
  match raw {
    Value::Null => Ok(ParamValue::Unset),
    Value::String(s) if s.is_empty() => Ok(ParamValue::Unset),
    _ => coerce_option(spec, raw).map(ParamValue::Text),
  }
}

fn coerce_option(spec: &ArgSpec, raw: &Value) -> Result<String, BindError> {
  let value = coerce_string(spec, raw)?;
  if spec.options().contains(&value) {
    Ok(value)
  } else {
    Err(BindError::NotAnOption {
      arg: spec.name.clone(),
      value,
    })
  }
}

/// Normalize a raw value into list elements.
fn list_items(spec: &ArgSpec, raw: &Value) -> Result<Vec<Value>, BindError> {
  match raw {
    Value::Null => Ok(Vec::new()),
    Value::Array(items) => {
      if items.iter().any(|i| i.is_array() || i.is_object()) {
        return Err(invalid(spec, "list elements must be scalars"));
      }
      Ok(items.clone())
    }
    Value::String(s) => Ok(
      s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect(),
    ),
    Value::Number(_) | Value::Bool(_) => Ok(vec![raw.clone()]),
    Value::Object(_) => Err(invalid(spec, format!("got {}", raw))),
  }
}
