use std::fmt;

use serde::{Deserialize, Serialize};

/// A bound argument value.
///
/// The shape must match the argument's [`ArgType`](crate::ArgType): scalars for
/// string, number, boolean and enum; [`ParamValue::List`] for the list types.
/// [`ParamValue::Unset`] marks an enum with no selection and serializes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
  #[default]
  Unset,
  Bool(bool),
  Number(f64),
  Text(String),
  List(Vec<Scalar>),
}

impl ParamValue {
  pub fn text(value: impl Into<String>) -> Self {
    Self::Text(value.into())
  }

  /// A list of text elements.
  pub fn text_list<I, S>(items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::List(items.into_iter().map(|s| Scalar::Text(s.into())).collect())
  }

  /// Unset, the empty string, or the empty list.
  ///
  /// Numbers and booleans are never empty.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Unset => true,
      Self::Text(s) => s.is_empty(),
      Self::List(items) => items.is_empty(),
      Self::Bool(_) | Self::Number(_) => false,
    }
  }

  pub fn is_unset(&self) -> bool {
    matches!(self, Self::Unset)
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Scalar]> {
    match self {
      Self::List(items) => Some(items),
      _ => None,
    }
  }
}

/// A single list element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Number(f64),
  Text(String),
}

impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => f.write_str(&format_number(*n)),
      Self::Text(s) => f.write_str(s),
    }
  }
}

/// Render a number the way a command line expects it: integral values have no
/// fractional part.
pub(crate) fn format_number(n: f64) -> String {
  if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    n.to_string()
  }
}

impl fmt::Display for ParamValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unset => Ok(()),
      Self::Bool(b) => write!(f, "{}", b),
      Self::Number(n) => f.write_str(&format_number(*n)),
      Self::Text(s) => f.write_str(s),
      Self::List(items) => {
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(",")?;
          }
          write!(f, "{}", item)?;
        }
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_untagged_deserialize() {
    let values: Vec<ParamValue> =
      serde_json::from_value(json!([null, true, 42, "x", ["a", 3]])).unwrap();

    assert_eq!(values[0], ParamValue::Unset);
    assert_eq!(values[1], ParamValue::Bool(true));
    assert_eq!(values[2], ParamValue::Number(42.0));
    assert_eq!(values[3], ParamValue::text("x"));
    assert_eq!(
      values[4],
      ParamValue::List(vec![Scalar::Text("a".to_string()), Scalar::Number(3.0)])
    );
  }

  #[test]
  fn test_unset_serializes_as_null() {
    assert_eq!(serde_json::to_value(ParamValue::Unset).unwrap(), json!(null));
  }

  #[test]
  fn test_is_empty() {
    assert!(ParamValue::Unset.is_empty());
    assert!(ParamValue::text("").is_empty());
    assert!(ParamValue::List(vec![]).is_empty());
    assert!(!ParamValue::Number(0.0).is_empty());
    assert!(!ParamValue::Bool(false).is_empty());
  }

  #[test]
  fn test_number_formatting() {
    assert_eq!(ParamValue::Number(50.0).to_string(), "50");
    assert_eq!(ParamValue::Number(-3.0).to_string(), "-3");
    assert_eq!(ParamValue::Number(0.5).to_string(), "0.5");
    assert_eq!(Scalar::Number(443.0).to_string(), "443");
  }

  #[test]
  fn test_list_display_joins_with_comma() {
    let value = ParamValue::List(vec![Scalar::Number(80.0), Scalar::Number(443.0)]);
    assert_eq!(value.to_string(), "80,443");
  }
}
