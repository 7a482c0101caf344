use serde::{Deserialize, Serialize};

/// One element of a tool's command template.
///
/// In catalog documents a literal token is a bare string and a placeholder is
/// an object tagged with `"kind": "arg"`:
///
/// ```yaml
/// cmd:
///   - nuclei
///   - { kind: arg, name: target, flag: -u }
///   - { kind: arg, name: tags, flag: -tags, mode: join, sep: "," }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CmdPart {
  /// Emitted verbatim, unconditionally.
  Literal(String),
  Slot(Slot),
}

impl CmdPart {
  /// Create a literal token.
  pub fn literal(token: impl Into<String>) -> Self {
    Self::Literal(token.into())
  }

  /// Create an argument placeholder.
  pub fn arg(slot: ArgSlot) -> Self {
    Self::Slot(Slot::Arg(slot))
  }

  /// The argument placeholder, if this part is one.
  pub fn as_arg(&self) -> Option<&ArgSlot> {
    match self {
      Self::Literal(_) => None,
      Self::Slot(Slot::Arg(slot)) => Some(slot),
    }
  }
}

/// Non-literal template parts, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
  Arg(ArgSlot),
}

/// A placeholder that renders one of the tool's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSlot {
  /// Name of the argument this placeholder renders.
  pub name: String,

  /// Optional flag emitted before the value(s), e.g. `-d`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flag: Option<String>,

  #[serde(default)]
  pub mode: RenderMode,

  /// Separator for [`RenderMode::Join`]. Defaults to `,`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sep: Option<String>,
}

impl ArgSlot {
  pub const DEFAULT_SEPARATOR: &'static str = ",";

  /// A `value`-mode placeholder without a flag.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      flag: None,
      mode: RenderMode::Value,
      sep: None,
    }
  }

  pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
    self.flag = Some(flag.into());
    self
  }

  pub fn with_mode(mut self, mode: RenderMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn with_separator(mut self, sep: impl Into<String>) -> Self {
    self.sep = Some(sep.into());
    self
  }

  /// The join separator, falling back to the default.
  pub fn separator(&self) -> &str {
    self.sep.as_deref().unwrap_or(Self::DEFAULT_SEPARATOR)
  }
}

/// How a placeholder turns its argument's value into command tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
  /// Flag followed by the value.
  #[default]
  Value,
  /// Flag only, when the value is true.
  #[serde(alias = "boolean", alias = "boolean-flag")]
  Bool,
  /// Flag followed by one value, once per list element.
  #[serde(alias = "repeat-per-element")]
  Repeat,
  /// Flag followed by all list elements joined with the separator.
  #[serde(alias = "join-with-separator")]
  Join,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_deserialize_mixed_template() {
    let parts: Vec<CmdPart> = serde_json::from_str(
      r#"["subfinder", {"kind": "arg", "name": "domain", "flag": "-d"}, "-silent"]"#,
    )
    .unwrap();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], CmdPart::literal("subfinder"));
    let slot = parts[1].as_arg().unwrap();
    assert_eq!(slot.name, "domain");
    assert_eq!(slot.flag.as_deref(), Some("-d"));
    assert_eq!(slot.mode, RenderMode::Value);
    assert!(parts[2].as_arg().is_none());
  }

  #[test]
  fn test_mode_aliases() {
    let slot: ArgSlot =
      serde_json::from_str(r#"{"name": "x", "mode": "repeat-per-element"}"#).unwrap();
    assert_eq!(slot.mode, RenderMode::Repeat);

    let slot: ArgSlot = serde_json::from_str(r#"{"name": "x", "mode": "bool"}"#).unwrap();
    assert_eq!(slot.mode, RenderMode::Bool);
  }

  #[test]
  fn test_unknown_kind_rejected() {
    let result: Result<CmdPart, _> = serde_json::from_str(r#"{"kind": "env", "name": "x"}"#);
    assert!(result.is_err());
  }

  #[test]
  fn test_default_separator() {
    let slot = ArgSlot::new("tags").with_mode(RenderMode::Join);
    assert_eq!(slot.separator(), ",");
    assert_eq!(slot.with_separator(";").separator(), ";");
  }
}
