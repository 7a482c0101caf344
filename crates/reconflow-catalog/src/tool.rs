use serde::{Deserialize, Serialize};

use crate::command::{ArgSlot, CmdPart};

/// A catalog entry describing one external tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
  /// Unique tool identifier, e.g. "subfinder".
  pub id: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,

  /// Ordered command template.
  pub cmd: Vec<CmdPart>,

  #[serde(default)]
  pub args: Vec<ArgSpec>,

  /// Where the tool writes its output, if anywhere.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub out: Option<OutputSpec>,
}

impl ToolDef {
  /// Display name: the label when present, otherwise the id.
  pub fn display_name(&self) -> &str {
    self.label.as_deref().unwrap_or(&self.id)
  }

  /// Look up an argument spec by name.
  pub fn arg(&self, name: &str) -> Option<&ArgSpec> {
    self.args.iter().find(|a| a.name == name)
  }

  /// Iterate over the template's argument placeholders, in template order.
  pub fn slots(&self) -> impl Iterator<Item = &ArgSlot> {
    self.cmd.iter().filter_map(CmdPart::as_arg)
  }
}

/// Declaration of one tool argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
  /// Unique within the owning tool.
  pub name: String,

  #[serde(rename = "type")]
  pub arg_type: ArgType,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,

  /// Raw default as written in the catalog. Normalized by the binder.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<serde_json::Value>,

  /// Allowed values for `enum` and `list<enum>`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub required: bool,
}

impl ArgSpec {
  pub fn new(name: impl Into<String>, arg_type: ArgType) -> Self {
    Self {
      name: name.into(),
      arg_type,
      label: None,
      default: None,
      options: None,
      required: false,
    }
  }

  pub fn with_default(mut self, default: serde_json::Value) -> Self {
    self.default = Some(default);
    self
  }

  pub fn with_options<I, S>(mut self, options: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.options = Some(options.into_iter().map(Into::into).collect());
    self
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  /// Display name: the label when present, otherwise the name.
  pub fn display_name(&self) -> &str {
    self.label.as_deref().unwrap_or(&self.name)
  }

  /// The declared options, or an empty slice.
  pub fn options(&self) -> &[String] {
    self.options.as_deref().unwrap_or(&[])
  }
}

/// Argument value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgType {
  #[serde(rename = "string")]
  String,
  #[serde(rename = "number")]
  Number,
  #[serde(rename = "boolean")]
  Boolean,
  #[serde(rename = "enum")]
  Enum,
  #[serde(rename = "list<string>")]
  StringList,
  #[serde(rename = "list<number>")]
  NumberList,
  #[serde(rename = "list<enum>")]
  EnumList,
}

impl ArgType {
  /// Whether values of this type are ordered sequences.
  pub fn is_list(self) -> bool {
    matches!(self, Self::StringList | Self::NumberList | Self::EnumList)
  }

  /// Whether this type draws its values from declared options.
  pub fn needs_options(self) -> bool {
    matches!(self, Self::Enum | Self::EnumList)
  }
}

/// Output location declared by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
  /// Output kind, e.g. "file" or "lines".
  pub kind: String,

  /// Path of the produced file, relative to the node's workspace.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_deserialize_tool_def() {
    let tool: ToolDef = serde_json::from_value(json!({
      "id": "httpx",
      "label": "HTTPx",
      "cmd": ["httpx", {"kind": "arg", "name": "threads", "flag": "-t"}],
      "args": [
        {"name": "threads", "type": "number", "default": 50},
        {"name": "ports", "type": "list<number>"},
        {"name": "method", "type": "enum", "options": ["GET", "POST"], "required": true}
      ],
      "out": {"kind": "file", "path": "alive.txt"}
    }))
    .unwrap();

    assert_eq!(tool.display_name(), "HTTPx");
    assert_eq!(tool.args.len(), 3);
    assert_eq!(tool.arg("ports").unwrap().arg_type, ArgType::NumberList);
    assert!(tool.arg("method").unwrap().required);
    assert_eq!(tool.arg("method").unwrap().options(), ["GET", "POST"]);
    assert_eq!(tool.slots().count(), 1);
    assert_eq!(tool.out.unwrap().path.as_deref(), Some("alive.txt"));
  }

  #[test]
  fn test_arg_type_names() {
    assert_eq!(
      serde_json::to_value(ArgType::EnumList).unwrap(),
      json!("list<enum>")
    );
    assert!(ArgType::StringList.is_list());
    assert!(!ArgType::Enum.is_list());
    assert!(ArgType::EnumList.needs_options());
  }

  #[test]
  fn test_required_omitted_when_false() {
    let spec = ArgSpec::new("domain", ArgType::String);
    let value = serde_json::to_value(&spec).unwrap();
    assert!(value.get("required").is_none());
  }
}
