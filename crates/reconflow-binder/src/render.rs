use reconflow_catalog::{ArgSlot, CmdPart, ParamValue, RenderMode, Slot, ToolDef};
use reconflow_workflow::NodeParams;

use crate::bind::{BoundParams, bind};

/// Render a tool's command template into its argument vector.
///
/// Literal tokens are emitted verbatim in template order. Placeholders are
/// expanded according to their [`RenderMode`]. The output depends only on the
/// template and `params`.
pub fn render_command(tool: &ToolDef, params: &BoundParams) -> Vec<String> {
  let mut argv = Vec::new();

  for part in &tool.cmd {
    match part {
      CmdPart::Literal(token) => argv.push(token.clone()),
      CmdPart::Slot(Slot::Arg(slot)) => {
        let value = params.get(&slot.name).unwrap_or(&ParamValue::Unset);
        let required = tool.arg(&slot.name).is_some_and(|spec| spec.required);
        render_slot(slot, value, required, &mut argv);
      }
    }
  }

  argv
}

/// Bind `params` and render the result in one step.
pub fn bind_and_render(tool: &ToolDef, params: &NodeParams) -> (BoundParams, Vec<String>) {
  let bound = bind(tool, params);
  let argv = render_command(tool, &bound);
  (bound, argv)
}

fn render_slot(slot: &ArgSlot, value: &ParamValue, required: bool, argv: &mut Vec<String>) {
  match slot.mode {
    RenderMode::Value => {
      if is_blank(value) && !required {
        return;
      }
      push_flag(slot, argv);
      argv.push(value.to_string());
    }
    RenderMode::Bool => {
      if truthy(value) {
        push_flag(slot, argv);
      }
    }
    RenderMode::Repeat => {
      for element in elements(value) {
        push_flag(slot, argv);
        argv.push(element);
      }
    }
    RenderMode::Join => {
      let elements = elements(value);
      if elements.is_empty() {
        return;
      }
      push_flag(slot, argv);
      argv.push(elements.join(slot.separator()));
    }
  }
}

fn push_flag(slot: &ArgSlot, argv: &mut Vec<String>) {
  if let Some(flag) = &slot.flag {
    argv.push(flag.clone());
  }
}

// `false` counts as blank in value mode, numbers never do.
fn is_blank(value: &ParamValue) -> bool {
  value.is_empty() || value.as_bool() == Some(false)
}

fn truthy(value: &ParamValue) -> bool {
  match value {
    ParamValue::Bool(b) => *b,
    ParamValue::Number(n) => *n != 0.0,
    other => !other.is_empty(),
  }
}

/// List elements as tokens. A non-empty scalar is a one-element list.
fn elements(value: &ParamValue) -> Vec<String> {
  match value {
    ParamValue::List(items) => items.iter().map(ToString::to_string).collect(),
    other if is_blank(other) => Vec::new(),
    other => vec![other.to_string()],
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reconflow_catalog::{ArgSpec, ArgType};
  use serde_json::json;

  fn tool(cmd: Vec<CmdPart>, args: Vec<ArgSpec>) -> ToolDef {
    ToolDef {
      id: "tool".to_string(),
      label: None,
      description: None,
      category: None,
      cmd,
      args,
      out: None,
    }
  }

  fn params(pairs: &[(&str, ParamValue)]) -> NodeParams {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_list_enum_repeat() {
    let tool = tool(
      vec![
        CmdPart::literal("scan"),
        CmdPart::arg(ArgSlot::new("tags").with_flag("-x").with_mode(RenderMode::Repeat)),
      ],
      vec![ArgSpec::new("tags", ArgType::EnumList).with_options(["a", "b", "c"])],
    );

    let (bound, argv) = bind_and_render(&tool, &NodeParams::new());
    assert_eq!(bound.get("tags"), Some(&ParamValue::List(vec![])));
    assert_eq!(argv, vec!["scan"]);

    let mut node_params = NodeParams::new();
    crate::set_param(&tool, &mut node_params, "tags", &json!(["a", "b"])).unwrap();
    let (_, argv) = bind_and_render(&tool, &node_params);
    assert_eq!(argv, vec!["scan", "-x", "a", "-x", "b"]);
  }

  #[test]
  fn test_subfinder_template() {
    let tool = tool(
      vec![
        CmdPart::literal("subfinder"),
        CmdPart::arg(ArgSlot::new("domain").with_flag("-d")),
        CmdPart::arg(ArgSlot::new("silent").with_flag("-silent").with_mode(RenderMode::Bool)),
        CmdPart::arg(ArgSlot::new("threads").with_flag("-t")),
        CmdPart::arg(ArgSlot::new("resolver").with_flag("-r")),
      ],
      vec![
        ArgSpec::new("domain", ArgType::String).required(),
        ArgSpec::new("silent", ArgType::Boolean).with_default(json!(true)),
        ArgSpec::new("threads", ArgType::Number).with_default(json!(10)),
        ArgSpec::new("resolver", ArgType::String),
      ],
    );

    let (_, argv) = bind_and_render(&tool, &params(&[("domain", ParamValue::text("example.com"))]));
    assert_eq!(argv, vec!["subfinder", "-d", "example.com", "-silent", "-t", "10"]);
  }

  #[test]
  fn test_value_mode_required_empty_keeps_flag() {
    let tool = tool(
      vec![CmdPart::arg(ArgSlot::new("domain").with_flag("-d"))],
      vec![ArgSpec::new("domain", ArgType::String).required()],
    );

    let (bound, argv) = bind_and_render(&tool, &NodeParams::new());
    assert!(!bound.is_complete());
    assert_eq!(argv, vec!["-d", ""]);
  }

  #[test]
  fn test_value_mode_zero_is_emitted() {
    let tool = tool(
      vec![CmdPart::arg(ArgSlot::new("retries").with_flag("-retries"))],
      vec![ArgSpec::new("retries", ArgType::Number)],
    );

    let (_, argv) = bind_and_render(&tool, &NodeParams::new());
    assert_eq!(argv, vec!["-retries", "0"]);
  }

  #[test]
  fn test_bool_mode() {
    let tool = tool(
      vec![CmdPart::arg(ArgSlot::new("json").with_flag("-json").with_mode(RenderMode::Bool))],
      vec![ArgSpec::new("json", ArgType::Boolean)],
    );

    let (_, off) = bind_and_render(&tool, &NodeParams::new());
    assert!(off.is_empty());

    let (_, on) = bind_and_render(&tool, &params(&[("json", ParamValue::Bool(true))]));
    assert_eq!(on, vec!["-json"]);
  }

  #[test]
  fn test_join_mode() {
    let tool = tool(
      vec![
        CmdPart::arg(ArgSlot::new("ports").with_flag("-p").with_mode(RenderMode::Join)),
        CmdPart::arg(
          ArgSlot::new("severity")
            .with_flag("-s")
            .with_mode(RenderMode::Join)
            .with_separator("|"),
        ),
      ],
      vec![
        ArgSpec::new("ports", ArgType::NumberList).with_default(json!([80, 443])),
        ArgSpec::new("severity", ArgType::EnumList).with_options(["low", "high"]),
      ],
    );

    let (_, argv) = bind_and_render(&tool, &NodeParams::new());
    assert_eq!(argv, vec!["-p", "80,443"]);

    let (_, argv) = bind_and_render(
      &tool,
      &params(&[("severity", ParamValue::text_list(["high", "low"]))]),
    );
    assert_eq!(argv, vec!["-p", "80,443", "-s", "high|low"]);
  }

  #[test]
  fn test_repeat_without_flag() {
    let tool = tool(
      vec![
        CmdPart::literal("echo"),
        CmdPart::arg(ArgSlot::new("words").with_mode(RenderMode::Repeat)),
      ],
      vec![ArgSpec::new("words", ArgType::StringList)],
    );

    let words = params(&[("words", ParamValue::text_list(["a", "b"]))]);
    let (_, argv) = bind_and_render(&tool, &words);
    assert_eq!(argv, vec!["echo", "a", "b"]);
  }

  #[test]
  fn test_rendering_is_deterministic() {
    let tool = tool(
      vec![
        CmdPart::literal("nuclei"),
        CmdPart::arg(ArgSlot::new("targets").with_flag("-u").with_mode(RenderMode::Repeat)),
        CmdPart::arg(ArgSlot::new("severity").with_flag("-severity").with_mode(RenderMode::Join)),
        CmdPart::arg(ArgSlot::new("rate").with_flag("-rl")),
      ],
      vec![
        ArgSpec::new("targets", ArgType::StringList),
        ArgSpec::new("severity", ArgType::EnumList).with_options(["info", "critical"]),
        ArgSpec::new("rate", ArgType::Number).with_default(json!(150)),
      ],
    );
    let node_params = params(&[
      ("targets", ParamValue::text_list(["a.com", "b.com"])),
      ("severity", ParamValue::text_list(["critical"])),
    ]);

    let bound = bind(&tool, &node_params);
    let first = render_command(&tool, &bound);
    let second = render_command(&tool, &bound);
    assert_eq!(first, second);
    assert_eq!(
      first,
      vec!["nuclei", "-u", "a.com", "-u", "b.com", "-severity", "critical", "-rl", "150"]
    );
  }
}
