use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::info;

use crate::error::CatalogError;
use crate::tool::ToolDef;

/// An immutable mapping from tool id to its definition.
///
/// Built once from a validated snapshot and shared read-only (typically behind
/// an `Arc`) for the rest of the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
  tools: HashMap<String, ToolDef>,
}

impl ToolCatalog {
  /// Build a catalog from a list of tool definitions.
  ///
  /// Fails if tool ids or argument names collide, if an enum argument lacks
  /// options, or if a command placeholder names an undeclared argument.
  pub fn new(tools: Vec<ToolDef>) -> Result<Self, CatalogError> {
    let mut map = HashMap::with_capacity(tools.len());

    for tool in tools {
      validate_tool(&tool)?;
      if map.contains_key(&tool.id) {
        return Err(CatalogError::DuplicateTool { tool: tool.id });
      }
      map.insert(tool.id.clone(), tool);
    }

    Ok(Self { tools: map })
  }

  /// Get a tool by id.
  pub fn get(&self, tool_id: &str) -> Option<&ToolDef> {
    self.tools.get(tool_id)
  }

  pub fn contains(&self, tool_id: &str) -> bool {
    self.tools.contains_key(tool_id)
  }

  /// All tools, sorted by id.
  pub fn tools(&self) -> Vec<&ToolDef> {
    let mut tools: Vec<&ToolDef> = self.tools.values().collect();
    tools.sort_by(|a, b| a.id.cmp(&b.id));
    tools
  }

  pub fn len(&self) -> usize {
    self.tools.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tools.is_empty()
  }
}

fn validate_tool(tool: &ToolDef) -> Result<(), CatalogError> {
  let mut names = HashSet::new();

  for arg in &tool.args {
    if !names.insert(arg.name.as_str()) {
      return Err(CatalogError::DuplicateArg {
        tool: tool.id.clone(),
        arg: arg.name.clone(),
      });
    }
    if arg.arg_type.needs_options() && arg.options().is_empty() {
      return Err(CatalogError::MissingOptions {
        tool: tool.id.clone(),
        arg: arg.name.clone(),
      });
    }
  }

  for slot in tool.slots() {
    if !names.contains(slot.name.as_str()) {
      return Err(CatalogError::UnknownPlaceholder {
        tool: tool.id.clone(),
        arg: slot.name.clone(),
      });
    }
  }

  Ok(())
}

/// A source of tool definitions.
///
/// A fetch is a single atomic snapshot; there is no pagination.
#[async_trait]
pub trait CatalogSource: Send + Sync {
  async fn fetch(&self) -> Result<Vec<ToolDef>, CatalogError>;
}

/// Fetch a snapshot from `source` and build a validated catalog from it.
pub async fn load_catalog<S: CatalogSource + ?Sized>(
  source: &S,
) -> Result<ToolCatalog, CatalogError> {
  let tools = source.fetch().await?;
  let catalog = ToolCatalog::new(tools)?;
  info!(tools = catalog.len(), "tool catalog loaded");
  Ok(catalog)
}
