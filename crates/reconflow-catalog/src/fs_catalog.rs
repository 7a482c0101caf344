use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::catalog::CatalogSource;
use crate::error::CatalogError;
use crate::tool::ToolDef;

/// Filesystem-based catalog source.
///
/// Reads a single document of the form:
/// ```yaml
/// tools:
///   - id: subfinder
///     cmd: [subfinder, { kind: arg, name: domain, flag: -d }, -silent]
///     args:
///       - { name: domain, type: string, required: true }
/// ```
/// Files ending in `.json` are parsed as JSON, `.yaml`/`.yml` as YAML.
pub struct FsCatalog {
  path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
  #[serde(default)]
  tools: Vec<ToolDef>,
}

impl FsCatalog {
  /// Create a catalog source reading from the given file.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Get the catalog file path.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Parse a catalog document according to the file extension.
  fn parse(&self, content: &str) -> Result<Vec<ToolDef>, CatalogError> {
    let extension = self
      .path
      .extension()
      .and_then(|e| e.to_str())
      .map(str::to_ascii_lowercase);

    let document: CatalogDocument = match extension.as_deref() {
      Some("json") => serde_json::from_str(content)?,
      Some("yaml") | Some("yml") => serde_yaml::from_str(content)?,
      _ => {
        return Err(CatalogError::UnsupportedFormat {
          path: self.path.display().to_string(),
        });
      }
    };

    Ok(document.tools)
  }
}

#[async_trait]
impl CatalogSource for FsCatalog {
  async fn fetch(&self) -> Result<Vec<ToolDef>, CatalogError> {
    let content = fs::read_to_string(&self.path).await?;
    self.parse(&content)
  }
}
