use thiserror::Error;

/// Errors that can occur when loading or validating a tool catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// Two catalog entries share an id.
  #[error("duplicate tool id: {tool}")]
  DuplicateTool { tool: String },

  /// Two arguments of one tool share a name.
  #[error("tool '{tool}' declares argument '{arg}' more than once")]
  DuplicateArg { tool: String, arg: String },

  /// An enum or list<enum> argument has no options.
  #[error("tool '{tool}' argument '{arg}' requires options")]
  MissingOptions { tool: String, arg: String },

  /// A command placeholder names an argument the tool does not declare.
  #[error("tool '{tool}' command references undeclared argument '{arg}'")]
  UnknownPlaceholder { tool: String, arg: String },

  /// The catalog file has an extension we cannot parse.
  #[error("unsupported catalog format: {path}")]
  UnsupportedFormat { path: String },

  /// IO error when reading a catalog file.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Failed to parse a JSON catalog.
  #[error("invalid catalog json: {0}")]
  Json(#[from] serde_json::Error),

  /// Failed to parse a YAML catalog.
  #[error("invalid catalog yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// The remote catalog service failed.
  #[error("catalog fetch failed: {message}")]
  Fetch { message: String },
}

impl CatalogError {
  pub fn fetch(message: impl Into<String>) -> Self {
    Self::Fetch {
      message: message.into(),
    }
  }
}
