use reconflow_catalog::ArgType;
use thiserror::Error;

/// Errors that can occur when writing a value to an argument.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
  /// The tool does not declare this argument.
  #[error("tool '{tool}' has no argument '{arg}'")]
  UnknownArgument { tool: String, arg: String },

  /// The value cannot be coerced to the argument's type.
  #[error("argument '{arg}' expected {expected:?}: {message}")]
  InvalidValue {
    arg: String,
    expected: ArgType,
    message: String,
  },

  /// An enum value is not one of the declared options.
  #[error("argument '{arg}' does not accept '{value}'")]
  NotAnOption { arg: String, value: String },
}
