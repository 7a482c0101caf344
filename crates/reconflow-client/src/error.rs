use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("invalid url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The backend answered with a non-success status.
  #[error("backend returned {status}: {body}")]
  Status { status: u16, body: String },
}

impl ClientError {
  pub(crate) fn invalid_url(url: impl Into<String>, message: impl ToString) -> Self {
    Self::InvalidUrl {
      url: url.into(),
      message: message.to_string(),
    }
  }
}
