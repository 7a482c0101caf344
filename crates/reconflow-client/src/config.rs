use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Connection settings for the execution backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
  /// Base URL of the HTTP API, e.g. `http://127.0.0.1:8000`.
  pub api_base: Url,
  /// Timeout for each HTTP request. Does not apply to the event channel.
  pub request_timeout: Duration,
}

impl ClientConfig {
  pub const DEFAULT_API_BASE: &'static str = "http://127.0.0.1:8000";
  pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

  pub fn new(api_base: &str) -> Result<Self, ClientError> {
    let api_base = Url::parse(api_base).map_err(|e| ClientError::invalid_url(api_base, e))?;
    if !matches!(api_base.scheme(), "http" | "https") {
      return Err(ClientError::invalid_url(api_base.as_str(), "scheme must be http or https"));
    }
    Ok(Self {
      api_base,
      request_timeout: Self::DEFAULT_TIMEOUT,
    })
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = timeout;
    self
  }

  /// URL of an API endpoint below the base, one path segment per element.
  pub fn api_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = self.api_base.clone();
    url
      .path_segments_mut()
      .map_err(|_| ClientError::invalid_url(self.api_base.as_str(), "base cannot have a path"))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// URL of a run's event channel: `ws(s)://{base}/ws/run/{run_id}`.
  pub fn event_channel_url(&self, run_id: &str) -> Result<Url, ClientError> {
    let mut url = self.api_url(&["ws", "run", run_id])?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url
      .set_scheme(scheme)
      .map_err(|_| ClientError::invalid_url(url.as_str(), "cannot switch to websocket scheme"))?;
    Ok(url)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_api_url_joins_segments() {
    let config = ClientConfig::new("http://127.0.0.1:8000").unwrap();
    assert_eq!(
      config.api_url(&["api", "tools"]).unwrap().as_str(),
      "http://127.0.0.1:8000/api/tools"
    );
  }

  #[test]
  fn test_api_url_keeps_base_path() {
    let config = ClientConfig::new("https://recon.example.com/backend/").unwrap();
    assert_eq!(
      config.api_url(&["api", "run"]).unwrap().as_str(),
      "https://recon.example.com/backend/api/run"
    );
  }

  #[test]
  fn test_event_channel_scheme() {
    let plain = ClientConfig::new("http://localhost:8000").unwrap();
    assert_eq!(
      plain.event_channel_url("a1b2").unwrap().as_str(),
      "ws://localhost:8000/ws/run/a1b2"
    );

    let tls = ClientConfig::new("https://recon.example.com").unwrap();
    assert_eq!(
      tls.event_channel_url("a1b2").unwrap().as_str(),
      "wss://recon.example.com/ws/run/a1b2"
    );
  }

  #[test]
  fn test_run_id_is_encoded() {
    let config = ClientConfig::new(ClientConfig::DEFAULT_API_BASE).unwrap();
    assert_eq!(
      config.event_channel_url("a/b").unwrap().as_str(),
      "ws://127.0.0.1:8000/ws/run/a%2Fb"
    );
  }

  #[test]
  fn test_rejects_non_http_base() {
    assert!(ClientConfig::new("ftp://example.com").is_err());
    assert!(ClientConfig::new("not a url").is_err());
  }
}
