//! Mapping of backend error responses to submission errors.
//!
//! The backend rejects a run with either a structured issue list or a bare
//! `detail`:
//!
//! ```json
//! {"errors": [{"node_id": "n2", "reason": {"kind": "unknown_tool", "tool": "amass"}}]}
//! {"errors": [{"node_id": "n2", "reason": "Unknown tool: amass"}]}
//! {"detail": "Unknown tool: amass"}
//! ```

use reconflow_session::{SubmissionError, SubmissionIssue, SubmissionReason};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  errors: Option<Vec<WireIssue>>,
  #[serde(default)]
  detail: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireIssue {
  #[serde(default)]
  node_id: Option<String>,
  reason: Value,
}

/// Build a submission error from a non-success run response.
///
/// Client errors (4xx) are rejections. Anything else means the backend is
/// unavailable.
pub(crate) fn submission_error(status: u16, body: &str) -> SubmissionError {
  if !(400..500).contains(&status) {
    return unavailable(format!("backend returned {}", status));
  }

  let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
    return SubmissionError::rejected(non_empty(body, status));
  };

  if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
    let issues = errors
      .into_iter()
      .map(|issue| SubmissionIssue {
        node_id: issue.node_id,
        reason: reason_from(issue.reason),
      })
      .collect();
    return SubmissionError::new(issues);
  }

  match parsed.detail {
    Some(Value::String(message)) => SubmissionError::rejected(message),
    Some(other) => SubmissionError::rejected(other.to_string()),
    None => SubmissionError::rejected(non_empty(body, status)),
  }
}

pub(crate) fn unavailable(message: impl Into<String>) -> SubmissionError {
  SubmissionError::new(vec![SubmissionIssue {
    node_id: None,
    reason: SubmissionReason::Unavailable {
      message: message.into(),
    },
  }])
}

fn reason_from(raw: Value) -> SubmissionReason {
  match raw {
    Value::String(message) => SubmissionReason::Rejected { message },
    other => serde_json::from_value::<SubmissionReason>(other.clone()).unwrap_or_else(|_| {
      SubmissionReason::Rejected {
        message: other.to_string(),
      }
    }),
  }
}

fn non_empty(body: &str, status: u16) -> String {
  let body = body.trim();
  if body.is_empty() {
    format!("backend returned {}", status)
  } else {
    body.to_string()
  }
}
