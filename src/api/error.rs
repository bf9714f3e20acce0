use thiserror::Error;

/// Failure of a call to the inventory backend.
///
/// Cloneable so a single failed request can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// The request never produced a response (connection refused, timeout, ...)
  #[error("{0}")]
  Transport(String),

  /// The backend answered with a non-2xx status
  #[error("{message}")]
  Http { status: u16, message: String },

  /// The response body was not the JSON we expected
  #[error("Failed to decode response: {0}")]
  Decode(String),

  #[error("Invalid URL: {0}")]
  InvalidUrl(String),
}

impl ApiError {
  /// Build an HTTP error from a response body, preferring the backend's
  /// `message` field when the body carries one.
  pub fn from_response(status: u16, body: &[u8]) -> Self {
    let message = serde_json::from_slice::<serde_json::Value>(body)
      .ok()
      .and_then(|v| v.get("message")?.as_str().map(String::from))
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| format!("Request failed with status code {}", status));

    ApiError::Http { status, message }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    ApiError::Transport(e.to_string())
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self {
    ApiError::Decode(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_message_from_body() {
    let err = ApiError::from_response(422, br#"{"message":"Price must be positive"}"#);
    assert_eq!(err.to_string(), "Price must be positive");
    assert_eq!(err.status(), Some(422));
  }

  #[test]
  fn test_generic_message_without_body() {
    let err = ApiError::from_response(404, b"");
    assert_eq!(err.to_string(), "Request failed with status code 404");
  }

  #[test]
  fn test_generic_message_for_non_string_field() {
    let err = ApiError::from_response(500, br#"{"message":{"nested":true}}"#);
    assert_eq!(err.to_string(), "Request failed with status code 500");
  }

  #[test]
  fn test_transport_has_no_status() {
    let err = ApiError::Transport("connection refused".into());
    assert_eq!(err.status(), None);
    assert_eq!(err.to_string(), "connection refused");
  }
}
