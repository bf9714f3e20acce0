//! Scripted in-memory backend for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::client::{Method, RemoteClient, Request};
use super::error::ApiError;

/// Records every request and answers from a table of canned responses.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeClient {
  routes: Mutex<HashMap<(Method, String), Result<Value, ApiError>>>,
  requests: Mutex<Vec<Request>>,
}

impl FakeClient {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, method: Method, path: &str, body: Value) {
    self
      .routes
      .lock()
      .unwrap()
      .insert((method, path.to_string()), Ok(body));
  }

  pub fn fail(&self, method: Method, path: &str, error: ApiError) {
    self
      .routes
      .lock()
      .unwrap()
      .insert((method, path.to_string()), Err(error));
  }

  pub fn requests(&self) -> Vec<Request> {
    self.requests.lock().unwrap().clone()
  }

  pub fn count(&self, method: Method, path: &str) -> usize {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.method == method && r.path == path)
      .count()
  }
}

#[async_trait]
impl RemoteClient for FakeClient {
  async fn send(&self, request: Request) -> Result<Value, ApiError> {
    let key = (request.method, request.path.clone());
    self.requests.lock().unwrap().push(request);

    self
      .routes
      .lock()
      .unwrap()
      .get(&key)
      .cloned()
      .unwrap_or_else(|| Err(ApiError::from_response(404, b"")))
  }
}

/// Holds every request until `release` is called, then answers `null`.
#[derive(Default)]
pub struct GatedClient {
  gate: tokio::sync::Notify,
}

impl GatedClient {
  pub fn new() -> Self {
    Self::default()
  }

  /// Let one waiting (or the next) request through
  pub fn release(&self) {
    self.gate.notify_one();
  }
}

#[async_trait]
impl RemoteClient for GatedClient {
  async fn send(&self, _request: Request) -> Result<Value, ApiError> {
    self.gate.notified().await;
    Ok(Value::Null)
  }
}
