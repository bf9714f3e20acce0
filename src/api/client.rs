use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::{debug, error};
use url::Url;

use super::error::ApiError;

/// HTTP verbs the inventory backend understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Method::Get => "GET",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Delete => "DELETE",
    };
    f.write_str(name)
  }
}

/// A single call against the backend, path relative to the base URL
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method: Method,
  pub path: String,
  pub body: Option<Value>,
}

impl Request {
  pub fn get(path: impl Into<String>) -> Self {
    Self {
      method: Method::Get,
      path: path.into(),
      body: None,
    }
  }

  pub fn post(path: impl Into<String>, body: Value) -> Self {
    Self {
      method: Method::Post,
      path: path.into(),
      body: Some(body),
    }
  }

  pub fn put(path: impl Into<String>, body: Value) -> Self {
    Self {
      method: Method::Put,
      path: path.into(),
      body: Some(body),
    }
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self {
      method: Method::Delete,
      path: path.into(),
      body: None,
    }
  }
}

/// Anything that can carry a request to the backend and hand back its JSON body.
///
/// An empty response body (as returned by DELETE) comes back as `Value::Null`.
#[async_trait]
pub trait RemoteClient: Send + Sync {
  async fn send(&self, request: Request) -> Result<Value, ApiError>;
}

/// reqwest-backed client for the inventory REST API
#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  base_url: Url,
}

impl HttpClient {
  pub fn new(base_url: &str) -> Result<Self, ApiError> {
    let base_url = normalize_base(base_url)?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("stockroom/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url_for(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
  }
}

/// Make sure the base URL ends in a slash so joins append rather than
/// replace the last path segment.
fn normalize_base(base_url: &str) -> Result<Url, ApiError> {
  let mut url =
    Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

#[async_trait]
impl RemoteClient for HttpClient {
  async fn send(&self, request: Request) -> Result<Value, ApiError> {
    let url = self.url_for(&request.path)?;
    debug!(method = %request.method, %url, "sending request");

    let builder = match request.method {
      Method::Get => self.http.get(url),
      Method::Post => self.http.post(url),
      Method::Put => self.http.put(url),
      Method::Delete => self.http.delete(url),
    };
    let builder = match &request.body {
      // .json() also sets Content-Type: application/json
      Some(body) => builder.json(body),
      None => builder.header(reqwest::header::CONTENT_TYPE, "application/json"),
    };

    let result: Result<Value, ApiError> = async {
      let response = builder.send().await?;
      let status = response.status();
      let body = response.bytes().await?;

      if !status.is_success() {
        return Err(ApiError::from_response(status.as_u16(), &body));
      }
      if body.is_empty() {
        return Ok(Value::Null);
      }
      Ok(serde_json::from_slice(&body)?)
    }
    .await;

    if let Err(e) = &result {
      error!(method = %request.method, path = %request.path, error = %e, "API error");
    }
    result
  }
}
