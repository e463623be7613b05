//! The HTTP request executor.
//!
//! Issues one outbound HTTP call per node invocation and binds the response
//! under the node's declared variable name:
//!
//! ```json
//! {"myApiCall": {"httpResponse": {"status": 200, "statusText": "OK", "data": ...}}}
//! ```
//!
//! The endpoint and body are template-resolved against the current context.
//! For bodied methods (POST/PUT/PATCH) the resolved body must parse as JSON
//! before any network call happens, and a `Content-Type: application/json`
//! header is forced over any caller-supplied `httpHeaders` from the context.

use crate::context::ExecutionContext;
use crate::error::ExecutorError;
use crate::step::StepRunner;
use crate::template;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;

/// Context key holding caller-supplied request headers.
const HTTP_HEADERS_KEY: &str = "httpHeaders";

/// Default timeout for outbound requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP method for a request node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Returns true for methods that carry a request body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Configuration for an HTTP request node, as saved by the editor.
///
/// Fields are optional here because the editor saves partially-configured
/// nodes; required fields are enforced at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestConfig {
    /// Name the response is bound to in the context.
    pub variable_name: Option<String>,
    /// Request URL; may contain `{{...}}` placeholders.
    pub endpoint: Option<String>,
    /// Request method; defaults to GET.
    #[serde(default)]
    pub method: HttpMethod,
    /// Request body template for bodied methods.
    pub body: Option<String>,
}

/// Executes HTTP request nodes with a shared client and retry budget.
#[derive(Debug, Clone)]
pub struct HttpRequestExecutor {
    client: reqwest::Client,
    steps: StepRunner,
}

impl HttpRequestExecutor {
    /// Creates an executor with a default client and retry policy.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            steps: StepRunner::default(),
        }
    }

    /// Creates an executor with a custom client and step runner.
    #[must_use]
    pub fn with_client(client: reqwest::Client, steps: StepRunner) -> Self {
        Self { client, steps }
    }

    /// Executes the request and returns the context extended with the
    /// response binding.
    ///
    /// # Errors
    ///
    /// Returns a non-retriable `Configuration` error for missing required
    /// fields or a bodied request whose resolved body is not valid JSON;
    /// transient network failures surface as retriable `SideEffect` errors
    /// after the retry budget is spent.
    pub async fn execute(
        &self,
        config: &HttpRequestConfig,
        context: ExecutionContext,
    ) -> Result<ExecutionContext, ExecutorError> {
        let variable_name = config
            .variable_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ExecutorError::configuration("HTTP request node: variable name is required")
            })?;

        let endpoint_template = config.endpoint.as_deref().filter(|e| !e.is_empty()).ok_or_else(
            || ExecutorError::configuration("HTTP request node: endpoint is required"),
        )?;
        let endpoint = template::resolve(endpoint_template, &context);

        let method = config.method;
        let body = if method.has_body() {
            match &config.body {
                Some(body_template) => {
                    let resolved = template::resolve(body_template, &context);
                    serde_json::from_str::<JsonValue>(&resolved).map_err(|e| {
                        ExecutorError::configuration(format!(
                            "HTTP request node: body is not valid JSON: {e}"
                        ))
                    })?;
                    Some(resolved)
                }
                None => None,
            }
        } else {
            None
        };

        let headers = if method.has_body() {
            request_headers(&context)?
        } else {
            HeaderMap::new()
        };

        let payload = self
            .steps
            .run("http-request", || {
                self.send(method, &endpoint, headers.clone(), body.clone())
            })
            .await?;

        Ok(context.with_value(variable_name, json!({ "httpResponse": payload })))
    }

    /// Issues one physical request attempt.
    async fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<JsonValue, ExecutorError> {
        let mut request = self
            .client
            .request(method.as_reqwest(), endpoint)
            .headers(headers);

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExecutorError::timeout(format!("request to {endpoint} timed out"))
            } else {
                ExecutorError::side_effect(format!("request to {endpoint} failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExecutorError::side_effect(format!(
                "request to {endpoint} returned {status}"
            )));
        }

        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response.text().await.map_err(|e| {
            ExecutorError::side_effect(format!("failed to read response from {endpoint}: {e}"))
        })?;

        let data = if is_json {
            // Fall back to the raw text if the declared content type lies.
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        } else {
            JsonValue::String(text)
        };

        Ok(json!({
            "status": status.as_u16(),
            "statusText": status_text,
            "data": data,
        }))
    }
}

impl Default for HttpRequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the header map for a bodied request: caller-supplied `httpHeaders`
/// from the context, with `Content-Type: application/json` forced.
fn request_headers(context: &ExecutionContext) -> Result<HeaderMap, ExecutorError> {
    let mut headers = HeaderMap::new();

    if let Some(JsonValue::Object(supplied)) = context.get(HTTP_HEADERS_KEY) {
        for (name, value) in supplied {
            let Some(value) = value.as_str() else {
                continue;
            };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ExecutorError::configuration(format!("invalid request header name: {name}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                ExecutorError::configuration(format!("invalid request header value for {name}"))
            })?;
            headers.insert(name, value);
        }
    }

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}
