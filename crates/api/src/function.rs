//! Cloud-function entrypoint.
//!
//! Translates a JSON invocation event into an HTTP request, runs it through the same
//! router the server uses, and folds the response back into the event-result shape.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower::ServiceExt;

use crate::app::{self, InventoryService};

/// Path used when an event does not carry one.
pub const DEFAULT_PATH: &str = "/inventory";

/// Incoming invocation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// Invocation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("invalid http method: {0}")]
    Method(String),

    #[error("invalid request: {0}")]
    Request(String),

    #[error("body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Handles function invocations against one long-lived router.
#[derive(Clone)]
pub struct FunctionHandler {
    router: Router,
}

impl FunctionHandler {
    pub fn new(services: Arc<InventoryService>) -> Self {
        Self {
            router: app::build_app(services),
        }
    }

    /// Run one event. Malformed events become a 400 result rather than an error.
    pub async fn handle(&self, event: FunctionEvent) -> FunctionResponse {
        match invoke(self.router.clone(), event).await {
            Ok(res) => res,
            Err(e) => FunctionResponse::rejected(&e.to_string()),
        }
    }

    /// Run a raw JSON event (the shape a function host hands over).
    pub async fn handle_json(&self, event: serde_json::Value) -> FunctionResponse {
        match serde_json::from_value::<FunctionEvent>(event) {
            Ok(event) => self.handle(event).await,
            Err(e) => FunctionResponse::rejected(&format!("malformed event: {e}")),
        }
    }
}

impl FunctionResponse {
    fn rejected(message: &str) -> Self {
        tracing::info!(error = %message, "rejected function event");
        let headers = BTreeMap::from([
            ("content-type".to_string(), "application/json".to_string()),
            ("access-control-allow-origin".to_string(), "*".to_string()),
        ]);
        Self {
            status_code: StatusCode::BAD_REQUEST.as_u16(),
            headers,
            body: json!({ "error": message, "code": "invalid_event" }).to_string(),
            is_base64_encoded: false,
        }
    }
}

/// Dispatch one event through `router`.
pub async fn invoke(router: Router, event: FunctionEvent) -> Result<FunctionResponse, FunctionError> {
    let request = to_request(event)?;

    let response = match router.oneshot(request).await {
        Ok(res) => res,
        Err(never) => match never {},
    };

    let status_code = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| FunctionError::Body(e.to_string()))?;

    Ok(FunctionResponse {
        status_code,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
        is_base64_encoded: false,
    })
}

fn to_request(event: FunctionEvent) -> Result<Request<Body>, FunctionError> {
    let method = Method::from_bytes(event.http_method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| FunctionError::Method(event.http_method.clone()))?;

    let path = event
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PATH);
    let uri = match event.query_string_parameters.as_ref().filter(|q| !q.is_empty()) {
        Some(params) => {
            let query = serde_urlencoded::to_string(params)
                .map_err(|e| FunctionError::Request(e.to_string()))?;
            format!("{path}?{query}")
        }
        None => path.to_string(),
    };

    let body = match event.body {
        Some(body) if event.is_base64_encoded => STANDARD.decode(body.as_bytes())?,
        Some(body) => body.into_bytes(),
        None => Vec::new(),
    };

    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body))
        .map_err(|e| FunctionError::Request(e.to_string()))?;

    for (name, value) in event.headers.unwrap_or_default() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FunctionError::Request(format!("header {name}: {e}")))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| FunctionError::Request(format!("header {name}: {e}")))?;
        request.headers_mut().append(name, value);
    }

    Ok(request)
}
