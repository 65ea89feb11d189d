//! Short-lived hosting: one JSON-described request in, one JSON response out.
//!
//! Used by the `task-invoke` binary, where every process handles a single
//! request and exits, as a serverless function would.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when the body is JSON, a string otherwise, `None` when empty.
    pub body: Option<Value>,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("invalid invocation: {0}")]
    InvalidRequest(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

pub async fn invoke(router: Router, invocation: Invocation) -> Result<InvocationResponse, InvokeError> {
    let request = to_request(invocation)?;

    let response = match router.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let (parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| InvokeError::Body(e.to_string()))?
        .to_bytes();

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = if bytes.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        )
    };

    Ok(InvocationResponse {
        status: parts.status.as_u16(),
        headers,
        body,
    })
}

fn to_request(invocation: Invocation) -> Result<Request<Body>, InvokeError> {
    let method = Method::from_bytes(invocation.method.to_ascii_uppercase().as_bytes())
        .map_err(|e| InvokeError::InvalidRequest(e.to_string()))?;

    let mut builder = Request::builder().method(method).uri(invocation.path.as_str());
    for (name, value) in &invocation.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let body = match invocation.body {
        Some(value) => {
            let has_content_type = invocation
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                builder = builder.header("content-type", "application/json");
            }
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    builder
        .body(body)
        .map_err(|e| InvokeError::InvalidRequest(e.to_string()))
}
