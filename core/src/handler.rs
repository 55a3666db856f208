use std::collections::HashMap;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GREETING_PREFIX: &str = "Hello! You sent: ";

/// Key read from both the query string and the JSON body.
pub const QUERY_KEY: &str = "query";

/// Body returned for every in-contract request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DemoResponse {
    pub greeting: String,
    pub query: String,
}

impl DemoResponse {
    pub fn for_query(query: String) -> Self {
        Self {
            greeting: format!("{GREETING_PREFIX}{query}"),
            query,
        }
    }
}

/// Produces the echo response for one request.
///
/// The method alone decides where the query comes from: POST reads the JSON
/// body, anything else reads the query string. There is no fallback between
/// the two, and absent or malformed input yields an empty query.
pub fn handle(
    method: &Method,
    query_params: &HashMap<String, String>,
    json_body: Option<&Value>,
) -> DemoResponse {
    let query = if method == Method::POST {
        json_body
            .and_then(Value::as_object)
            .and_then(|body| body.get(QUERY_KEY))
            .map(render_query_value)
            .unwrap_or_default()
    } else {
        query_params.get(QUERY_KEY).cloned().unwrap_or_default()
    };

    tracing::debug!(%method, query_len = query.len(), "echoing query");
    DemoResponse::for_query(query)
}

/// Strings pass through untouched, `null` counts as absent, anything else is
/// echoed as its compact JSON text.
fn render_query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decodes a raw `application/x-www-form-urlencoded` query string.
/// The first occurrence of a repeated key wins.
pub fn parse_query_string(raw: &str) -> HashMap<String, String> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Tolerant body parsing: empty, non-UTF-8 or non-JSON bodies are all
/// treated as no body at all.
pub fn parse_json_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring unparsable request body");
            None
        }
    }
}
