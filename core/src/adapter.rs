//! Translation between the function gateway's invocation and
//! [`handler::handle`].
//!
//! `lambda_http` takes care of the envelope: API Gateway REST (v1), HTTP API
//! (v2) and function URL events all arrive as a plain [`Request`] with the
//! body already base64-decoded, and the returned [`Response`] is re-wrapped
//! in whichever envelope the event came in.

use std::collections::HashMap;

use lambda_http::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use lambda_http::{Body, Request, RequestExt, Response};

use crate::config::EchoConfig;
use crate::errors::Result;
use crate::handler;

pub const ALLOWED_METHODS: &str = "GET, HEAD, POST";

/// Runs one function invocation through the request handler.
///
/// HEAD is answered like GET with the body dropped; OPTIONS is a preflight
/// when CORS is enabled; every other method outside GET/POST gets a 405.
pub fn adapt(request: &Request, config: &EchoConfig) -> Result<Response<Body>> {
    let method = request.method().clone();
    let request_id = request
        .lambda_context_ref()
        .map(|ctx| ctx.request_id.as_str())
        .unwrap_or("-");
    let span = tracing::info_span!(
        "invocation",
        request_id,
        method = %method,
        path = request.uri().path(),
    );
    let _enter = span.enter();

    if method == Method::GET || method == Method::HEAD || method == Method::POST {
        let (query_params, json_body) = if method == Method::POST {
            (HashMap::new(), handler::parse_json_body(request.body().as_ref()))
        } else {
            (query_params(request), None)
        };

        let echoed = handler::handle(&method, &query_params, json_body.as_ref());
        let body = if method == Method::HEAD {
            Body::Empty
        } else {
            Body::from(serde_json::to_string(&echoed)?)
        };

        let mut response = respond(StatusCode::OK, body, config);
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        return Ok(response);
    }

    if method == Method::OPTIONS && config.cors.enabled {
        let mut response = respond(StatusCode::NO_CONTENT, Body::Empty, config);
        let requested = request
            .headers()
            .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested);
        return Ok(response);
    }

    tracing::warn!("unsupported method");
    let mut response = respond(StatusCode::METHOD_NOT_ALLOWED, Body::Empty, config);
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    Ok(response)
}

/// The URI carries the raw query string on every payload version; the
/// decoded parameter map is only a fallback, since v2 events split it on
/// commas.
fn query_params(request: &Request) -> HashMap<String, String> {
    if let Some(raw) = request.uri().query() {
        return handler::parse_query_string(raw);
    }
    let mut params = HashMap::new();
    let decoded = request.query_string_parameters_ref();
    for (key, value) in decoded.into_iter().flat_map(|q| q.iter()) {
        params
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
    params
}

fn respond(status: StatusCode, body: Body, config: &EchoConfig) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    cors_headers(response.headers_mut(), config);
    response
}

fn cors_headers(headers: &mut HeaderMap, config: &EchoConfig) {
    if config.cors.enabled {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
}
