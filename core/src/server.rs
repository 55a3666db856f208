//! HTTP transport for the demo endpoint.
//!
//! The route table is built once by [`router`] and never mutated afterwards;
//! the cross-origin policy is applied as a layer when the config asks for it.

use std::collections::HashMap;
use std::future::Future;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery},
    http::Method,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::EchoConfig;
use crate::errors::Result;
use crate::handler::{self, DemoResponse};

pub const DEMO_PATH: &str = "/demo";

/// Builds the application: `GET /demo` and `POST /demo`, plus the optional
/// CORS layer and request tracing.
///
/// Bodies are not size-capped here; the function gateway enforces its own
/// payload limit and both transports must agree below it.
pub fn router(config: &EchoConfig) -> Router {
    let app = Router::new()
        .route(DEMO_PATH, get(demo).post(demo))
        .layer(DefaultBodyLimit::disable());

    let app = if config.cors.enabled {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

async fn demo(
    method: Method,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Json<DemoResponse> {
    let query_params = if method == Method::POST {
        HashMap::new()
    } else {
        raw_query
            .as_deref()
            .map(handler::parse_query_string)
            .unwrap_or_default()
    };
    let json_body = if method == Method::POST {
        handler::parse_json_body(&body)
    } else {
        None
    };

    Json(handler::handle(&method, &query_params, json_body.as_ref()))
}

pub async fn bind(config: &EchoConfig) -> Result<TcpListener> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serves until `shutdown` resolves, then lets in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, config: &EchoConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(cors = config.cors.enabled, "Serving {}", DEMO_PATH);
    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn send(
        app: Router,
        request: Request<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    #[tokio::test]
    async fn test_get_echoes_query() {
        let app = router(&EchoConfig::default());
        let request = Request::get("/demo?query=hi").body(Body::empty()).unwrap();

        let (status, headers, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(&body[..], br#"{"greeting":"Hello! You sent: hi","query":"hi"}"#);
    }

    #[tokio::test]
    async fn test_post_ignores_content_type() {
        let app = router(&EchoConfig::default());
        let request = Request::post("/demo")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(r#"{"query":"test"}"#))
            .unwrap();

        let (status, _, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        let resp: DemoResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.query, "test");
    }

    #[tokio::test]
    async fn test_unrouted_requests() {
        let app = router(&EchoConfig::default());
        let (status, _, _) = send(
            app.clone(),
            Request::put("/demo").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::get("/other").body(Body::empty()).unwrap();
        let (status, _, _) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let mut config = EchoConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;

        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_head_answers_like_get() {
        let app = router(&EchoConfig::default());
        let request = Request::head("/demo?query=hi").body(Body::empty()).unwrap();

        let (status, _, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_large_body_is_accepted() {
        let query = "a".repeat(3 * 1024 * 1024);
        let body = serde_json::json!({ "query": query }).to_string();
        let request = Request::post("/demo").body(Body::from(body)).unwrap();

        let (status, _, body) = send(router(&EchoConfig::default()), request).await;
        assert_eq!(status, StatusCode::OK);
        let resp: DemoResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.query.len(), query.len());
    }

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut config = EchoConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        let listener = bind(&config).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            serve(listener, &config, async move {
                let _ = stop_rx.await;
            })
            .await
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = "GET /demo?query=live HTTP/1.1\r\n\
                       Host: localhost\r\n\
                       Connection: close\r\n\r\n";
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let raw = String::from_utf8(raw).unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with(r#"{"greeting":"Hello! You sent: live","query":"live"}"#));

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
