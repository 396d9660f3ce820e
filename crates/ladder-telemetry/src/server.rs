//! `GET /metrics` exporter using axum.

use std::net::SocketAddr;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::TelemetryResult;
use crate::metrics::Metrics;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub fn create_router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn metrics_handler() -> Response {
    match Metrics::render() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Bind the exporter socket on `0.0.0.0:port`.
pub async fn bind_metrics(port: u16) -> TelemetryResult<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Metrics server listening");
    Ok(listener)
}

/// Serve metrics on `0.0.0.0:port` until `shutdown` fires.
pub async fn serve_metrics(port: u16, shutdown: CancellationToken) -> TelemetryResult<()> {
    let listener = bind_metrics(port).await?;
    serve_listener(listener, shutdown).await
}

/// Serve metrics on an already bound listener until `shutdown` fires.
pub async fn serve_listener(listener: TcpListener, shutdown: CancellationToken) -> TelemetryResult<()> {
    axum::serve(listener, create_router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_returns_text_format() {
        Metrics::order_placed("sell");
        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_server_stops_on_shutdown() {
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve_metrics(0, token.clone()));
        token.cancel();
        tokio_test::assert_ok!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_port_in_use_fails_at_bind() {
        let taken = bind_metrics(0).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind_metrics(port).await.unwrap_err();
        assert!(matches!(err, crate::TelemetryError::Io(_)));
    }
}
