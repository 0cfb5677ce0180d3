//! HTTP exposition endpoint for Prometheus scrapes

use super::PrometheusSink;
use crate::error::{AppError, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

const INDEX_PAGE: &str = "<html>\
<head><title>WAN Monitor</title></head>\
<body>\
<h1>WAN Monitor</h1>\
<p><a href=\"/metrics\">Metrics</a></p>\
</body>\
</html>";

/// Metrics HTTP server.
///
/// Binding and serving are split so that an unusable port is reported
/// before any probe runs.
pub struct MetricsServer {
    listener: TcpListener,
    sink: Arc<PrometheusSink>,
}

impl MetricsServer {
    /// Bind the listening socket
    pub async fn bind(addr: SocketAddr, sink: Arc<PrometheusSink>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::metrics(format!("Failed to bind metrics endpoint on {}: {}", addr, e)))?;

        Ok(Self { listener, sink })
    }

    /// Address actually bound, useful when binding port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::metrics(format!("Failed to get local addr: {}", e)))
    }

    /// Serve scrapes until the task is dropped
    pub async fn serve(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, "Serving metrics on http://{}/metrics", addr);

        axum::serve(self.listener, router(self.sink))
            .await
            .map_err(|e| AppError::metrics(format!("Metrics server error: {}", e)))
    }
}

/// Routes of the exposition endpoint
pub fn router(sink: Arc<PrometheusSink>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .with_state(sink)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn metrics(State(sink): State<Arc<PrometheusSink>>) -> Response {
    match sink.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
