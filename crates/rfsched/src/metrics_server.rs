use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use rfsched_core::BindingMetrics;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Content type of the Prometheus text exposition format
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// HTTP endpoint exposing the binding counters
pub struct MetricsServer {
    listen_addr: SocketAddr,
    metrics: Arc<BindingMetrics>,
}

impl MetricsServer {
    pub fn new(listen_addr: SocketAddr, metrics: Arc<BindingMetrics>) -> Self {
        Self {
            listen_addr,
            metrics,
        }
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render_metrics))
            .route("/healthz", get(healthz))
            .layer(TraceLayer::new_for_http())
            .with_state(self.metrics.clone())
    }

    /// Bind the listener and serve in the background.
    ///
    /// Binding happens before returning so a busy port fails startup.
    pub async fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        let app = self.build_router();
        let listener = TcpListener::bind(self.listen_addr).await?;

        info!("Serving metrics on {}", listener.local_addr()?);

        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server error: {}", e);
            }
        }))
    }
}

async fn render_metrics(State(metrics): State<Arc<BindingMetrics>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        metrics.render_prometheus(),
    )
}

/// Health check endpoint
async fn healthz() -> &'static str {
    "ok"
}
