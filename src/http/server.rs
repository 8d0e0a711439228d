//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, request logging, timeout, errors)
//! - Bind server to listener
//! - Apply hot-reloaded configuration to the running service

use arc_swap::ArcSwap;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::MonitorConfig;
use crate::http::handlers;
use crate::http::middleware::{handle_errors, log_requests};
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::Shutdown;
use crate::observability::Monitor;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub config: Arc<ArcSwap<MonitorConfig>>,
    pub prometheus: Option<PrometheusHandle>,
}

/// HTTP front of the monitoring service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(
        config: MonitorConfig,
        monitor: Arc<Monitor>,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState {
            monitor,
            config: Arc::new(ArcSwap::from_pointee(config)),
            prometheus,
        };
        let router = Self::build_router(state.clone(), request_timeout);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::prometheus))
            .route("/api/metrics", get(handlers::metrics_json))
            .route("/api/logs", get(handlers::recent_logs))
            .route("/api/maintenance/cleanup", post(handlers::cleanup_logs))
            .route("/api/vaults/{id}/transitions", post(handlers::record_transition))
            .route("/api/vaults/{id}/resets", post(handlers::record_reset))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(from_fn_with_state(state.clone(), log_requests))
                    .layer(TimeoutLayer::new(request_timeout))
                    .layer(from_fn_with_state(state.clone(), handle_errors)),
            )
            .with_state(state)
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` fires, applying config updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<MonitorConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(
            self.state.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(Shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_config_updates(
    state: AppState,
    mut updates: mpsc::UnboundedReceiver<MonitorConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => apply_config(&state, config),
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

/// Swap in a reloaded config. Thresholds and the production flag apply
/// immediately; listener, log directory and timeouts need a restart.
pub fn apply_config(state: &AppState, config: MonitorConfig) {
    let current = state.config.load();
    if current.listener.bind_address != config.listener.bind_address
        || current.logging.log_dir != config.logging.log_dir
        || current.timeouts.request_secs != config.timeouts.request_secs
    {
        tracing::warn!("Listener, log directory or timeout changed; restart to apply");
    }

    state.monitor.set_thresholds(config.health);
    tracing::info!(
        degraded_errors = config.health.degraded_errors,
        unhealthy_errors = config.health.unhealthy_errors,
        production = config.logging.production,
        "Configuration reloaded"
    );
    state.config.store(Arc::new(config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MonitorSettings;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn server_in(dir: &std::path::Path) -> HttpServer {
        let monitor = Arc::new(Monitor::new(MonitorSettings::in_dir(dir)));
        HttpServer::new(MonitorConfig::default(), monitor, None)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(dir.path());

        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_requests_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(dir.path());

        for _ in 0..3 {
            server
                .router()
                .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
                .await
                .unwrap();
        }
        assert_eq!(server.state().monitor.get_metrics().requests, 3);
    }

    #[tokio::test]
    async fn test_transition_and_reset_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(dir.path());

        let transition = Request::post("/api/vaults/v-7/transitions")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"from":"active","to":"pending"}"#))
            .unwrap();
        let response = server.router().oneshot(transition).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let reset = Request::post("/api/vaults/v-7/resets")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"signature":"5xSig","amount":0.25}"#))
            .unwrap();
        let response = server.router().oneshot(reset).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let metrics = server.state().monitor.get_metrics();
        assert_eq!(metrics.vault_transitions, 1);
        assert_eq!(metrics.timer_resets, 1);
    }

    #[tokio::test]
    async fn test_invalid_reset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(dir.path());

        let reset = Request::post("/api/vaults/v-7/resets")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"signature":"  ","amount":1.0}"#))
            .unwrap();
        let response = server.router().oneshot(reset).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(server.state().monitor.get_metrics().timer_resets, 0);
    }

    #[tokio::test]
    async fn test_prometheus_disabled_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(dir.path());

        let response = server
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_apply_config_swaps_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(dir.path());

        let mut config = MonitorConfig::default();
        config.health.degraded_errors = 1;
        config.health.unhealthy_errors = 2;
        config.logging.production = true;
        apply_config(server.state(), config);

        assert_eq!(server.state().monitor.thresholds().unhealthy_errors, 2);
        assert!(server.state().config.load().logging.production);
    }
}
