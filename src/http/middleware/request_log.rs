//! Request-observing middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

use crate::http::request::request_info;
use crate::http::server::AppState;

/// Time each request from arrival to response and hand it to the monitor.
pub async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let info = request_info(&request);

    let response = next.run(request).await;

    state
        .monitor
        .log_request(&info, response.status().as_u16(), started.elapsed());
    response
}
