//! Error-handling middleware.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::http::error::FailedRequest;
use crate::http::server::AppState;
use crate::observability::Monitor;

/// Body message for internal errors when running in production.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Record internal handler errors and render them for the client.
pub async fn handle_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(FailedRequest(error)) = response.extensions_mut().remove::<FailedRequest>() else {
        return response;
    };

    let production = state.config.load().logging.production;
    error_response(
        &state.monitor,
        production,
        error.as_ref(),
        Some(json!({ "method": method, "path": path })),
    )
}

/// Log `error` and build a 500 response, hiding the message in production.
pub fn error_response(
    monitor: &Monitor,
    production: bool,
    error: &(dyn std::error::Error + 'static),
    context: Option<Value>,
) -> Response {
    monitor.log_error(error, context);

    let message = if production {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        error.to_string()
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
