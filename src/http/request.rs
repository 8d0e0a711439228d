//! Request identification and summarisation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Summarise a request for the monitor (method, path, agent, client address)
//!
//! # Design Decisions
//! - Request ID added as early as possible so every log line can carry it
//! - Client address prefers the first `x-forwarded-for` hop over the socket peer

use axum::extract::ConnectInfo;
use axum::http::{HeaderValue, Request};
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::observability::RequestInfo;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Issues UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Summarise a request for [`crate::observability::Monitor::log_request`].
pub fn request_info<B>(request: &Request<B>) -> RequestInfo {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let forwarded = header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|hop| hop.trim().to_string()))
        .filter(|hop| !hop.is_empty());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    RequestInfo {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        user_agent: header("user-agent"),
        remote_addr: forwarded.or(peer),
        request_id: header(X_REQUEST_ID),
    }
}
