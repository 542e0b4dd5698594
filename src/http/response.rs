//! Responses produced by the server itself rather than by a chain.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, StatusCode},
    response::Response,
};

use crate::admission::Rejection;
use crate::context::Context;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

fn plain(status: StatusCode, body: String) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}

/// 404 naming the unmatched method and path.
pub fn not_found(method: &Method, path: &str) -> Response {
    plain(
        StatusCode::NOT_FOUND,
        format!("Route({method} {path}) not found"),
    )
}

pub fn payload_too_large(limit: usize) -> Response {
    plain(
        StatusCode::PAYLOAD_TOO_LARGE,
        format!("Request body exceeds {limit} bytes"),
    )
}

/// Write an admission rejection into the context's response.
///
/// The request-ID header set at bind time is kept.
pub(crate) fn reject(ctx: &mut Context, rejection: Rejection) {
    let writer = ctx.response_mut();
    writer.fail(rejection.status(), rejection.marker());

    if let Some(secs) = rejection.retry_after_secs() {
        writer.insert_raw(header::RETRY_AFTER, HeaderValue::from(secs));
    }
}
