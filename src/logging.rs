//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a request or response body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    log_request(&parts, &body);

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &body);

    Response::from_parts(parts, Body::from(body))
}

/// The body as text, cut to at most [LOG_BODY_LENGTH_LIMIT] bytes.
///
/// Returns the text and whether it was truncated.
fn truncate_body(body: &Bytes) -> (String, bool) {
    let text = String::from_utf8_lossy(body);

    if text.len() <= LOG_BODY_LENGTH_LIMIT {
        return (text.into_owned(), false);
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    (text[..end].to_owned(), true)
}

fn log_request(parts: &axum::http::request::Parts, body: &Bytes) {
    let (text, truncated) = truncate_body(body);

    if truncated {
        tracing::info!(
            "Received request: {} {}\nbody: {text}...",
            parts.method,
            parts.uri
        );
        tracing::debug!("Full request body: {:?}", String::from_utf8_lossy(body));
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {text:?}",
            parts.method,
            parts.uri
        );
    }

    tracing::debug!("Request headers: {:#?}", parts.headers);
}

fn log_response(parts: &axum::http::response::Parts, body: &Bytes) {
    let (text, truncated) = truncate_body(body);

    if truncated {
        tracing::info!("Sending response: {}\nbody: {text}...", parts.status);
        tracing::debug!("Full response body: {:?}", String::from_utf8_lossy(body));
    } else {
        tracing::info!("Sending response: {}\nbody: {text:?}", parts.status);
    }

    tracing::debug!("Response headers: {:#?}", parts.headers);
}
