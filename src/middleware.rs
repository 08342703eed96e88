use super::errors::ServerError;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Handlers hand back bare strings, which axum labels `text/plain`. Every one
/// of them is HTML.
pub async fn html_headers<B>(
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ServerError> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str("text/html; charset=utf-8")?,
    );

    Ok(response)
}

pub async fn log_requests<B>(request: Request<B>, next: Next<B>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    log::info!(
        "{method} {path} -> {} in {:?}",
        response.status().as_u16(),
        start.elapsed()
    );

    response
}
