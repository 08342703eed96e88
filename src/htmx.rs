/// HTMX utils
use super::components::{Component, Page};
use axum::http::HeaderMap;

/// htmx marks every request it makes. Anything else is the browser loading
/// the URL directly.
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.contains_key("Hx-Request")
}

/// Render just the fragment for htmx, or wrap it in a full page for a plain
/// browser request.
pub fn fragment_or_page<'a>(
    headers: &HeaderMap,
    title: &'a str,
    children: Box<dyn Component + 'a>,
) -> String {
    if is_htmx_request(headers) {
        children.render()
    } else {
        Page { title, children }.render()
    }
}
