//! Browser UI assets, compiled into the binary.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

const INDEX_HTML: &str = include_str!("../../static/index.html");
const APP_JS: &str = include_str!("../../static/app.js");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn static_file(Path(path): Path<String>) -> Response {
    match lookup(&path) {
        Some((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn lookup(path: &str) -> Option<(&'static str, &'static str)> {
    match path {
        "index.html" => Some(("text/html; charset=utf-8", INDEX_HTML)),
        "app.js" => Some(("application/javascript; charset=utf-8", APP_JS)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("app.js").map(|(ct, _)| ct), Some("application/javascript; charset=utf-8"));
        assert!(lookup("index.html").is_some());
        assert!(lookup("../Cargo.toml").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_index_references_script() {
        assert!(INDEX_HTML.contains("/static/app.js"));
    }
}
