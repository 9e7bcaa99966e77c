use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "src/dashboard/assets/"]
struct Assets;

/// GET /{*path} — Embedded dashboard script and stylesheet.
pub async fn serve_asset(axum::extract::Path(path): axum::extract::Path<String>) -> Response {
    serve_file(&path, "public, max-age=3600")
}

/// GET / — The dashboard page. Never cached so a refresh picks up new builds.
pub async fn serve_index() -> Response {
    serve_file("index.html", "no-cache")
}

fn serve_file(path: &str, cache_control: &'static str) -> Response {
    let Some(content) = Assets::get(path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, cache_control.to_string()),
        ],
        content.data.into_owned(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_html() {
        let response = serve_file("index.html", "no-cache");
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[test]
    fn test_script_mime() {
        let response = serve_file("app.js", "public, max-age=3600");
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"));
    }

    #[test]
    fn test_missing_asset() {
        assert_eq!(
            serve_file("missing.png", "no-cache").status(),
            StatusCode::NOT_FOUND
        );
    }
}
