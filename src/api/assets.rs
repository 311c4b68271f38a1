//! Embedded chat page
//!
//! In development, falls back to serving from filesystem.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Serve an embedded file, with filesystem fallback for development
pub fn serve_asset(path: &str) -> Response {
    let path = path.trim_start_matches('/');

    let content = Assets::get(path)
        .map(|file| file.data.to_vec())
        .or_else(|| std::fs::read(PathBuf::from("ui").join(path)).ok());

    match content {
        Some(bytes) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], Body::from(bytes)).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    if let Some(content) = Assets::get("index.html") {
        return String::from_utf8(content.data.to_vec()).ok();
    }

    std::fs::read_to_string("ui/index.html").ok()
}
