//! `GET /static/img/*file`: serve stored uploads back to the browser.

use std::path::Path;

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::web::error::WebError;
use crate::web::types::WebContext;

/// URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/static/img";

/// Public URL for a file stored at `relative` inside the upload directory.
pub fn public_url(relative: &Path) -> Option<String> {
    let mut url = url::Url::parse("http://localhost/").ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.clear();
        segments.extend(PUBLIC_PREFIX.trim_start_matches('/').split('/'));
        for part in relative.iter() {
            segments.push(part.to_str()?);
        }
    }
    Some(url.path().to_string())
}

pub async fn serve_image(
    State(ctx): State<WebContext>,
    UrlPath(file): UrlPath<String>,
) -> Result<Response, WebError> {
    // Anything that does not resolve inside the upload directory is a 404
    let path = ctx
        .core
        .uploads
        .resolve(&file)
        .map_err(|_| WebError::NotFound)?;
    if !path.is_file() {
        return Err(WebError::NotFound);
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| WebError::NotFound)?;
    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        bytes,
    )
        .into_response())
}
