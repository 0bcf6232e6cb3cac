use std::path::Path;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Extension;
use serde::Deserialize;

use super::page_context;
use crate::web::endpoints::uploads::public_url;
use crate::web::error::WebError;
use crate::web::session::Session;
use crate::web::templates;
use crate::web::types::WebContext;

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub url: Option<String>,
}

/// `GET /predict?url=<path>`
///
/// The path must point at a file inside the upload directory. Preprocessing
/// and the forward pass run on the blocking pool.
pub async fn predict(
    State(ctx): State<WebContext>,
    Extension(session): Extension<Session>,
    Query(query): Query<PredictQuery>,
) -> Result<Html<String>, WebError> {
    let raw = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return Err(WebError::BadRequest("Missing url parameter".into())),
    };

    let path = ctx.core.uploads.resolve(&raw)?;

    let core = ctx.core.clone();
    let image_path = path.clone();
    let label =
        tokio::task::spawn_blocking(move || core.inference.predict_path(&image_path)).await??;

    tracing::debug!(%label, path = %path.display(), "Prediction");

    let image_src = path
        .strip_prefix(ctx.core.uploads.dest())
        .ok()
        .and_then(public_url);

    Ok(Html(templates::predict_page(
        &page_context(&session),
        &label.to_string(),
        &display_path(&path),
        image_src.as_deref(),
    )))
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
