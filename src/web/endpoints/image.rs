use axum::extract::{Multipart, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;

use super::{found, page_context};
use crate::forms::{FormErrors, UploadForm};
use crate::web::error::WebError;
use crate::web::session::Session;
use crate::web::templates;
use crate::web::types::WebContext;

/// Multipart field carrying the image.
pub const PHOTO_FIELD: &str = "photo";

fn render(session: &Session, errors: &FormErrors) -> Response {
    Html(templates::image_page(&page_context(session), errors)).into_response()
}

/// `GET /image`
pub async fn image_form(Extension(session): Extension<Session>) -> Response {
    render(&session, &FormErrors::new())
}

/// `POST /image`
///
/// Stores the file and redirects to `/predict?url=<absolute path>`. A file
/// outside the extension allow-list is refused before anything touches disk.
pub async fn upload(
    State(ctx): State<WebContext>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        form.file_name = field.file_name().map(str::to_string);
        form.bytes = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(format!("Failed to read file data: {e}")))?
            .to_vec();
    }

    let upload = match form.validate() {
        Ok(upload) => upload,
        Err(errors) => {
            tracing::warn!("Upload refused by form validation");
            return Ok(render(&session, &errors));
        }
    };

    let store = ctx.core.uploads.clone();
    let path =
        tokio::task::spawn_blocking(move || store.save(&upload.file_name, &upload.bytes)).await??;

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("url", &path.to_string_lossy())
        .finish();
    Ok(found(&format!("/predict?{query}")))
}
