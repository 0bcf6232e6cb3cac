use axum::response::Html;
use axum::Extension;

use super::page_context;
use crate::web::session::Session;
use crate::web::templates;

/// `GET /`
pub async fn index(Extension(session): Extension<Session>) -> Html<String> {
    Html(templates::home_page(&page_context(&session)))
}
