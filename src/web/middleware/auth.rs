//! Login gate for the intake workflow.
//!
//! Off by default: every route is public. With `require_login` set, a request
//! without a stored account behind its session is sent to `/login` with a
//! flash message. A session opened by a discarded duplicate registration has
//! no account and does not pass.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::web::endpoints::found;
use crate::web::error::WebError;
use crate::web::session::Session;
use crate::web::types::WebContext;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

pub async fn require_login(req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<WebContext>() else {
        return WebError::Internal("missing web context".into()).into_response();
    };
    if !ctx.core.config.require_login {
        return next.run(req).await;
    }

    let Some(session) = req.extensions().get::<Session>().cloned() else {
        return WebError::Internal("missing session".into()).into_response();
    };
    if session.account_id().is_some() {
        return next.run(req).await;
    }

    tracing::warn!(path = req.uri().path(), "Anonymous request to a protected page");
    session.flash(LOGIN_REQUIRED_MESSAGE);
    found("/login")
}
