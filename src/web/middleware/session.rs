//! Session middleware.
//!
//! Reads the signed session cookie into a `Session` handle for the rest of the
//! stack, then writes the cookie back when a handler changed the session.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::web::error::WebError;
use crate::web::session::{read_cookie, write_cookie, Session};
use crate::web::types::WebContext;

pub async fn load_session(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<WebContext>().cloned() else {
        return WebError::Internal("missing web context".into()).into_response();
    };
    let signer = &ctx.core.signer;

    let session = Session::new(read_cookie(req.headers(), signer));
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if let Some(data) = session.changed_data() {
        write_cookie(response.headers_mut(), &data, signer);
    }
    response
}
