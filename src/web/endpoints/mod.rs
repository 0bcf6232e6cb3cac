//! Page handlers. Each GET renders a form, each POST validates, performs its
//! side effect and redirects to the next step.

pub mod auth;
pub mod home;
pub mod image;
pub mod patient;
pub mod predict;
pub mod uploads;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::web::session::Session;
use crate::web::templates::PageContext;

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Navigation state plus the flashes this page consumes.
pub(crate) fn page_context(session: &Session) -> PageContext {
    PageContext {
        logged_in: session.is_logged_in(),
        flashes: session.take_flashes(),
    }
}
