//! Registration, login and logout.
//!
//! Password hashing runs on the blocking pool: at the default round count a
//! single hash takes long enough to stall the runtime.

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Form};

use super::{found, page_context};
use crate::config::DuplicatePolicy;
use crate::crypto::password::{hash_password, verify_password};
use crate::db::{self, InsertOutcome};
use crate::forms::{FormErrors, LoginForm, RegisterForm};
use crate::models::NewAccount;
use crate::web::error::WebError;
use crate::web::session::Session;
use crate::web::templates;
use crate::web::types::WebContext;

pub const INVALID_CREDENTIALS: &str = "Invalid Credentials";
pub const ALREADY_REGISTERED: &str = "This hospital or access code is already registered.";

fn render_register(session: &Session, form: &RegisterForm, errors: &FormErrors) -> Response {
    let values = [
        ("name", form.name.as_deref()),
        ("code", form.code.as_deref()),
    ];
    Html(templates::register_page(&page_context(session), &values, errors)).into_response()
}

fn render_login(session: &Session, form: &LoginForm, errors: &FormErrors) -> Response {
    let values = [("code", form.code.as_deref())];
    Html(templates::login_page(&page_context(session), &values, errors)).into_response()
}

/// `GET /register`
pub async fn register_form(Extension(session): Extension<Session>) -> Response {
    render_register(&session, &RegisterForm::default(), &FormErrors::new())
}

/// `POST /register`
///
/// A clash on hospital name or access code is handled by the configured
/// `DuplicatePolicy`. Under `Ignore` the row is discarded but the browser
/// still gets a session, one with no account behind it.
pub async fn register(
    State(ctx): State<WebContext>,
    Extension(session): Extension<Session>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(render_register(&session, &form, &errors)),
    };

    let iterations = ctx.core.config.hash_iterations;
    let password = valid.password;
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, iterations)).await?;

    let outcome = {
        let conn = ctx.core.db()?;
        db::insert_account(
            &conn,
            &NewAccount {
                hospital: valid.hospital,
                code: valid.code,
                password_hash,
            },
        )?
    };

    match outcome {
        InsertOutcome::Inserted(id) => {
            tracing::info!(account_id = id, "Hospital registered");
            session.log_in(Some(id));
        }
        InsertOutcome::Duplicate => match ctx.core.config.duplicate_policy {
            DuplicatePolicy::Ignore => {
                tracing::warn!("Duplicate registration discarded");
                session.log_in(None);
            }
            DuplicatePolicy::Reject => {
                tracing::warn!("Duplicate registration rejected");
                let mut errors = FormErrors::new();
                errors.add("code", ALREADY_REGISTERED);
                return Ok(render_register(&session, &form, &errors));
            }
        },
    }

    Ok(found("/patient"))
}

/// `GET /login`
pub async fn login_form(Extension(session): Extension<Session>) -> Response {
    render_login(&session, &LoginForm::default(), &FormErrors::new())
}

/// `POST /login`
///
/// Unknown code and wrong password look the same to the client: a flash and
/// a redirect back to the form.
pub async fn login(
    State(ctx): State<WebContext>,
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(render_login(&session, &form, &errors)),
    };

    let account = {
        let conn = ctx.core.db()?;
        db::get_account_by_code(&conn, &valid.code)?
    };

    let authenticated = match account {
        Some(account) => {
            let stored = account.password_hash;
            let password = valid.password;
            let verified =
                tokio::task::spawn_blocking(move || verify_password(&stored, &password)).await?;
            match verified {
                Ok(true) => Some(account.id),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!(account_id = account.id, error = %e, "Stored password hash unreadable");
                    None
                }
            }
        }
        None => None,
    };

    match authenticated {
        Some(id) => {
            tracing::info!(account_id = id, "Login succeeded");
            session.log_in(Some(id));
            Ok(found("/patient"))
        }
        None => {
            tracing::warn!("Login failed");
            session.flash(INVALID_CREDENTIALS);
            Ok(found("/login"))
        }
    }
}

/// `GET /logout`
pub async fn logout(Extension(session): Extension<Session>) -> Response {
    session.log_out();
    found("/")
}
