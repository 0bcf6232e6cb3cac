use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Form};

use super::{found, page_context};
use crate::config::DuplicatePolicy;
use crate::db::{self, InsertOutcome};
use crate::forms::{FormErrors, PatientForm};
use crate::web::error::WebError;
use crate::web::session::Session;
use crate::web::templates;
use crate::web::types::WebContext;

pub const ALREADY_RECORDED: &str = "This patient is already recorded.";

fn render(session: &Session, form: &PatientForm, errors: &FormErrors) -> Response {
    let values = [
        ("name", form.name.as_deref()),
        ("age", form.age.as_deref()),
        ("gender", form.gender.as_deref()),
        ("image_id", form.image_id.as_deref()),
        ("hospital", form.hospital.as_deref()),
    ];
    Html(templates::patient_page(&page_context(session), &values, errors)).into_response()
}

/// `GET /patient`
pub async fn patient_form(Extension(session): Extension<Session>) -> Response {
    render(&session, &PatientForm::default(), &FormErrors::new())
}

/// `POST /patient`
pub async fn submit(
    State(ctx): State<WebContext>,
    Extension(session): Extension<Session>,
    Form(form): Form<PatientForm>,
) -> Result<Response, WebError> {
    let patient = match form.validate() {
        Ok(patient) => patient,
        Err(errors) => return Ok(render(&session, &form, &errors)),
    };

    let outcome = {
        let conn = ctx.core.db()?;
        db::insert_patient(&conn, &patient)?
    };

    match outcome {
        InsertOutcome::Inserted(id) => {
            tracing::info!(patient_id = id, image_id = patient.image_id, "Patient recorded");
        }
        InsertOutcome::Duplicate => match ctx.core.config.duplicate_policy {
            DuplicatePolicy::Ignore => tracing::warn!("Duplicate patient record discarded"),
            DuplicatePolicy::Reject => {
                let mut errors = FormErrors::new();
                errors.add("name", ALREADY_RECORDED);
                return Ok(render(&session, &form, &errors));
            }
        },
    }

    Ok(found("/image"))
}
