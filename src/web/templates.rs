//! Server-rendered HTML pages.
//!
//! Every page shares one layout: navigation that depends on the session,
//! pending flash messages, then the page body. All user-supplied text goes
//! through `escape_html`.

use axum::http::StatusCode;

use crate::config::APP_NAME;
use crate::forms::FormErrors;

/// Session-dependent bits every page needs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub logged_in: bool,
    pub flashes: Vec<String>,
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, page: &PageContext, body: &str) -> String {
    let nav = if page.logged_in {
        r#"<li class="nav-item"><a class="nav-link" href="/patient">Patient</a></li>
      <li class="nav-item"><a class="nav-link" href="/image">Upload</a></li>
      <li class="nav-item"><a class="nav-link" href="/logout">Logout</a></li>"#
    } else {
        r#"<li class="nav-item"><a class="nav-link" href="/register">Register</a></li>
      <li class="nav-item"><a class="nav-link" href="/login">Login</a></li>"#
    };

    let flashes: String = page
        .flashes
        .iter()
        .map(|msg| {
            format!(
                r#"<div class="alert alert-info" role="alert">{}</div>"#,
                escape_html(msg)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · {app}</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@4.6.2/dist/css/bootstrap.min.css">
</head>
<body>
<nav class="navbar navbar-expand navbar-dark bg-dark mb-4">
  <a class="navbar-brand" href="/">{app}</a>
  <ul class="navbar-nav ml-auto">
      {nav}
  </ul>
</nav>
<main class="container">
{flashes}
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
        app = escape_html(APP_NAME),
    )
}

/// One labelled input with its validation messages.
fn field(
    name: &str,
    label: &str,
    input_type: &str,
    value: Option<&str>,
    errors: &FormErrors,
) -> String {
    let messages = errors.for_field(name);
    let invalid = if messages.is_empty() { "" } else { " is-invalid" };
    let feedback: String = messages
        .iter()
        .map(|m| format!(r#"<div class="invalid-feedback">{}</div>"#, escape_html(m)))
        .collect();
    let value_attr = match value {
        Some(v) if input_type != "password" && input_type != "file" => {
            format!(r#" value="{}""#, escape_html(v))
        }
        _ => String::new(),
    };
    format!(
        r#"<div class="form-group">
  <label for="{name}">{label}</label>
  <input class="form-control{invalid}" type="{input_type}" id="{name}" name="{name}"{value_attr}>
  {feedback}
</div>"#
    )
}

fn form(action: &str, enctype: Option<&str>, fields: &[String], submit: &str) -> String {
    let enctype = enctype
        .map(|e| format!(r#" enctype="{e}""#))
        .unwrap_or_default();
    format!(
        r#"<form method="post" action="{action}"{enctype} novalidate>
{fields}
<button type="submit" class="btn btn-primary">{submit}</button>
</form>"#,
        fields = fields.join("\n"),
    )
}

pub fn home_page(page: &PageContext) -> String {
    let actions = if page.logged_in {
        r#"<a class="btn btn-primary" href="/patient">Add patient details</a>"#
    } else {
        r#"<a class="btn btn-primary" href="/register">Register your hospital</a>
<a class="btn btn-outline-secondary" href="/login">Login</a>"#
    };
    let body = format!(
        r#"<div class="jumbotron">
<h1 class="display-5">Tuberculosis screening</h1>
<p class="lead">Record a patient, upload a chest X-ray and get a prediction from the screening model.</p>
{actions}
</div>"#
    );
    layout("Home", page, &body)
}

/// Values to put back into a re-rendered form.
pub type FieldValues<'a> = &'a [(&'a str, Option<&'a str>)];

fn value_of<'a>(values: FieldValues<'a>, name: &str) -> Option<&'a str> {
    values
        .iter()
        .find(|(n, _)| *n == name)
        .and_then(|(_, v)| *v)
}

pub fn register_page(page: &PageContext, values: FieldValues<'_>, errors: &FormErrors) -> String {
    let fields = [
        field("name", "Hospital name", "text", value_of(values, "name"), errors),
        field("code", "Access code", "text", value_of(values, "code"), errors),
        field("password", "Password", "password", None, errors),
    ];
    let body = format!(
        "<h2>Register</h2>\n{}",
        form("/register", None, &fields, "Register")
    );
    layout("Register", page, &body)
}

pub fn login_page(page: &PageContext, values: FieldValues<'_>, errors: &FormErrors) -> String {
    let fields = [
        field("code", "Access code", "text", value_of(values, "code"), errors),
        field("password", "Password", "password", None, errors),
    ];
    let body = format!("<h2>Login</h2>\n{}", form("/login", None, &fields, "Login"));
    layout("Login", page, &body)
}

pub fn patient_page(page: &PageContext, values: FieldValues<'_>, errors: &FormErrors) -> String {
    let fields = [
        field("name", "Patient name", "text", value_of(values, "name"), errors),
        field("age", "Age", "number", value_of(values, "age"), errors),
        field("gender", "Gender code", "number", value_of(values, "gender"), errors),
        field("image_id", "Image ID", "number", value_of(values, "image_id"), errors),
        field("hospital", "Hospital", "text", value_of(values, "hospital"), errors),
    ];
    let body = format!(
        "<h2>Patient details</h2>\n{}",
        form("/patient", None, &fields, "Submit")
    );
    layout("Patient", page, &body)
}

pub fn image_page(page: &PageContext, errors: &FormErrors) -> String {
    let fields = [field("photo", "Chest X-ray image", "file", None, errors)];
    let body = format!(
        "<h2>Upload image</h2>\n{}",
        form("/image", Some("multipart/form-data"), &fields, "Upload")
    );
    layout("Upload", page, &body)
}

/// `image_src` is the public URL of the uploaded file, if it has one.
pub fn predict_page(page: &PageContext, label: &str, path: &str, image_src: Option<&str>) -> String {
    let image = image_src
        .map(|src| {
            format!(
                r#"<img class="img-fluid img-thumbnail mb-3" style="max-width:300px" src="{}" alt="Uploaded image">"#,
                escape_html(src)
            )
        })
        .unwrap_or_default();
    let body = format!(
        r#"<h2>Prediction</h2>
{image}
<dl class="row">
  <dt class="col-sm-3">Predicted class</dt>
  <dd class="col-sm-9" id="prediction">{label}</dd>
  <dt class="col-sm-3">Image</dt>
  <dd class="col-sm-9" id="image-path"><code>{path}</code></dd>
</dl>
<a class="btn btn-outline-primary" href="/patient">Next patient</a>"#,
        label = escape_html(label),
        path = escape_html(path),
    );
    layout("Prediction", page, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!(
        "<h2>{}</h2>\n<p>{}</p>\n<a href=\"/\">Back to start</a>",
        escape_html(&title),
        escape_html(message)
    );
    layout(&title, &PageContext::default(), &body)
}
