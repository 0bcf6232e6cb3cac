//! Page router.
//!
//! Middleware stack (outermost → innermost):
//! 1. Extension(WebContext) → 2. nosniff header → 3. Access log →
//! 4. Session → 5. Login gate (workflow routes only) → Handler

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::X_CONTENT_TYPE_OPTIONS;
use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::core_state::CoreState;
use crate::web::endpoints::{auth, home, image, patient, predict, uploads};
use crate::web::error::WebError;
use crate::web::middleware;
use crate::web::types::WebContext;

/// Build the full application router.
///
/// Middleware uses `Extension<WebContext>` (injected as the outermost layer).
/// Handlers use `State<WebContext>` (provided via `with_state`).
pub fn web_router(core: Arc<CoreState>) -> Router {
    build_router(WebContext::new(core))
}

fn build_router(ctx: WebContext) -> Router {
    // Gated by `require_login` when enabled
    let workflow = Router::new()
        .route("/patient", get(patient::patient_form).post(patient::submit))
        .route("/image", get(image::image_form).post(image::upload))
        .route("/predict", get(predict::predict))
        .route("/logout", get(auth::logout))
        .route_layer(from_fn(middleware::auth::require_login));

    // NOTE: wildcard uses `*param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/", get(home::index))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route(
            &format!("{}/*file", uploads::PUBLIC_PREFIX),
            get(uploads::serve_image),
        );

    public
        .merge(workflow)
        .fallback(not_found)
        .with_state(ctx.clone())
        // Uploads have no size limit
        .layer(DefaultBodyLimit::disable())
        .layer(from_fn(middleware::session::load_session))
        .layer(from_fn(middleware::access::log_access))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        // Extension must be outermost so middleware can extract WebContext
        .layer(axum::Extension(ctx))
}

async fn not_found() -> WebError {
    WebError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, Response, StatusCode};
    use ::image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use tower::ServiceExt;

    use crate::config::{AppConfig, DuplicatePolicy};
    use crate::core_state::test_support::{fast_config, test_core};
    use crate::db;
    use crate::forms::MSG_REQUIRED;
    use crate::web::endpoints::auth::{ALREADY_REGISTERED, INVALID_CREDENTIALS};
    use crate::web::middleware::access::REQUEST_ID_HEADER;
    use crate::web::middleware::auth::LOGIN_REQUIRED_MESSAGE;

    const BOUNDARY: &str = "----tbintake-test-boundary";

    /// Drives the router like a browser: keeps the latest session cookie.
    struct Browser {
        app: Router,
        cookie: Option<String>,
    }

    impl Browser {
        fn new(app: Router) -> Self {
            Self { app, cookie: None }
        }

        async fn send(&mut self, mut req: Request<Body>) -> Response<Body> {
            if let Some(cookie) = &self.cookie {
                req.headers_mut()
                    .insert(COOKIE, cookie.parse().unwrap());
            }
            let resp = self.app.clone().oneshot(req).await.unwrap();
            if let Some(set) = resp.headers().get(SET_COOKIE) {
                let pair = set.to_str().unwrap().split(';').next().unwrap();
                self.cookie = Some(pair.to_string());
            }
            resp
        }

        async fn get(&mut self, uri: &str) -> Response<Body> {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
            let req = Request::post(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(req).await
        }

        async fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Response<Body> {
            let req = Request::post("/image")
                .header(
                    CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(file_name, bytes)))
                .unwrap();
            self.send(req).await
        }
    }

    fn multipart_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn jpeg_bytes(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade; 3])));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Jpeg(90)).unwrap();
        out.into_inner()
    }

    async fn body_text(resp: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn location(resp: &Response<Body>) -> String {
        resp.headers()
            .get(LOCATION)
            .expect("redirect")
            .to_str()
            .unwrap()
            .to_string()
    }

    /// Decode the `url` query parameter of a `/predict` location.
    fn predict_url_param(location: &str) -> String {
        let query = location.strip_prefix("/predict?").expect("predict redirect");
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "url")
            .map(|(_, v)| v.into_owned())
            .expect("url parameter")
    }

    fn prediction_label(html: &str) -> String {
        let marker = r#"id="prediction">"#;
        let start = html.find(marker).expect("prediction element") + marker.len();
        let end = start + html[start..].find('<').unwrap();
        html[start..end].to_string()
    }

    fn setup(config: AppConfig) -> (Browser, Arc<CoreState>, tempfile::TempDir) {
        let (core, dir) = test_core(config);
        (Browser::new(web_router(core.clone())), core, dir)
    }

    fn gated_config() -> AppConfig {
        AppConfig {
            require_login: true,
            ..fast_config()
        }
    }

    // -- Home & routing ---------------------------------------------------

    #[tokio::test]
    async fn home_renders_with_request_id() {
        let (mut browser, _core, _dir) = setup(fast_config());
        let resp = browser.get("/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
        // Untouched session: no cookie issued
        assert!(!resp.headers().contains_key(SET_COOKIE));
        assert!(body_text(resp).await.contains(r#"href="/register""#));
    }

    #[tokio::test]
    async fn unknown_route_is_404_page() {
        let (mut browser, _core, _dir) = setup(fast_config());
        let resp = browser.get("/nope").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("404 Not Found"));
    }

    #[tokio::test]
    async fn forms_render_on_get() {
        let (mut browser, _core, _dir) = setup(fast_config());
        for (uri, field) in [
            ("/register", "name=\"code\""),
            ("/login", "name=\"password\""),
            ("/patient", "name=\"image_id\""),
            ("/image", "name=\"photo\""),
        ] {
            let resp = browser.get(uri).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert!(body_text(resp).await.contains(field), "{uri}");
        }
    }

    // -- Registration -----------------------------------------------------

    #[tokio::test]
    async fn registration_creates_account_and_session() {
        let (mut browser, core, _dir) = setup(gated_config());
        let resp = browser
            .post_form("/register", "name=General&code=GEN-01&password=secret")
            .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/patient");
        assert!(browser.cookie.is_some());

        let conn = core.db().unwrap();
        let account = db::get_account_by_code(&conn, "GEN-01").unwrap().unwrap();
        assert_eq!(account.hospital, "General");
        assert_ne!(account.password_hash, "secret");
        drop(conn);

        // The session carries the account, so the gate lets it through
        let resp = browser.get("/patient").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains(r#"href="/logout""#));
    }

    #[tokio::test]
    async fn duplicate_registration_is_swallowed_but_gets_cookie() {
        let (mut first, core, _dir) = setup(gated_config());
        first
            .post_form("/register", "name=General&code=GEN-01&password=one")
            .await;

        let mut second = Browser::new(first.app.clone());
        let resp = second
            .post_form("/register", "name=Other&code=GEN-01&password=two")
            .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/patient");
        assert!(resp.headers().contains_key(SET_COOKIE));

        let conn = core.db().unwrap();
        assert_eq!(db::count_accounts(&conn).unwrap(), 1);
        drop(conn);

        // That session has no account behind it
        let resp = second.get("/patient").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/login");
    }

    #[tokio::test]
    async fn duplicate_hospital_name_is_also_swallowed() {
        let (mut browser, core, _dir) = setup(fast_config());
        browser
            .post_form("/register", "name=General&code=A&password=x")
            .await;
        let resp = browser
            .post_form("/register", "name=General&code=B&password=x")
            .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(db::count_accounts(&core.db().unwrap()).unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_rejected_under_reject_policy() {
        let config = AppConfig {
            duplicate_policy: DuplicatePolicy::Reject,
            ..fast_config()
        };
        let (mut browser, _core, _dir) = setup(config);
        browser
            .post_form("/register", "name=General&code=GEN-01&password=x")
            .await;
        let resp = browser
            .post_form("/register", "name=General&code=GEN-01&password=x")
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains(ALREADY_REGISTERED));
    }

    #[tokio::test]
    async fn invalid_registration_rerenders_form() {
        let (mut browser, core, _dir) = setup(fast_config());
        let resp = browser.post_form("/register", "name=General&code=").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains(MSG_REQUIRED));
        assert!(html.contains(r#"value="General""#));
        assert_eq!(db::count_accounts(&core.db().unwrap()).unwrap(), 0);
    }

    // -- Login ------------------------------------------------------------

    #[tokio::test]
    async fn login_with_correct_password() {
        let (mut browser, _core, _dir) = setup(gated_config());
        browser
            .post_form("/register", "name=General&code=GEN-01&password=secret")
            .await;

        let mut fresh = Browser::new(browser.app.clone());
        let resp = fresh
            .post_form("/login", "code=GEN-01&password=secret")
            .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/patient");
        assert_eq!(fresh.get("/patient").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_failure_flashes_once_and_grants_nothing() {
        let (mut browser, _core, _dir) = setup(gated_config());
        browser
            .post_form("/register", "name=General&code=GEN-01&password=secret")
            .await;

        let mut fresh = Browser::new(browser.app.clone());
        for body in ["code=GEN-01&password=wrong", "code=UNKNOWN&password=secret"] {
            let resp = fresh.post_form("/login", body).await;
            assert_eq!(resp.status(), StatusCode::FOUND);
            assert_eq!(location(&resp), "/login");

            let html = body_text(fresh.get("/login").await).await;
            assert!(html.contains(INVALID_CREDENTIALS), "{body}");
            let html = body_text(fresh.get("/login").await).await;
            assert!(!html.contains(INVALID_CREDENTIALS), "{body}");
        }

        let resp = fresh.get("/patient").await;
        assert_eq!(location(&resp), "/login");
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let (mut browser, _core, _dir) = setup(gated_config());
        browser
            .post_form("/register", "name=General&code=GEN-01&password=secret")
            .await;
        let resp = browser.get("/logout").await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/");

        let html = body_text(browser.get("/").await).await;
        assert!(html.contains(r#"href="/login""#));
        assert_eq!(location(&browser.get("/image").await), "/login");
    }

    #[tokio::test]
    async fn gate_flashes_login_message() {
        let (mut browser, _core, _dir) = setup(gated_config());
        for uri in ["/patient", "/image", "/predict?url=x", "/logout"] {
            let resp = browser.get(uri).await;
            assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
            assert_eq!(location(&resp), "/login", "{uri}");
        }
        let html = body_text(browser.get("/login").await).await;
        assert!(html.contains(LOGIN_REQUIRED_MESSAGE));
    }

    #[tokio::test]
    async fn workflow_is_public_by_default() {
        let (mut browser, _core, _dir) = setup(fast_config());
        assert_eq!(browser.get("/patient").await.status(), StatusCode::OK);
        assert_eq!(browser.get("/image").await.status(), StatusCode::OK);
    }

    // -- Patient ----------------------------------------------------------

    #[tokio::test]
    async fn patient_form_persists_and_redirects() {
        let (mut browser, core, _dir) = setup(fast_config());
        let resp = browser
            .post_form("/patient", "name=Asha&age=34&gender=1&image_id=7&hospital=General")
            .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/image");

        let conn = core.db().unwrap();
        let patients = db::list_patients_by_hospital(&conn, "General").unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].name, "Asha");
        assert_eq!(patients[0].age, 34);
    }

    #[tokio::test]
    async fn invalid_patient_form_rerenders() {
        let (mut browser, core, _dir) = setup(fast_config());
        let resp = browser
            .post_form("/patient", "name=Asha&age=old&gender=1&image_id=7")
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Not a valid integer value."));
        assert!(html.contains(MSG_REQUIRED));
        assert_eq!(db::count_patients(&core.db().unwrap()).unwrap(), 0);
    }

    // -- Upload -----------------------------------------------------------

    #[tokio::test]
    async fn unsupported_upload_writes_nothing() {
        let (mut browser, core, _dir) = setup(fast_config());
        let resp = browser.upload("notes.txt", b"plain text").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp)
            .await
            .contains("File does not have an approved extension"));

        let entries = std::fs::read_dir(core.uploads.dest()).unwrap().count();
        assert_eq!(entries, 0);
    }

    #[tokio::test]
    async fn upload_without_file_is_required_error() {
        let (mut browser, _core, _dir) = setup(fast_config());
        let resp = browser.upload("", b"").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains(MSG_REQUIRED));
    }

    #[tokio::test]
    async fn upload_redirects_with_absolute_path() {
        let (mut browser, core, _dir) = setup(fast_config());
        let resp = browser.upload("xray.jpg", &jpeg_bytes(160, 160, 50)).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let path = std::path::PathBuf::from(predict_url_param(&location(&resp)));
        assert!(path.is_absolute());
        assert_eq!(path, core.uploads.path("xray.jpg"));
        assert!(path.is_file());
    }

    // -- End to end -------------------------------------------------------

    #[tokio::test]
    async fn intake_to_prediction() {
        let (mut browser, _core, _dir) = setup(fast_config());

        let resp = browser
            .post_form("/register", "name=General&code=GEN-01&password=secret")
            .await;
        assert_eq!(location(&resp), "/patient");

        let resp = browser
            .post_form("/patient", "name=Asha&age=34&gender=1&image_id=7&hospital=General")
            .await;
        assert_eq!(location(&resp), "/image");

        let resp = browser.upload("chest.jpg", &jpeg_bytes(200, 200, 230)).await;
        let next = location(&resp);
        let stored = predict_url_param(&next);

        let resp = browser.get(&next).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert_eq!(prediction_label(&html), "1");
        assert!(html.contains(&stored));
        assert!(html.contains(r#"src="/static/img/chest.jpg""#));
    }

    #[tokio::test]
    async fn prediction_is_idempotent() {
        let (mut browser, _core, _dir) = setup(fast_config());
        let resp = browser.upload("scan.jpg", &jpeg_bytes(150, 150, 90)).await;
        let next = location(&resp);

        let first = prediction_label(&body_text(browser.get(&next).await).await);
        let second = prediction_label(&body_text(browser.get(&next).await).await);
        assert_eq!(first, "0");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn predict_requires_url() {
        let (mut browser, _core, _dir) = setup(fast_config());
        assert_eq!(browser.get("/predict").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(browser.get("/predict?url=").await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn predict_refuses_paths_outside_upload_dir() {
        let (mut browser, _core, dir) = setup(fast_config());
        let outside = dir.path().join("outside.jpg");
        std::fs::write(&outside, jpeg_bytes(10, 10, 0)).unwrap();

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("url", &outside.to_string_lossy())
            .finish();
        let resp = browser.get(&format!("/predict?{query}")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn undecodable_image_is_500() {
        let (mut browser, _core, _dir) = setup(fast_config());
        let resp = browser.upload("broken.png", b"not really a png").await;
        let resp = browser.get(&location(&resp)).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_text(resp).await.contains("broken.png"));
    }

    #[tokio::test]
    async fn missing_image_is_500() {
        let (mut browser, core, _dir) = setup(fast_config());
        let resp = browser.upload("gone.jpg", &jpeg_bytes(20, 20, 0)).await;
        std::fs::remove_file(core.uploads.path("gone.jpg")).unwrap();
        let resp = browser.get(&location(&resp)).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // -- Serving uploads --------------------------------------------------

    #[tokio::test]
    async fn uploaded_image_is_served() {
        let (mut browser, _core, _dir) = setup(fast_config());
        let bytes = jpeg_bytes(30, 30, 128);
        browser.upload("xray.jpg", &bytes).await;

        let resp = browser.get("/static/img/xray.jpg").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/jpeg");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.to_vec(), bytes);
    }

    #[tokio::test]
    async fn serving_outside_upload_dir_is_404() {
        let (mut browser, _core, dir) = setup(fast_config());
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();
        let resp = browser.get("/static/img/..%2Fsecret.txt").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = browser.get("/static/img/missing.jpg").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
