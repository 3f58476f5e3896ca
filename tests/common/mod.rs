#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use parcelmap::{config::AppConfig, test_utils::test_helpers};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "parcelmap-test-boundary";
pub const TEST_USER: &str = "surveyor";
pub const TEST_PASSWORD: &str = "correct horse";

/// Router over an in-memory database, with uploads and layout files under a
/// scratch directory.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Same as [`TestApp::new`], with a chance to adjust the config first.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_helpers::create_test_db().await.unwrap();
        let mut config = test_helpers::test_config(dir.path());
        adjust(&mut config);
        let router = test_helpers::create_test_app(pool.clone(), config)
            .await
            .unwrap();

        Self { router, pool, dir }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Log in through the HTML form and return the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (cookie, token) = self.form_session("/login").await;

        let response = self
            .send(form_post(
                "/login",
                &cookie,
                &[
                    ("username", username),
                    ("password", password),
                    ("csrf_token", &token),
                ],
            ))
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login should redirect");
        session_cookie(&response).unwrap_or(cookie)
    }

    /// Create the default user and log in as them.
    pub async fn logged_in(&self) -> String {
        test_helpers::insert_test_user(&self.pool, TEST_USER, TEST_PASSWORD)
            .await
            .unwrap();
        self.login(TEST_USER, TEST_PASSWORD).await
    }

    /// GET a form page; returns the new session cookie and its CSRF token.
    pub async fn form_session(&self, path: &str) -> (String, String) {
        let response = self.send(get(path, None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = session_cookie(&response).expect("form page should start a session");
        let html = body_string(response).await;
        (cookie, csrf_token_from_html(&html))
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn json_post(uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn form_post(uri: &str, cookie: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, form_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::HOST, "testserver")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap()
}

pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// `name=value` of the session cookie, if the response set one.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("parcelmap_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn csrf_token_from_html(html: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker).expect("form should carry a CSRF token") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}
