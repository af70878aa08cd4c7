#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use std::sync::Arc;

use shop_backend::api::create_api_router;
use shop_backend::captcha::CaptchaStore;
use shop_backend::entities::setup_schema;
use shop_backend::storage::UploadDir;

pub struct TestApp {
    pub addr: String,
    pub client: reqwest::Client,
    pub captcha: CaptchaStore,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

/// Boots the full router against a private in-memory database and serves it
/// on an ephemeral port, so every test file talks to a fresh deployment.
pub async fn spawn_app() -> TestApp {
    std::env::set_var("SECRET_KEY", "integration-test-secret");

    // A single pooled connection keeps the pool on one in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    setup_schema(&db).await.expect("Failed to create schema");

    let upload_dir = std::env::temp_dir().join(format!(
        "shop-backend-test-{}",
        uuid::Uuid::new_v4().simple()
    ));
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .expect("Failed to create upload dir");

    let captcha = CaptchaStore::default();
    let app = create_api_router(Arc::new(db), captcha.clone(), UploadDir::new(upload_dir));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestApp {
        addr: format!("http://{}", addr),
        client: reqwest::Client::new(),
        captcha,
    }
}

/// Runs the captcha flow and registers a user. The first user registered on
/// a fresh app becomes the admin.
pub async fn register_user(app: &TestApp, username: &str, email: &str, password: &str) {
    let response = try_register(app, username, email, password).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
}

pub async fn try_register(
    app: &TestApp,
    username: &str,
    email: &str,
    password: &str,
) -> reqwest::Response {
    let captcha_response = app
        .client
        .get(app.url("/user/captcha/register"))
        .query(&[("email", email)])
        .send()
        .await
        .expect("Failed to request captcha");
    assert_eq!(captcha_response.status(), reqwest::StatusCode::OK);

    let body = captcha_response
        .json::<Value>()
        .await
        .expect("Failed to parse captcha response");
    let request_id = body["data"].as_str().expect("No request id").to_owned();
    let code = app.captcha.last_issued().expect("No captcha issued");

    app.client
        .post(app.url("/user/register"))
        .header("request-id", request_id)
        .form(&[
            ("email", email),
            ("username", username),
            ("password", password),
            ("gender", "1"),
            ("captcha", &code),
        ])
        .send()
        .await
        .expect("Failed to send register request")
}

pub async fn login(app: &TestApp, username: &str, password: &str) -> String {
    let response = app
        .client
        .post(app.url("/user/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse login response");
    body["data"]["access_token"]
        .as_str()
        .expect("Token not found in login response")
        .to_owned()
}

pub async fn register_and_login(
    app: &TestApp,
    username: &str,
    email: &str,
    password: &str,
) -> String {
    register_user(app, username, email, password).await;
    login(app, username, password).await
}

/// Creates a commodity through the admin multipart endpoint and returns its
/// cid. `images` holds (content_type, bytes) pairs.
pub async fn create_commodity(
    app: &TestApp,
    admin_token: &str,
    name: &str,
    price: f64,
    images: Vec<(&str, Vec<u8>)>,
) -> String {
    let body = serde_json::json!({
        "name": name,
        "price": price,
        "description": "Test commodity",
    });

    let mut form = reqwest::multipart::Form::new().text("body", body.to_string());
    for (index, (content_type, data)) in images.into_iter().enumerate() {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(format!("image-{index}"))
            .mime_str(content_type)
            .expect("Invalid test mime type");
        form = form.part("images", part);
    }

    let response = app
        .client
        .post(app.url("/shop/add"))
        .bearer_auth(admin_token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send add commodity request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse add commodity response");
    body["data"].as_str().expect("No cid in response").to_owned()
}

pub async fn add_address(app: &TestApp, token: &str, label: &str, is_default: bool) -> String {
    let response = app
        .client
        .post(app.url("/user/address"))
        .query(&[("is_default", is_default)])
        .bearer_auth(token)
        .json(&serde_json::json!({
            "name": label,
            "phone": "1234567890",
            "address": format!("{label} street"),
        }))
        .send()
        .await
        .expect("Failed to send add address request");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let body = response
        .json::<Value>()
        .await
        .expect("Failed to parse add address response");
    body["data"].as_str().expect("No aid in response").to_owned()
}
