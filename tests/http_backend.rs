use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use libris::app::AppContext;
use libris::config::{AppConfig, HttpConfig};
use libris::error::AppError;
use libris::http::{self, ApiClient, Payload, RegisterRequest};
use libris::identity::UserType;
use libris::storage::CredentialStore;

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if body["user_type"] == json!(2) && username != "root" {
        return (StatusCode::FORBIDDEN, Json(json!({"code": 2002})));
    }
    if body["password"] != json!("pw") {
        return (StatusCode::OK, Json(json!({"message": "Wrong username or password"})));
    }
    (StatusCode::OK, Json(json!({"token": format!("tok-{}", username), "user": {"username": username, "id": 11, "user_type": body["user_type"]}})))
}

async fn me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer tok-ada") => (StatusCode::OK, Json(json!({"code": 0, "data": {"username": "ada", "user_id": 11, "user_type": 1}}))),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "token expired"}))),
    }
}

async fn register() -> (StatusCode, Json<Value>) { (StatusCode::CREATED, Json(json!({"id": 5}))) }

async fn broken() -> Json<Value> { Json(json!({"code": 500, "message": "db down"})) }

async fn expired() -> Json<Value> { Json(json!({"code": 401})) }

async fn invalid() -> (StatusCode, Json<Value>) { (StatusCode::BAD_REQUEST, Json(json!({"errors": {"title": ["required"]}}))) }

async fn export() -> impl IntoResponse { ([(header::CONTENT_TYPE, "application/octet-stream")], vec![1u8, 2, 3]) }

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/login/", post(login))
        .route("/api/register/", post(register))
        .route("/api/users/me", get(me))
        .route("/api/books/broken", get(broken))
        .route("/api/books/expired", get(expired))
        .route("/api/books/invalid", get(invalid))
        .route("/api/export", get(export));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn app_for(base_url: String) -> AppContext {
    let cfg = AppConfig { http: HttpConfig { base_url, ..Default::default() }, ..Default::default() };
    AppContext::new(cfg).unwrap()
}

#[tokio::test]
async fn login_stores_token_and_lands() {
    let app = app_for(spawn_backend().await);
    let landing = app.login("ada", "pw", UserType::Admin).await.unwrap();
    assert_eq!(landing, "/");
    assert_eq!(app.credentials.get_token().as_deref(), Some("tok-ada"));
    assert_eq!(app.session.user_id(), "11");
    assert!(app.credentials.just_logged_in());

    assert_eq!(app.refresh_user().await.unwrap(), vec!["admin"]);
    let out = app.navigate(&landing).await.unwrap();
    assert_eq!(out.location.path, "/notice");
    // the flag is cleared by the first committed navigation
    assert!(!app.credentials.just_logged_in());
}

#[tokio::test]
async fn root_login_lands_on_dashboard() {
    let app = app_for(spawn_backend().await);
    assert_eq!(app.login("root", "pw", UserType::Root).await.unwrap(), "/dashboard");
    assert_eq!(app.navigate("/dashboard").await.unwrap().location.path, "/dashboard/index");
}

#[tokio::test]
async fn role_mismatch_is_forbidden() {
    let app = app_for(spawn_backend().await);
    match app.login("ada", "pw", UserType::Root).await {
        Err(AppError::Forbidden { message, .. }) => assert_eq!(message, "You do not have permission to log in with this role"),
        other => panic!("expected forbidden, got {:?}", other),
    }
    assert!(app.credentials.get_token().is_none());
}

#[tokio::test]
async fn bad_password_reports_backend_message() {
    let app = app_for(spawn_backend().await);
    let err = app.login("ada", "nope", UserType::Admin).await.unwrap_err();
    assert_eq!(err.code_str(), "login_failed");
    assert_eq!(err.message(), "Wrong username or password");
}

#[tokio::test]
async fn rejected_token_tears_the_session_down() {
    let app = app_for(spawn_backend().await);
    app.login_offline("ada", UserType::Admin).unwrap();
    app.navigate("/book/list").await.unwrap();
    assert!(app.router.has_route("bookList"));

    let err = app.refresh_user().await.unwrap_err();
    assert_eq!(err.http_status(), 401);
    assert_eq!(err.message(), "token expired");
    assert!(app.credentials.get_token().is_none());
    assert!(!app.router.has_route("bookList"));
    assert!(app.navigator.current().is_none());
    assert_eq!(app.notifications.drain(), vec!["token expired"]);
}

#[tokio::test]
async fn business_codes_inside_ok_responses() {
    let app = app_for(spawn_backend().await);
    app.login_offline("ada", UserType::Admin).unwrap();

    let err = app.api.get("books/broken").await.unwrap_err();
    assert_eq!(err.code_str(), "api_500");
    assert_eq!(app.notifications.drain(), vec!["db down"]);
    assert!(app.credentials.get_token().is_some());

    let err = app.api.get("books/expired").await.unwrap_err();
    assert_eq!(err.http_status(), 401);
    assert!(app.credentials.get_token().is_none());
}

#[tokio::test]
async fn validation_errors_are_not_toasted() {
    let app = app_for(spawn_backend().await);
    let err = app.api.get("books/invalid").await.unwrap_err();
    assert!(err.message().starts_with("Invalid data: "));
    assert!(app.notifications.messages().is_empty());
}

#[tokio::test]
async fn created_and_binary_bodies() {
    let base = spawn_backend().await;
    let client = ApiClient::new(&HttpConfig { base_url: base, ..Default::default() }, CredentialStore::in_memory()).unwrap();

    let env = http::register(&client, &RegisterRequest { username: "new".into(), password: "pw".into() }).await.unwrap();
    assert_eq!(env.success, Some(true));
    assert_eq!(env.data, json!({"id": 5}));

    assert_eq!(client.get("export").await.unwrap(), Payload::Binary(vec![1, 2, 3]));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let app = app_for(format!("http://{}/api", addr));
    let err = app.api.get("users/me").await.unwrap_err();
    assert_eq!(err.code_str(), "http_transport");
    assert_eq!(app.notifications.messages().len(), 1);
}
