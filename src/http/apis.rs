//! Typed wrappers over the lending backend's account endpoints.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::client::ApiClient;
use super::envelope::{Envelope, Payload, CODE_ROLE_FORBIDDEN, LOGIN_FORBIDDEN_MESSAGE};
use crate::error::{AppError, AppResult};
use crate::identity::{UserInfoPayload, UserType};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub user_type: u8,
}

impl LoginRequest {
    pub fn new(username: &str, password: &str, user_type: UserType) -> Self {
        Self { username: username.to_string(), password: password.to_string(), user_type: user_type.code() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfoPayload,
}

/// `POST login/`. A login with a role the account does not hold answers with
/// business code 2002 and becomes [`AppError::Forbidden`].
pub async fn login(client: &ApiClient, req: &LoginRequest) -> AppResult<LoginResponse> {
    let body = serde_json::to_value(req).map_err(|e| AppError::internal("encode", e.to_string()))?;
    let raw = match client.post("login/", &body).await? {
        Payload::Raw(v) => v,
        Payload::Envelope(e) if e.code == Some(CODE_ROLE_FORBIDDEN) => {
            let msg = if e.message.is_empty() { LOGIN_FORBIDDEN_MESSAGE.to_string() } else { e.message };
            return Err(AppError::forbidden("login_role", msg));
        }
        other => serde_json::to_value(other.into_envelope()).unwrap_or(Value::Null),
    };
    parse_login(req, raw)
}

fn parse_login(req: &LoginRequest, raw: Value) -> AppResult<LoginResponse> {
    let envelope = Envelope::from_value(raw.clone());
    if envelope.code == Some(CODE_ROLE_FORBIDDEN) {
        let msg = if envelope.message.is_empty() { LOGIN_FORBIDDEN_MESSAGE.to_string() } else { envelope.message };
        return Err(AppError::forbidden("login_role", msg));
    }
    let token = ["token", "access"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_str))
        .or_else(|| raw.get("data").and_then(|d| d.get("token")).and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let Some(token) = token else {
        let msg = if envelope.message.is_empty() { "Login failed".to_string() } else { envelope.message };
        return Err(AppError::auth("login_failed", msg));
    };

    let source = raw.get("user").or_else(|| raw.get("data").filter(|d| d.is_object())).unwrap_or(&raw);
    let text = |k: &str| source.get(k).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let user = UserInfoPayload {
        username: text("username").unwrap_or_else(|| req.username.clone()),
        user_id: text("user_id").or_else(|| text("userId")).or_else(|| text("id")).unwrap_or_default(),
        user_type: source.get("user_type").cloned().unwrap_or_else(|| json!(req.user_type)),
    };
    info!(target: "libris::http", "login ok for {}", user.username);
    Ok(LoginResponse { token, user })
}

/// `POST register/`.
pub async fn register(client: &ApiClient, req: &RegisterRequest) -> AppResult<Envelope> {
    let body = serde_json::to_value(req).map_err(|e| AppError::internal("encode", e.to_string()))?;
    Ok(client.post("register/", &body).await?.into_envelope())
}

/// `GET users/me`.
pub async fn current_user(client: &ApiClient) -> AppResult<UserInfoPayload> {
    let envelope = client.get("users/me").await?.into_envelope();
    serde_json::from_value(envelope.data).map_err(|e| AppError::upstream("bad_payload", format!("users/me: {}", e)))
}
