//! Normalization of backend responses into a single envelope shape.
//!
//! The backend is inconsistent: some endpoints wrap their payload in
//! `{code, data, message}`, others return bare JSON, strings or bytes. Callers
//! only ever see [`Payload`] or an [`AppError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const SUCCESS_MESSAGE: &str = "Action successful";
pub const LOGIN_FORBIDDEN_MESSAGE: &str = "You do not have permission to log in with this role";

/// Business code for an expired or invalid token.
pub const CODE_UNAUTHORIZED: i64 = 401;
/// Business code for a login with a role the account does not hold.
pub const CODE_ROLE_FORBIDDEN: i64 = 2002;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self { Self { code: None, data, message: SUCCESS_MESSAGE.into(), success: Some(true) } }

    /// Read an envelope out of a JSON body. A body without `data` is the data.
    pub fn from_value(v: Value) -> Self {
        match v {
            Value::Object(mut obj) => {
                let code = obj.get("code").and_then(as_code);
                let message = obj.get("message").map(message_text).unwrap_or_default();
                let success = obj.get("success").and_then(Value::as_bool);
                let data = match obj.remove("data") {
                    Some(d) => d,
                    None => Value::Object(obj),
                };
                Self { code, data, message, success }
            }
            other => Self { data: other, ..Default::default() },
        }
    }
}

/// Response body as received, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Binary(Vec<u8>),
    Text(String),
    Json(Value),
}

impl ResponseBody {
    /// Classify raw bytes. Octet streams and non-UTF-8 bodies stay binary;
    /// anything that parses as JSON is JSON; the rest is text.
    pub fn classify(content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        if content_type.map(|c| c.starts_with("application/octet-stream")).unwrap_or(false) {
            return ResponseBody::Binary(bytes);
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return ResponseBody::Json(Value::Null);
        }
        if let Ok(v) = serde_json::from_slice::<Value>(&bytes) {
            return ResponseBody::Json(v);
        }
        match String::from_utf8(bytes) {
            Ok(s) => ResponseBody::Text(s),
            Err(e) => ResponseBody::Binary(e.into_bytes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Binary(Vec<u8>),
    Envelope(Envelope),
    /// Login responses pass through untouched.
    Raw(Value),
}

impl Payload {
    pub fn into_envelope(self) -> Envelope {
        match self {
            Payload::Envelope(e) => e,
            Payload::Raw(v) => Envelope::from_value(v),
            Payload::Binary(b) => Envelope::ok(Value::Array(b.into_iter().map(Value::from).collect())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Ok(Payload),
    /// The token is no longer accepted; the session must be torn down.
    Unauthorized { message: String },
    /// A business error to show the user.
    Failed { code: i64, message: String },
}

/// Interpret a 2xx response.
pub fn normalize_response(url: &str, status: u16, body: ResponseBody) -> Normalized {
    let v = match body {
        ResponseBody::Binary(b) => return Normalized::Ok(Payload::Binary(b)),
        ResponseBody::Text(s) => return Normalized::Ok(Payload::Envelope(Envelope::ok(Value::String(s)))),
        ResponseBody::Json(v) => v,
    };
    if url.contains("login") {
        return Normalized::Ok(Payload::Raw(v));
    }
    if status == 201 {
        let message = v.get("message").map(message_text).filter(|m| !m.is_empty());
        return Normalized::Ok(Payload::Envelope(Envelope {
            code: None,
            data: v,
            message: message.unwrap_or_else(|| SUCCESS_MESSAGE.into()),
            success: Some(true),
        }));
    }
    if status != 200 {
        return Normalized::Ok(Payload::Envelope(Envelope::from_value(v)));
    }
    match v.get("code").and_then(as_code) {
        None => {
            let mut env = Envelope::from_value(v);
            if env.message.is_empty() {
                env.message = SUCCESS_MESSAGE.into();
            }
            env.success.get_or_insert(true);
            Normalized::Ok(Payload::Envelope(env))
        }
        Some(0) | Some(CODE_ROLE_FORBIDDEN) => Normalized::Ok(Payload::Envelope(Envelope::from_value(v))),
        Some(CODE_UNAUTHORIZED) => {
            let message = v.get("message").map(message_text).filter(|m| !m.is_empty());
            Normalized::Unauthorized { message: message.unwrap_or_else(|| "Unauthorized".into()) }
        }
        Some(code) => {
            let message = v.get("message").map(message_text).filter(|m| !m.is_empty());
            Normalized::Failed { code, message: message.unwrap_or_else(|| "Error".into()) }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    pub error: AppError,
    /// Show the message to the user.
    pub toast: bool,
    /// Tear the session down.
    pub teardown: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorOutcome {
    /// Some failures are answered as ordinary envelopes.
    Resolved(Envelope),
    Failed(NormalizedError),
}

/// Interpret a non-2xx response.
pub fn normalize_error(status: u16, body: Option<&Value>) -> ErrorOutcome {
    let field = |k: &str| body.and_then(|b| b.get(k));
    let message = field("message").map(message_text).filter(|m| !m.is_empty());

    if field("code").and_then(as_code) == Some(CODE_ROLE_FORBIDDEN) {
        return ErrorOutcome::Resolved(Envelope {
            code: Some(CODE_ROLE_FORBIDDEN),
            data: Value::Null,
            message: message.unwrap_or_else(|| LOGIN_FORBIDDEN_MESSAGE.into()),
            success: Some(false),
        });
    }

    let failed = |error: AppError, toast: bool, teardown: bool| ErrorOutcome::Failed(NormalizedError { error, toast, teardown });
    match status {
        400 => {
            if let Some(errors) = field("errors") {
                return failed(AppError::user("http_400", format!("Invalid data: {}", errors)), false, false);
            }
            if let Some(title) = field("title") {
                let text = match title {
                    Value::Array(items) => items.first().map(message_text),
                    other => Some(message_text(other)),
                };
                let text = text.filter(|t| !t.is_empty()).unwrap_or_else(|| "Title error".into());
                return failed(AppError::user("http_400", text), false, false);
            }
            if let Some(detail) = field("detail") {
                return failed(AppError::user("http_400", message_text(detail)), false, false);
            }
            failed(AppError::from_http_status(400, message.as_deref()), true, false)
        }
        401 => failed(AppError::from_http_status(401, message.as_deref()), true, true),
        s => failed(AppError::from_http_status(s, message.as_deref()), true, false),
    }
}

fn as_code(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Messages arrive as strings, lists of strings or field maps.
fn message_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(message_text).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("; "),
        Value::Object(map) => object_text(map),
        other => other.to_string(),
    }
}

fn object_text(map: &Map<String, Value>) -> String {
    map.iter().map(|(k, v)| format!("{}: {}", k, message_text(v))).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binary_and_text_bodies() {
        assert_eq!(normalize_response("/x", 200, ResponseBody::Binary(vec![1, 2])), Normalized::Ok(Payload::Binary(vec![1, 2])));
        match normalize_response("/x", 200, ResponseBody::Text("hi".into())) {
            Normalized::Ok(Payload::Envelope(e)) => {
                assert_eq!(e.data, json!("hi"));
                assert_eq!(e.message, SUCCESS_MESSAGE);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn login_responses_pass_through() {
        let body = json!({"token": "t", "code": 7});
        assert_eq!(normalize_response("login/", 200, ResponseBody::Json(body.clone())), Normalized::Ok(Payload::Raw(body)));
    }

    #[test]
    fn created_is_wrapped() {
        let Normalized::Ok(Payload::Envelope(e)) = normalize_response("books/", 201, ResponseBody::Json(json!({"id": 3}))) else {
            panic!("expected envelope")
        };
        assert_eq!(e.success, Some(true));
        assert_eq!(e.data, json!({"id": 3}));
    }

    #[test]
    fn bare_json_gets_defaults() {
        let Normalized::Ok(Payload::Envelope(e)) = normalize_response("users/me", 200, ResponseBody::Json(json!({"username": "ada"}))) else {
            panic!("expected envelope")
        };
        assert_eq!(e.data, json!({"username": "ada"}));
        assert_eq!(e.message, SUCCESS_MESSAGE);
        assert_eq!(e.success, Some(true));
    }

    #[test]
    fn business_codes() {
        let Normalized::Ok(Payload::Envelope(e)) = normalize_response("b", 200, ResponseBody::Json(json!({"code": 0, "data": [1]}))) else {
            panic!("expected envelope")
        };
        assert_eq!(e.data, json!([1]));
        assert!(matches!(normalize_response("b", 200, ResponseBody::Json(json!({"code": 401}))), Normalized::Unauthorized { .. }));
        assert_eq!(
            normalize_response("b", 200, ResponseBody::Json(json!({"code": 500}))),
            Normalized::Failed { code: 500, message: "Error".into() }
        );
        assert!(matches!(normalize_response("b", 200, ResponseBody::Json(json!({"code": "2002"}))), Normalized::Ok(_)));
    }

    #[test]
    fn error_statuses() {
        match normalize_error(403, Some(&json!({"code": 2002}))) {
            ErrorOutcome::Resolved(e) => assert_eq!(e.message, LOGIN_FORBIDDEN_MESSAGE),
            other => panic!("unexpected {:?}", other),
        }
        let ErrorOutcome::Failed(e) = normalize_error(400, Some(&json!({"errors": {"name": ["required"]}}))) else { panic!() };
        assert!(!e.toast);
        assert!(e.error.message().starts_with("Invalid data: "));
        let ErrorOutcome::Failed(e) = normalize_error(400, Some(&json!({"title": ["too long", "x"]}))) else { panic!() };
        assert_eq!(e.error.message(), "too long");
        let ErrorOutcome::Failed(e) = normalize_error(400, None) else { panic!() };
        assert!(e.toast);
        assert_eq!(e.error.message(), "Invalid data");
        let ErrorOutcome::Failed(e) = normalize_error(401, Some(&json!({"message": "expired"}))) else { panic!() };
        assert!(e.teardown);
        assert_eq!(e.error.message(), "expired");
        let ErrorOutcome::Failed(e) = normalize_error(502, Some(&json!({"message": "ignored"}))) else { panic!() };
        assert_eq!(e.error.message(), "Bad Gateway");
        assert!(!e.teardown);
    }

    #[test]
    fn classify_bodies() {
        assert_eq!(ResponseBody::classify(Some("application/json"), b"{\"a\":1}".to_vec()), ResponseBody::Json(json!({"a": 1})));
        assert_eq!(ResponseBody::classify(None, b"plain".to_vec()), ResponseBody::Text("plain".into()));
        assert_eq!(ResponseBody::classify(Some("application/octet-stream"), b"{}".to_vec()), ResponseBody::Binary(b"{}".to_vec()));
        assert_eq!(ResponseBody::classify(None, vec![0xff, 0xfe]), ResponseBody::Binary(vec![0xff, 0xfe]));
        assert_eq!(ResponseBody::classify(None, Vec::new()), ResponseBody::Json(Value::Null));
    }
}
