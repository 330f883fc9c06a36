use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Account class reported by the backend as `user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserType {
    #[default]
    User,
    Admin,
    Root,
}

impl UserType {
    pub fn code(self) -> u8 {
        match self {
            UserType::User => 0,
            UserType::Admin => 1,
            UserType::Root => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(UserType::User),
            1 => Some(UserType::Admin),
            2 => Some(UserType::Root),
            _ => None,
        }
    }

    /// Lenient decode of the backend's `user_type`, which arrives either as a
    /// number or a numeric string. Anything unrecognized is a plain user.
    pub fn from_raw(raw: &Value) -> Self {
        let code = match raw {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        code.and_then(Self::from_code).unwrap_or_default()
    }

    /// Role token granted to this account class.
    pub fn role(self) -> &'static str {
        match self {
            UserType::User => "user",
            UserType::Admin => "admin",
            UserType::Root => "root",
        }
    }
}

/// Identity cached in durable storage between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedUserInfo {
    pub username: String,
    #[serde(rename = "userId", deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

impl CachedUserInfo {
    pub fn user_type(&self) -> Option<UserType> {
        self.user_type.as_deref().map(|t| UserType::from_raw(&Value::String(t.to_string())))
    }
}

/// User details as returned by the login / `users/me` endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserInfoPayload {
    pub username: String,
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(default)]
    pub user_type: Value,
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
