//! Unified application error model and mapping helpers.
//! This module provides the error enum shared by the HTTP layer, the session and
//! permission stores and the navigation guard, along with helpers that map HTTP
//! status codes into it and back.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Timeout { code: String, message: String },
    Upstream { code: String, message: String },
    Materialization { code: String, message: String },
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Timeout { code, .. }
            | AppError::Upstream { code, .. }
            | AppError::Materialization { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Timeout { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Materialization { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn auth(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn timeout(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Timeout { code: code.into(), message: msg.into() } }
    pub fn upstream(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Upstream { code: code.into(), message: msg.into() } }
    pub fn materialization(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Materialization { code: code.into(), message: msg.into() } }
    pub fn io(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Timeout { .. } => 408,
            AppError::Upstream { .. } => 502,
            AppError::Materialization { .. } => 500,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }

    /// Build an error from a backend HTTP status. `message` overrides the stock
    /// text for the statuses where the backend's own message is shown (400, 401, 403).
    pub fn from_http_status(status: u16, message: Option<&str>) -> Self {
        let code = format!("http_{}", status);
        let msg = |fallback: &str| message.filter(|m| !m.is_empty()).unwrap_or(fallback).to_string();
        match status {
            400 => AppError::UserInput { code, message: msg("Invalid data") },
            401 => AppError::Auth { code, message: msg("Unauthorized") },
            403 => AppError::Forbidden { code, message: msg("Forbidden") },
            404 => AppError::NotFound { code, message: "Not Found".into() },
            408 => AppError::Timeout { code, message: "Request Timeout".into() },
            409 => AppError::Conflict { code, message: msg("Conflict") },
            500 => AppError::Internal { code, message: "Internal Server Error".into() },
            501 => AppError::Upstream { code, message: "Not Implemented".into() },
            502 => AppError::Upstream { code, message: "Bad Gateway".into() },
            503 => AppError::Io { code, message: "Service Unavailable".into() },
            504 => AppError::Timeout { code, message: "Gateway Timeout".into() },
            505 => AppError::Upstream { code, message: "HTTP Version Not Supported".into() },
            _ => AppError::Upstream { code, message: msg("Request failed") },
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Storage and config helpers speak anyhow; surface them as I/O failures
        AppError::Io { code: "io_error".into(), message: err.to_string() }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::Timeout { code: "http_timeout".into(), message: "Request Timeout".into() };
        }
        if let Some(status) = err.status() {
            return AppError::from_http_status(status.as_u16(), None);
        }
        AppError::Io { code: "http_transport".into(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
