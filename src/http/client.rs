use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use super::envelope::{normalize_error, normalize_response, ErrorOutcome, Normalized, Payload, ResponseBody};
use crate::config::HttpConfig;
use crate::error::{AppError, AppResult};
use crate::guard::Notifier;
use crate::storage::CredentialStore;

/// Called when the backend stops accepting the session's token.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// JSON client for the lending backend. Attaches the stored bearer token and
/// folds every response through envelope normalization.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    credentials: CredentialStore,
    on_unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ApiClient {
    pub fn new(config: &HttpConfig, credentials: CredentialStore) -> AppResult<Self> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base = Url::parse(&base).map_err(|e| AppError::user("invalid_base_url", format!("{}: {}", config.base_url, e)))?;
        let client = reqwest::Client::builder().timeout(Duration::from_millis(config.timeout_ms)).build()?;
        Ok(Self { base, client, credentials, on_unauthorized: None, notifier: None })
    }

    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn base_url(&self) -> &Url { &self.base }

    /// Endpoint paths are relative to the base URL, e.g. `users/me`.
    pub fn url(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::user("invalid_path", format!("{}: {}", path, e)))
    }

    pub async fn get(&self, path: &str) -> AppResult<Payload> { self.request(Method::GET, path, None).await }

    pub async fn post(&self, path: &str, body: &Value) -> AppResult<Payload> { self.request(Method::POST, path, Some(body)).await }

    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> AppResult<Payload> {
        let url = self.url(path)?;
        let mut req = self.client.request(method.clone(), url).header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.credentials.get_token() {
            req = req.bearer_auth(token);
        }
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                let err = AppError::from(e);
                self.notify(err.message());
                return Err(err);
            }
        };
        let status = resp.status().as_u16();
        let content_type = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();
        debug!(target: "libris::http", "{} {} -> {} ({} bytes)", method, path, status, bytes.len());

        if (200..300).contains(&status) {
            return match normalize_response(path, status, ResponseBody::classify(content_type.as_deref(), bytes)) {
                Normalized::Ok(payload) => Ok(payload),
                Normalized::Unauthorized { message } => {
                    self.teardown();
                    Err(AppError::auth("http_401", message))
                }
                Normalized::Failed { code, message } => {
                    self.notify(&message);
                    Err(AppError::upstream(format!("api_{}", code), message))
                }
            };
        }

        let body = serde_json::from_slice::<Value>(&bytes).ok();
        match normalize_error(status, body.as_ref()) {
            ErrorOutcome::Resolved(envelope) => Ok(Payload::Envelope(envelope)),
            ErrorOutcome::Failed(failure) => {
                if failure.toast {
                    self.notify(failure.error.message());
                }
                if failure.teardown {
                    self.teardown();
                }
                Err(failure.error)
            }
        }
    }

    fn notify(&self, message: &str) {
        match &self.notifier {
            Some(n) => n.error(message),
            None => warn!(target: "libris::http", "{}", message),
        }
    }

    fn teardown(&self) {
        warn!(target: "libris::http", "token rejected by backend, tearing session down");
        if let Some(h) = &self.on_unauthorized {
            h.on_unauthorized();
        }
    }
}
