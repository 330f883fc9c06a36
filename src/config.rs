//! Deployment configuration.
//!
//! Layering: built-in defaults, then an optional JSON file named by
//! `LIBRIS_CONFIG`, then individual `LIBRIS_*` environment overrides.
//! Layout preferences are separate: defaults overlaid by the copy the user
//! saved in the credential store ([`SettingsStore`]).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::storage::{CredentialStore, DEFAULT_SYSTEM_NAME};

pub const ENV_CONFIG: &str = "LIBRIS_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Route lives in the URL fragment: `/app/#/book/list`.
    Hash,
    /// Route is the URL path below `public_path`.
    #[default]
    Html5,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub history: HistoryMode,
    pub public_path: String,
    /// Gate routes by the session's roles. When off, every gated route is
    /// registered and sessions without roles get `default_roles`.
    pub dynamic: bool,
    pub default_roles: Vec<String>,
    /// Flatten 3+ level route trees to two levels before registration.
    pub third_level_route_cache: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            history: HistoryMode::Html5,
            public_path: "/".to_string(),
            dynamic: true,
            default_roles: vec!["DEFAULT_ROLE".to_string()],
            third_level_route_cache: false,
        }
    }
}

impl RouterConfig {
    /// Extract the route location (path, query, hash) from a browser URL.
    pub fn route_path_from_url(&self, url: &str) -> String {
        // drop scheme and authority
        let rest = match url.find("://") {
            Some(i) => {
                let after = &url[i + 3..];
                after.find('/').map(|j| &after[j..]).unwrap_or("/")
            }
            None => url,
        };
        match self.history {
            HistoryMode::Hash => match rest.split_once('#') {
                Some((_, frag)) if !frag.is_empty() => {
                    if frag.starts_with('/') { frag.to_string() } else { format!("/{}", frag) }
                }
                _ => "/".to_string(),
            },
            HistoryMode::Html5 => {
                let base = self.public_path.trim_end_matches('/');
                let stripped = if !base.is_empty() && rest.starts_with(base) { &rest[base.len()..] } else { rest };
                if stripped.starts_with('/') { stripped.to_string() } else { format!("/{}", stripped) }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    pub login_path: String,
    pub forbidden_path: String,
    pub not_found_path: String,
    /// Landing for an authenticated visit to the login page with the elevated role.
    pub elevated_landing: String,
    pub default_landing: String,
    pub elevated_role: String,
    /// Cached `user_type` that also selects the elevated landing.
    pub elevated_user_type: String,
    pub whitelist_paths: Vec<String>,
    pub whitelist_names: Vec<String>,
    /// Guard redirects followed by one navigation before it fails.
    pub max_redirects: usize,
    pub fallback_error_message: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            forbidden_path: "/403".to_string(),
            not_found_path: "/404".to_string(),
            elevated_landing: "/dashboard".to_string(),
            default_landing: "/".to_string(),
            elevated_role: "root".to_string(),
            elevated_user_type: "2".to_string(),
            whitelist_paths: vec!["/login".to_string()],
            whitelist_names: Vec::new(),
            max_redirects: 10,
            fallback_error_message: "An error occurred in the navigation guard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self { Self { base_url: "http://127.0.0.1:8080/api".to_string(), timeout_ms: 5_000 } }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix of every durable cache key.
    pub system_name: String,
    /// Suffix of every page title.
    pub app_title: String,
    /// Profile directory; `None` keeps credentials in memory only.
    pub storage_dir: Option<PathBuf>,
    pub router: RouterConfig,
    pub guard: GuardConfig,
    pub http: HttpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
            app_title: "Library Admin".to_string(),
            storage_dir: None,
            router: RouterConfig::default(),
            guard: GuardConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `LIBRIS_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG).ok().filter(|s| !s.is_empty()) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Read a JSON file; missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let cfg: AppConfig = serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        debug!(target: "libris::config", "loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Overlay `LIBRIS_*` variables read through `lookup`. Unparseable values
    /// are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("LIBRIS_BASE_URL") { self.http.base_url = v; }
        if let Some(v) = lookup("LIBRIS_ROUTER_HISTORY") {
            match v.to_ascii_lowercase().as_str() {
                "hash" => self.router.history = HistoryMode::Hash,
                "html5" | "history" => self.router.history = HistoryMode::Html5,
                other => warn!(target: "libris::config", "unknown LIBRIS_ROUTER_HISTORY '{}'", other),
            }
        }
        if let Some(v) = lookup("LIBRIS_PUBLIC_PATH") { self.router.public_path = v; }
        if let Some(v) = lookup("LIBRIS_STORAGE_DIR") {
            self.storage_dir = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Some(v) = lookup("LIBRIS_DYNAMIC_ROUTES") {
            match parse_bool(&v) {
                Some(b) => self.router.dynamic = b,
                None => warn!(target: "libris::config", "ignoring LIBRIS_DYNAMIC_ROUTES='{}'", v),
            }
        }
        if let Some(v) = lookup("LIBRIS_THIRD_LEVEL_ROUTE_CACHE") {
            match parse_bool(&v) {
                Some(b) => self.router.third_level_route_cache = b,
                None => warn!(target: "libris::config", "ignoring LIBRIS_THIRD_LEVEL_ROUTE_CACHE='{}'", v),
            }
        }
        if let Some(v) = lookup("LIBRIS_HTTP_TIMEOUT_MS") {
            match v.parse::<u64>() {
                Ok(ms) => self.http.timeout_ms = ms,
                Err(_) => warn!(target: "libris::config", "ignoring LIBRIS_HTTP_TIMEOUT_MS='{}'", v),
            }
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutMode {
    #[default]
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "top")]
    Top,
    #[serde(rename = "left-top")]
    LeftTop,
}

/// User-adjustable layout preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutsConfig {
    pub show_settings: bool,
    pub layout_mode: LayoutMode,
    pub show_tags_view: bool,
    pub show_logo: bool,
    pub fixed_header: bool,
    pub show_footer: bool,
    pub show_notify: bool,
    pub show_theme_switch: bool,
    pub show_screenfull: bool,
    pub show_search_menu: bool,
    /// Restore open tabs across restarts.
    pub cache_tags_view: bool,
    pub show_watermark: bool,
    pub show_grey_mode: bool,
    pub show_color_weakness: bool,
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            show_settings: true,
            layout_mode: LayoutMode::Left,
            show_tags_view: true,
            show_logo: true,
            fixed_header: true,
            show_footer: true,
            show_notify: true,
            show_theme_switch: false,
            show_screenfull: false,
            show_search_menu: true,
            cache_tags_view: false,
            show_watermark: false,
            show_grey_mode: false,
            show_color_weakness: false,
        }
    }
}

/// Live layout preferences, written through to the credential store on every update.
pub struct SettingsStore {
    state: RwLock<LayoutsConfig>,
    credentials: CredentialStore,
}

impl SettingsStore {
    pub fn new(credentials: CredentialStore) -> Self {
        let state = credentials.get_layouts_config::<LayoutsConfig>().unwrap_or_default();
        Self { state: RwLock::new(state), credentials }
    }

    pub fn get(&self) -> LayoutsConfig { self.state.read().clone() }

    pub fn cache_tags_view(&self) -> bool { self.state.read().cache_tags_view }

    pub fn update(&self, f: impl FnOnce(&mut LayoutsConfig)) -> AppResult<()> {
        let snapshot = {
            let mut w = self.state.write();
            f(&mut *w);
            w.clone()
        };
        self.credentials.set_layouts_config(&snapshot)?;
        Ok(())
    }

    /// Drop the saved copy and go back to defaults.
    pub fn reset(&self) -> AppResult<()> {
        self.credentials.remove_layouts_config()?;
        *self.state.write() = LayoutsConfig::default();
        Ok(())
    }
}
