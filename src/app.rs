//! Application wiring: builds every store from an [`AppConfig`] and exposes the
//! session-level operations (bootstrap, login, logout, navigate).

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{AppConfig, SettingsStore};
use crate::error::AppResult;
use crate::guard::{DocumentTitle, GuardHooks, NavigationError, NavigationGuard, NavigationOutcome, Navigator, NotificationLog, Progress};
use crate::http::{self, ApiClient, LoginRequest, UnauthorizedHandler};
use crate::identity::{SessionStore, UserInfoPayload, UserType};
use crate::permission::PermissionStore;
use crate::router::{constant_routes, dynamic_routes, RouteDef, RouteForest, Router};
use crate::storage::{CacheKeys, CredentialStore, KvStore};
use crate::tags_view::TagsViewStore;

/// Everything a logout (or a rejected token) has to undo.
pub struct SessionTeardown {
    session: Arc<SessionStore>,
    permission: Arc<PermissionStore>,
    router: Arc<Router>,
    tags_view: Arc<TagsViewStore>,
    settings: Arc<SettingsStore>,
    navigator: Arc<Navigator>,
}

impl SessionTeardown {
    pub fn run(&self) -> AppResult<()> {
        self.session.logout()?;
        let removed = self.router.reset_dynamic();
        self.permission.reset();
        if !self.settings.cache_tags_view() {
            self.tags_view.del_all_visited_views()?;
            self.tags_view.del_all_cached_views()?;
        }
        self.navigator.clear();
        info!(target: "libris::session", "session torn down, {} dynamic routes removed", removed);
        Ok(())
    }
}

impl UnauthorizedHandler for SessionTeardown {
    fn on_unauthorized(&self) {
        if let Err(e) = self.run() {
            warn!(target: "libris::session", "teardown after rejected token: {}", e);
        }
    }
}

pub struct AppContext {
    pub config: AppConfig,
    pub credentials: CredentialStore,
    pub session: Arc<SessionStore>,
    pub settings: Arc<SettingsStore>,
    pub permission: Arc<PermissionStore>,
    pub router: Arc<Router>,
    pub tags_view: Arc<TagsViewStore>,
    pub navigator: Arc<Navigator>,
    pub api: ApiClient,
    pub title: Arc<DocumentTitle>,
    pub notifications: Arc<NotificationLog>,
    pub progress: Arc<Progress>,
    teardown: Arc<SessionTeardown>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> AppResult<Self> { Self::with_route_tables(config, constant_routes(), dynamic_routes()) }

    pub fn with_route_tables(config: AppConfig, constant: Vec<RouteDef>, gated: Vec<RouteDef>) -> AppResult<Self> {
        let kv = match &config.storage_dir {
            Some(dir) => KvStore::open(dir, &config.system_name)?,
            None => KvStore::in_memory(&config.system_name),
        };
        let credentials = CredentialStore::new(kv, CacheKeys::new(&config.system_name));
        let settings = Arc::new(SettingsStore::new(credentials.clone()));
        let session = Arc::new(SessionStore::new(credentials.clone()));
        let permission = Arc::new(PermissionStore::new(&constant, &gated, config.router.clone()));
        let router = Arc::new(Router::with_routes(&constant)?);
        let tags_view = Arc::new(TagsViewStore::new(credentials.clone(), settings.cache_tags_view()));
        let title = Arc::new(DocumentTitle::new(&config.app_title));
        let notifications = Arc::new(NotificationLog::new());
        let progress = Arc::new(Progress::new());

        let hooks = GuardHooks { listener: tags_view.clone(), title: title.clone(), notifier: notifications.clone(), progress: progress.clone() };
        let guard = NavigationGuard::new(config.guard.clone(), config.router.clone(), session.clone(), permission.clone(), router.clone(), hooks);
        let navigator = Arc::new(Navigator::new(router.clone(), Arc::new(guard)));

        let teardown = Arc::new(SessionTeardown {
            session: session.clone(),
            permission: permission.clone(),
            router: router.clone(),
            tags_view: tags_view.clone(),
            settings: settings.clone(),
            navigator: navigator.clone(),
        });
        let api = ApiClient::new(&config.http, credentials.clone())?
            .with_unauthorized_handler(teardown.clone())
            .with_notifier(notifications.clone());

        info!(target: "libris::session", "app context ready: system={} storage={:?}", config.system_name, config.storage_dir);
        Ok(Self { config, credentials, session, settings, permission, router, tags_view, navigator, api, title, notifications, progress, teardown })
    }

    /// Preload dynamic routes for roles cached by a previous run, so the first
    /// navigation needs no replay. Returns the number of routes registered.
    pub async fn bootstrap(&self) -> Result<usize, NavigationError> {
        let cached = self.credentials.get_cached_roles().unwrap_or_default();
        if cached.is_empty() {
            return Ok(0);
        }
        info!(target: "libris::session", "loading roles from cache: {:?}", cached);
        self.session.hydrate_from_cache();
        let added = self.navigator.guard().preload().await.map_err(NavigationError::Materialization)?;
        Ok(added.unwrap_or(0))
    }

    /// Sign in against the backend. Returns the landing path for the account.
    pub async fn login(&self, username: &str, password: &str, user_type: UserType) -> AppResult<String> {
        let resp = http::login(&self.api, &LoginRequest::new(username, password, user_type)).await?;
        self.start_session(&resp.token, &resp.user)
    }

    /// Sign in without a backend, minting a `token-<role>` token.
    pub fn login_offline(&self, username: &str, user_type: UserType) -> AppResult<String> {
        let payload = UserInfoPayload { username: username.to_string(), user_id: String::new(), user_type: user_type.code().into() };
        self.start_session(&format!("token-{}", user_type.role()), &payload)
    }

    fn start_session(&self, token: &str, user: &UserInfoPayload) -> AppResult<String> {
        // a previous session's routes must not leak into this one
        self.router.reset_dynamic();
        self.permission.reset();
        self.session.login(token, user)?;
        Ok(self.navigator.guard().landing_for(UserType::from_raw(&user.user_type)))
    }

    /// Refresh identity from `users/me`.
    pub async fn refresh_user(&self) -> AppResult<Vec<String>> {
        let user = http::current_user(&self.api).await?;
        self.session.get_info(&user)
    }

    pub fn logout(&self) -> AppResult<()> { self.teardown.run() }

    /// Switch role and drop the materialized routes; the next navigation
    /// rebuilds them for the new role.
    pub fn change_roles(&self, role: &str) -> AppResult<()> {
        self.session.change_roles(role)?;
        let roles = vec![role.to_string()];
        self.credentials.set_cached_roles(&roles)?;
        self.session.set_roles(roles);
        self.router.reset_dynamic();
        self.permission.reset();
        Ok(())
    }

    pub async fn navigate(&self, path: &str) -> Result<NavigationOutcome, NavigationError> { self.navigator.navigate(path).await }

    /// Constant plus accessible routes, as shown in the sidebar.
    pub fn menu(&self) -> RouteForest { self.permission.routes() }
}
