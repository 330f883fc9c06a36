//! The before/after navigation hooks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::hooks::{DocumentTitle, NoopListener, NotificationLog, Notifier, Progress, ProgressIndicator, RouteListener, TitleSink};
use super::whitelist::Whitelist;
use crate::config::{GuardConfig, RouterConfig};
use crate::error::AppResult;
use crate::identity::{roles_admit, SessionStore, UserType};
use crate::permission::{Claim, ClaimGuard, MaterializeState, PermissionStore, RouteMaterializer};
use crate::router::{ResolvedLocation, RouteForest, Router};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    /// Replace the history entry instead of pushing one.
    pub replace: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Redirect),
}

impl GuardDecision {
    pub fn redirect(target: &str) -> Self { GuardDecision::Redirect(Redirect { target: target.to_string(), replace: false }) }

    pub fn replace(target: &str) -> Self { GuardDecision::Redirect(Redirect { target: target.to_string(), replace: true }) }
}

pub struct GuardHooks {
    pub listener: Arc<dyn RouteListener>,
    pub title: Arc<dyn TitleSink>,
    pub notifier: Arc<dyn Notifier>,
    pub progress: Arc<dyn ProgressIndicator>,
}

impl GuardHooks {
    pub fn headless(app_title: &str) -> Self {
        Self {
            listener: Arc::new(NoopListener),
            title: Arc::new(DocumentTitle::new(app_title)),
            notifier: Arc::new(NotificationLog::new()),
            progress: Arc::new(Progress::new()),
        }
    }
}

pub struct NavigationGuard {
    config: GuardConfig,
    router_config: RouterConfig,
    whitelist: Whitelist,
    session: Arc<SessionStore>,
    permission: Arc<PermissionStore>,
    materializer: Arc<dyn RouteMaterializer>,
    router: Arc<Router>,
    hooks: GuardHooks,
}

impl NavigationGuard {
    pub fn new(
        config: GuardConfig,
        router_config: RouterConfig,
        session: Arc<SessionStore>,
        permission: Arc<PermissionStore>,
        router: Arc<Router>,
        hooks: GuardHooks,
    ) -> Self {
        let materializer: Arc<dyn RouteMaterializer> = permission.clone();
        Self {
            whitelist: Whitelist::from_config(&config),
            config,
            router_config,
            session,
            permission,
            materializer,
            router,
            hooks,
        }
    }

    /// Swap the route source, e.g. for a remote route table.
    pub fn with_materializer(mut self, materializer: Arc<dyn RouteMaterializer>) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn config(&self) -> &GuardConfig { &self.config }
    pub fn hooks(&self) -> &GuardHooks { &self.hooks }

    /// Decide a single navigation attempt. Steps run in order and the first
    /// one with an opinion wins.
    pub async fn before_each(&self, to: &ResolvedLocation, _from: Option<&ResolvedLocation>) -> GuardDecision {
        self.hooks.progress.start();

        let has_token = self.session.credentials().get_token().is_some();

        // The login page is whitelisted, but a signed-in visit goes to the landing page
        if has_token && to.path == self.config.login_path {
            return GuardDecision::redirect(&self.landing());
        }

        if self.whitelist.is_white_list(to) {
            return GuardDecision::Allow;
        }

        if !has_token {
            debug!(target: "libris::guard", "no token for '{}', to login", to.path);
            return GuardDecision::redirect(&self.config.login_path);
        }

        if !self.session.has_roles() {
            self.session.hydrate_from_cache();
        }
        if !self.router_config.dynamic && !self.session.has_roles() {
            self.session.set_roles(self.router_config.default_roles.clone());
        }

        match self.permission.try_claim() {
            Claim::Claimed => {
                let claim = ClaimGuard::new(&self.permission);
                return self.materialize(to, claim).await;
            }
            Claim::InFlight => {
                let settled = self.permission.wait_settled().await;
                debug!(target: "libris::guard", "waited for materialization: {:?}", settled);
                return GuardDecision::replace(&replay_target(to));
            }
            Claim::Ready => {}
        }

        let roles = self.session.roles();
        let allowed = to.matched.iter().all(|r| roles_admit(r.meta.role_requirement(), &roles));
        if !allowed && to.path != self.config.forbidden_path {
            info!(target: "libris::guard", "roles {:?} may not visit '{}'", roles, to.path);
            return GuardDecision::redirect(&self.config.forbidden_path);
        }

        if to.matched.is_empty() && to.path != self.config.not_found_path {
            debug!(target: "libris::guard", "no route for '{}'", to.path);
            return GuardDecision::redirect(&self.config.not_found_path);
        }

        GuardDecision::Allow
    }

    /// Runs once per committed navigation.
    pub fn after_each(&self, to: &ResolvedLocation) {
        self.hooks.listener.on_route_change(to);
        self.hooks.title.set_title(to.meta.title.as_deref());
        if let Err(e) = self.session.credentials().clear_just_logged_in() {
            warn!(target: "libris::guard", "clearing just_logged_in: {}", e);
        }
        self.hooks.progress.done();
    }

    /// Roles decide; the cached `user_type` only matters for a session with
    /// no roles at all.
    fn landing(&self) -> String {
        if !self.session.has_roles() {
            self.session.hydrate_from_cache();
        }
        let elevated = if self.session.has_roles() {
            self.session.has_role(&self.config.elevated_role)
        } else {
            self.session
                .credentials()
                .get_cached_user_info()
                .and_then(|u| u.user_type)
                .map(|t| t == self.config.elevated_user_type)
                .unwrap_or(false)
        };
        if elevated { self.config.elevated_landing.clone() } else { self.config.default_landing.clone() }
    }

    /// Materialize ahead of the first navigation for a session restored from
    /// cache. `None` when routes are already materialized or in flight.
    pub async fn preload(&self) -> AppResult<Option<usize>> {
        if self.permission.try_claim() != Claim::Claimed {
            return Ok(None);
        }
        let claim = ClaimGuard::new(&self.permission);
        match self.materialize_and_register().await {
            Ok(added) => {
                claim.complete();
                Ok(Some(added))
            }
            Err(e) => {
                claim.fail();
                Err(e)
            }
        }
    }

    async fn materialize_and_register(&self) -> AppResult<usize> {
        let roles = self.session.roles();
        info!(target: "libris::guard", "materializing routes for roles {:?}", roles);
        let filter = if self.router_config.dynamic { Some(roles.as_slice()) } else { None };
        let routes = self.materializer.materialize(filter).await?;
        let added = self.register(&routes)?;
        info!(target: "libris::guard", "registered {} dynamic routes", added);
        Ok(added)
    }

    async fn materialize(&self, to: &ResolvedLocation, claim: ClaimGuard<'_>) -> GuardDecision {
        match self.materialize_and_register().await {
            Ok(_) => {
                claim.complete();
                GuardDecision::replace(&replay_target(to))
            }
            Err(e) => {
                claim.fail();
                if let Err(reset_err) = self.session.reset_token() {
                    warn!(target: "libris::guard", "reset_token after failed materialization: {}", reset_err);
                }
                let msg = if e.message().is_empty() { self.config.fallback_error_message.as_str() } else { e.message() };
                self.hooks.notifier.error(msg);
                GuardDecision::redirect(&self.config.login_path)
            }
        }
    }

    /// Register every root not already present by name. All or nothing.
    fn register(&self, routes: &RouteForest) -> AppResult<usize> {
        let mut added: Vec<String> = Vec::new();
        for def in routes.to_defs() {
            if let Some(name) = &def.name {
                if self.router.has_route(name) {
                    continue;
                }
            }
            if let Err(e) = self.router.add_route(&def) {
                for name in &added {
                    self.router.remove_route(name);
                }
                return Err(e);
            }
            if let Some(name) = def.name {
                added.push(name);
            }
        }
        Ok(added.len())
    }

    /// Whether the current session has its dynamic routes.
    pub fn materialized(&self) -> bool { self.permission.state() == MaterializeState::Ready }

    /// The landing for a freshly authenticated session.
    pub fn landing_for(&self, user_type: UserType) -> String {
        if user_type.role() == self.config.elevated_role {
            self.config.elevated_landing.clone()
        } else {
            self.config.default_landing.clone()
        }
    }
}

fn replay_target(to: &ResolvedLocation) -> String { to.redirected_from.clone().unwrap_or_else(|| to.full_path.clone()) }

#[cfg(test)]
#[path = "navigation_tests.rs"]
mod navigation_tests;
