use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::principal::{CachedUserInfo, UserInfoPayload, UserType};
use crate::error::AppResult;
use crate::storage::CredentialStore;

/// In-memory view of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub roles: Vec<String>,
    pub username: String,
    pub user_id: String,
}

/// Signals emitted at the session mutation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { username: String },
    RolesChanged { roles: Vec<String> },
    /// Token and identity cleared (logout, expired token, failed materialization).
    Reset,
}

/// Session state derived from, and written through to, the [`CredentialStore`].
///
/// Every mutation persists explicitly; there is no observer runtime watching
/// the fields.
pub struct SessionStore {
    state: RwLock<Session>,
    credentials: CredentialStore,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Start a session, picking up a token left by a previous run.
    pub fn new(credentials: CredentialStore) -> Self {
        let token = credentials.get_token().unwrap_or_default();
        let (events, _) = broadcast::channel(32);
        Self { state: RwLock::new(Session { token, ..Default::default() }), credentials, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> { self.events.subscribe() }

    fn emit(&self, ev: SessionEvent) {
        // No subscribers is the common case outside the CLI
        let _ = self.events.send(ev);
    }

    pub fn credentials(&self) -> &CredentialStore { &self.credentials }
    pub fn snapshot(&self) -> Session { self.state.read().clone() }
    pub fn token(&self) -> String { self.state.read().token.clone() }
    pub fn roles(&self) -> Vec<String> { self.state.read().roles.clone() }
    pub fn username(&self) -> String { self.state.read().username.clone() }
    pub fn user_id(&self) -> String { self.state.read().user_id.clone() }
    pub fn has_roles(&self) -> bool { !self.state.read().roles.is_empty() }
    pub fn has_role(&self, role: &str) -> bool { self.state.read().roles.iter().any(|r| r == role) }
    pub fn has_any_role(&self, wanted: &[&str]) -> bool { self.state.read().roles.iter().any(|r| wanted.contains(&r.as_str())) }

    pub fn set_token(&self, token: &str) -> AppResult<()> {
        self.credentials.set_token(token)?;
        self.state.write().token = token.to_string();
        Ok(())
    }

    /// Replace the role set wholesale. Not persisted; [`SessionStore::get_info`] owns the cache.
    pub fn set_roles(&self, roles: Vec<String>) {
        self.state.write().roles = roles.clone();
        self.emit(SessionEvent::RolesChanged { roles });
    }

    pub fn set_user_name(&self, name: &str) { self.state.write().username = name.to_string(); }
    pub fn set_user_id(&self, id: &str) { self.state.write().user_id = id.to_string(); }

    /// Apply user details from the backend: map `user_type` to the role set and
    /// cache roles plus identity for the next run.
    pub fn get_info(&self, data: &UserInfoPayload) -> AppResult<Vec<String>> {
        let user_type = UserType::from_raw(&data.user_type);
        let roles = vec![user_type.role().to_string()];
        {
            let mut s = self.state.write();
            s.username = data.username.clone();
            s.user_id = data.user_id.clone();
            s.roles = roles.clone();
        }
        self.credentials.set_cached_roles(&roles)?;
        self.credentials.set_cached_user_info(&CachedUserInfo {
            username: data.username.clone(),
            user_id: data.user_id.clone(),
            user_type: Some(user_type.code().to_string()),
        })?;
        info!(target: "libris::session", "user info set: username={} user_id={} user_type={} roles={:?}", data.username, data.user_id, user_type.code(), roles);
        self.emit(SessionEvent::RolesChanged { roles: roles.clone() });
        Ok(roles)
    }

    /// Store the token issued by a successful login and populate identity.
    pub fn login(&self, token: &str, data: &UserInfoPayload) -> AppResult<Vec<String>> {
        self.set_token(token)?;
        let roles = self.get_info(data)?;
        self.credentials.mark_just_logged_in()?;
        self.emit(SessionEvent::LoggedIn { username: data.username.clone() });
        Ok(roles)
    }

    /// Pull roles and identity from the durable cache when memory is empty.
    /// Returns whether anything was hydrated; an empty cache is not an error.
    pub fn hydrate_from_cache(&self) -> bool {
        let mut hydrated = false;
        if let Some(roles) = self.credentials.get_cached_roles() {
            self.set_roles(roles);
            hydrated = true;
        }
        if let Some(info) = self.credentials.get_cached_user_info() {
            let mut s = self.state.write();
            s.username = info.username;
            s.user_id = info.user_id;
            hydrated = true;
        }
        debug!(target: "libris::session", "hydrate from cache: {}", hydrated);
        hydrated
    }

    /// Switch to another role by minting a `token-<role>` token. The caller is
    /// responsible for tearing down materialized routes so the next navigation
    /// rebuilds them.
    pub fn change_roles(&self, role: &str) -> AppResult<()> {
        let token = format!("token-{}", role);
        self.set_token(&token)?;
        info!(target: "libris::session", "role change requested: {}", role);
        Ok(())
    }

    /// Clear token, identity and the durable caches.
    pub fn reset_token(&self) -> AppResult<()> {
        info!(target: "libris::session", "resetting token");
        self.credentials.remove_token()?;
        *self.state.write() = Session::default();
        self.credentials.reset_cached_roles()?;
        self.credentials.reset_cached_user_info()?;
        self.emit(SessionEvent::Reset);
        Ok(())
    }

    /// Session half of a logout; router and tags-view teardown happen in
    /// [`crate::app::SessionTeardown`].
    pub fn logout(&self) -> AppResult<()> {
        info!(target: "libris::session", "logout user={}", self.username());
        self.reset_token()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
