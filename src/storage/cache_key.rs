/// Default prefix for every durable key.
pub const DEFAULT_SYSTEM_NAME: &str = "libris-admin";

/// One-shot flag set on login and cleared after the next navigation.
pub const JUST_LOGGED_IN: &str = "just_logged_in";

/// Durable key names, namespaced by the deployment's system name so two
/// consoles sharing a profile directory never read each other's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub token: String,
    pub config_layout: String,
    pub sidebar_status: String,
    pub active_theme_name: String,
    pub visited_views: String,
    pub cached_views: String,
    pub cached_roles: String,
    pub cached_user: String,
}

impl CacheKeys {
    pub fn new(system_name: &str) -> Self {
        let k = |suffix: &str| format!("{}-{}-key", system_name, suffix);
        Self {
            token: k("token"),
            config_layout: k("config-layout"),
            sidebar_status: k("sidebar-status"),
            active_theme_name: k("active-theme-name"),
            visited_views: k("visited-views"),
            cached_views: k("cached-views"),
            cached_roles: k("cached-Roles"),
            cached_user: k("cached-User"),
        }
    }
}

impl Default for CacheKeys {
    fn default() -> Self { Self::new(DEFAULT_SYSTEM_NAME) }
}
