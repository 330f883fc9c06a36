//! Durable credential and preference cache.
//!
//! Thin typed facade over [`KvStore`]: token, cached roles, cached identity,
//! tags-view state, layout overrides and the one-shot `just_logged_in` flag.

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use super::cache_key::{CacheKeys, JUST_LOGGED_IN};
use super::kv::KvStore;
use crate::identity::CachedUserInfo;

#[derive(Clone)]
pub struct CredentialStore {
    kv: KvStore,
    keys: CacheKeys,
}

impl CredentialStore {
    pub fn new(kv: KvStore, keys: CacheKeys) -> Self { Self { kv, keys } }

    pub fn in_memory() -> Self { Self::new(KvStore::in_memory("local-storage"), CacheKeys::default()) }

    pub fn keys(&self) -> &CacheKeys { &self.keys }
    pub fn kv(&self) -> &KvStore { &self.kv }

    // token

    /// Current token; an empty stored token counts as absent.
    pub fn get_token(&self) -> Option<String> {
        self.kv.get_item(&self.keys.token).filter(|t| !t.is_empty())
    }
    pub fn set_token(&self, token: &str) -> Result<()> { self.kv.set_item(self.keys.token.clone(), token) }
    pub fn remove_token(&self) -> Result<()> { self.kv.remove_item(&self.keys.token).map(|_| ()) }

    // roles

    pub fn get_cached_roles(&self) -> Option<Vec<String>> {
        self.kv.get_json::<Vec<String>>(&self.keys.cached_roles).filter(|r| !r.is_empty())
    }
    pub fn set_cached_roles(&self, roles: &[String]) -> Result<()> { self.kv.set_json(&self.keys.cached_roles, roles) }
    pub fn reset_cached_roles(&self) -> Result<()> { self.kv.remove_item(&self.keys.cached_roles).map(|_| ()) }

    // user info

    /// Cached identity; an entry without a username is treated as absent.
    pub fn get_cached_user_info(&self) -> Option<CachedUserInfo> {
        self.kv.get_json::<CachedUserInfo>(&self.keys.cached_user).filter(|u| !u.username.is_empty())
    }
    pub fn set_cached_user_info(&self, info: &CachedUserInfo) -> Result<()> { self.kv.set_json(&self.keys.cached_user, info) }
    pub fn reset_cached_user_info(&self) -> Result<()> { self.kv.remove_item(&self.keys.cached_user).map(|_| ()) }

    // tags view

    pub fn get_visited_views<T: DeserializeOwned>(&self) -> Vec<T> {
        self.kv.get_json(&self.keys.visited_views).unwrap_or_default()
    }
    pub fn set_visited_views<T: Serialize>(&self, views: &[T]) -> Result<()> { self.kv.set_json(&self.keys.visited_views, views) }
    pub fn get_cached_views(&self) -> Vec<String> { self.kv.get_json(&self.keys.cached_views).unwrap_or_default() }
    pub fn set_cached_views(&self, views: &[String]) -> Result<()> { self.kv.set_json(&self.keys.cached_views, views) }

    // layout

    pub fn get_layouts_config<T: DeserializeOwned>(&self) -> Option<T> { self.kv.get_json(&self.keys.config_layout) }
    pub fn set_layouts_config<T: Serialize>(&self, cfg: &T) -> Result<()> { self.kv.set_json(&self.keys.config_layout, cfg) }
    pub fn remove_layouts_config(&self) -> Result<()> { self.kv.remove_item(&self.keys.config_layout).map(|_| ()) }

    pub fn get_sidebar_status(&self) -> Option<String> { self.kv.get_item(&self.keys.sidebar_status) }
    pub fn set_sidebar_status(&self, status: &str) -> Result<()> { self.kv.set_item(self.keys.sidebar_status.clone(), status) }
    pub fn get_active_theme_name(&self) -> Option<String> { self.kv.get_item(&self.keys.active_theme_name) }
    pub fn set_active_theme_name(&self, theme: &str) -> Result<()> { self.kv.set_item(self.keys.active_theme_name.clone(), theme) }

    // login flag

    pub fn mark_just_logged_in(&self) -> Result<()> { self.kv.set_item(JUST_LOGGED_IN, "true") }
    pub fn just_logged_in(&self) -> bool { self.kv.get_item(JUST_LOGGED_IN).is_some() }
    pub fn clear_just_logged_in(&self) -> Result<()> { self.kv.remove_item(JUST_LOGGED_IN).map(|_| ()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_read_as_absent() {
        let c = CredentialStore::in_memory();
        c.set_token("").unwrap();
        assert!(c.get_token().is_none());
        c.set_cached_roles(&[]).unwrap();
        assert!(c.get_cached_roles().is_none());
        c.set_cached_user_info(&CachedUserInfo::default()).unwrap();
        assert!(c.get_cached_user_info().is_none());
    }

    #[test]
    fn keys_are_namespaced() {
        let c = CredentialStore::new(KvStore::in_memory("x"), CacheKeys::new("branch-a"));
        c.set_token("t1").unwrap();
        assert_eq!(c.kv().get_item("branch-a-token-key").as_deref(), Some("t1"));
    }

    #[test]
    fn just_logged_in_is_one_shot() {
        let c = CredentialStore::in_memory();
        assert!(!c.just_logged_in());
        c.mark_just_logged_in().unwrap();
        assert!(c.just_logged_in());
        c.clear_just_logged_in().unwrap();
        assert!(!c.just_logged_in());
    }
}
