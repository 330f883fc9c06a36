//! Open tabs ("visited views") and keep-alive view names.
//!
//! Both lists are written through to the credential store on every change;
//! they are read back at start only when the layout asks to cache tabs.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppResult;
use crate::guard::RouteListener;
use crate::router::{ResolvedLocation, RouteMeta};
use crate::storage::CredentialStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    pub path: String,
    pub full_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub meta: RouteMeta,
}

impl TagView {
    pub fn title(&self) -> &str { self.meta.title.as_deref().unwrap_or(&self.path) }
}

impl From<&ResolvedLocation> for TagView {
    fn from(to: &ResolvedLocation) -> Self {
        Self {
            path: to.path.clone(),
            full_path: to.full_path.clone(),
            name: to.name.clone(),
            query: to.query.clone(),
            meta: to.meta.clone(),
        }
    }
}

pub struct TagsViewStore {
    visited: RwLock<Vec<TagView>>,
    cached: RwLock<Vec<String>>,
    credentials: CredentialStore,
}

impl TagsViewStore {
    pub fn new(credentials: CredentialStore, restore: bool) -> Self {
        let (visited, cached) = if restore {
            (credentials.get_visited_views::<TagView>(), credentials.get_cached_views())
        } else {
            (Vec::new(), Vec::new())
        };
        Self { visited: RwLock::new(visited), cached: RwLock::new(cached), credentials }
    }

    pub fn visited_views(&self) -> Vec<TagView> { self.visited.read().clone() }
    pub fn cached_views(&self) -> Vec<String> { self.cached.read().clone() }

    fn save_visited(&self) -> AppResult<()> {
        let snapshot = self.visited.read().clone();
        self.credentials.set_visited_views(&snapshot)?;
        Ok(())
    }

    fn save_cached(&self) -> AppResult<()> {
        let snapshot = self.cached.read().clone();
        self.credentials.set_cached_views(&snapshot)?;
        Ok(())
    }

    /// Add a tab, or refresh an existing one whose query changed.
    pub fn add_visited_view(&self, view: &TagView) -> AppResult<()> {
        {
            let mut v = self.visited.write();
            match v.iter_mut().find(|t| t.path == view.path) {
                Some(existing) => {
                    if existing.full_path != view.full_path {
                        *existing = view.clone();
                    }
                }
                None => v.push(view.clone()),
            }
        }
        self.save_visited()
    }

    /// Remember a named keep-alive view once.
    pub fn add_cached_view(&self, view: &TagView) -> AppResult<()> {
        let Some(name) = &view.name else { return Ok(()) };
        {
            let mut c = self.cached.write();
            if c.contains(name) || !view.meta.keep_alive {
                return Ok(());
            }
            c.push(name.clone());
        }
        self.save_cached()
    }

    pub fn del_visited_view(&self, view: &TagView) -> AppResult<()> {
        self.visited.write().retain(|t| t.path != view.path);
        self.save_visited()
    }

    pub fn del_cached_view(&self, view: &TagView) -> AppResult<()> {
        let Some(name) = &view.name else { return Ok(()) };
        self.cached.write().retain(|n| n != name);
        self.save_cached()
    }

    /// Keep affixed tabs and `view`.
    pub fn del_others_visited_views(&self, view: &TagView) -> AppResult<()> {
        self.visited.write().retain(|t| t.meta.affix || t.path == view.path);
        self.save_visited()
    }

    /// Keep only `view` among cached names; clears everything if it was not cached.
    pub fn del_others_cached_views(&self, view: &TagView) -> AppResult<()> {
        let Some(name) = &view.name else { return Ok(()) };
        {
            let mut c = self.cached.write();
            if c.contains(name) {
                *c = vec![name.clone()];
            } else {
                c.clear();
            }
        }
        self.save_cached()
    }

    /// Close every tab that is not affixed.
    pub fn del_all_visited_views(&self) -> AppResult<()> {
        self.visited.write().retain(|t| t.meta.affix);
        self.save_visited()
    }

    pub fn del_all_cached_views(&self) -> AppResult<()> {
        self.cached.write().clear();
        self.save_cached()
    }
}

impl RouteListener for TagsViewStore {
    fn on_route_change(&self, to: &ResolvedLocation) {
        if to.name.is_none() {
            return;
        }
        let view = TagView::from(to);
        if let Err(e) = self.add_visited_view(&view).and_then(|_| self.add_cached_view(&view)) {
            warn!(target: "libris::storage", "saving tags view: {}", e);
        }
    }
}
