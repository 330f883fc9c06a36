//! The live router: the set of registered route records and location resolution.

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::location::{RawLocation, ResolvedLocation, RouteRecord};
use super::matcher::{compare_scores, PathPattern};
use super::route::{join_path, RouteDef};
use crate::error::{AppError, AppResult};

/// Record redirects followed by a single `resolve` before giving up.
pub const MAX_RECORD_REDIRECTS: usize = 10;

#[derive(Debug)]
struct Entry {
    id: u64,
    record: RouteRecord,
    pattern: PathPattern,
    parent: Option<u64>,
}

struct Pending {
    record: RouteRecord,
    pattern: PathPattern,
    parent_slot: Option<usize>,
}

#[derive(Debug, Default)]
struct RouterInner {
    // Registration order; parents always precede their children
    entries: Vec<Entry>,
    next_id: u64,
}

impl RouterInner {
    fn index_of(&self, id: u64) -> Option<usize> { self.entries.iter().position(|e| e.id == id) }

    fn find_named(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.record.name.as_deref() == Some(name))
    }

    fn remove_subtree(&mut self, root: u64) -> usize {
        let mut doomed = vec![root];
        for e in &self.entries {
            if let Some(p) = e.parent {
                if doomed.contains(&p) {
                    doomed.push(e.id);
                }
            }
        }
        let before = self.entries.len();
        self.entries.retain(|e| !doomed.contains(&e.id));
        before - self.entries.len()
    }

    fn commit(&mut self, pending: Vec<Pending>, external_parent: Option<u64>) {
        for p in &pending {
            if let Some(name) = &p.record.name {
                if let Some(idx) = self.find_named(name) {
                    let id = self.entries[idx].id;
                    debug!(target: "libris::router", "replacing existing route '{}'", name);
                    self.remove_subtree(id);
                }
            }
        }
        let mut ids = Vec::with_capacity(pending.len());
        for p in pending {
            let id = self.next_id;
            self.next_id += 1;
            let parent = match p.parent_slot {
                Some(slot) => ids.get(slot).copied(),
                None => external_parent,
            };
            ids.push(id);
            self.entries.push(Entry { id, record: p.record, pattern: p.pattern, parent });
        }
    }

    fn best_match(&self, path: &str) -> Option<(usize, std::collections::BTreeMap<String, String>)> {
        let mut best: Option<(usize, std::collections::BTreeMap<String, String>)> = None;
        for (i, e) in self.entries.iter().enumerate() {
            let Some(params) = e.pattern.captures(path) else { continue };
            let better = match &best {
                None => true,
                Some((j, _)) => compare_scores(e.pattern.score(), self.entries[*j].pattern.score()).is_gt(),
            };
            if better {
                best = Some((i, params));
            }
        }
        best
    }

    fn chain(&self, leaf: usize) -> Vec<RouteRecord> {
        let mut out = vec![self.entries[leaf].record.clone()];
        let mut cur = self.entries[leaf].parent;
        while let Some(id) = cur {
            let Some(idx) = self.index_of(id) else { break };
            out.push(self.entries[idx].record.clone());
            cur = self.entries[idx].parent;
        }
        out.reverse();
        out
    }
}

fn collect(def: &RouteDef, parent_path: &str, parent_name: Option<&str>, parent_slot: Option<usize>, out: &mut Vec<Pending>) -> AppResult<()> {
    let path = join_path(parent_path, &def.path);
    let pattern = PathPattern::compile(&path)?;
    let slot = out.len();
    out.push(Pending {
        record: RouteRecord {
            path: path.clone(),
            name: def.name.clone(),
            component: def.component.clone(),
            redirect: def.redirect.clone(),
            meta: def.meta.clone(),
            parent: parent_name.map(str::to_string),
        },
        pattern,
        parent_slot,
    });
    for c in &def.children {
        collect(c, &path, def.name.as_deref(), Some(slot), out)?;
    }
    Ok(())
}

fn redirect_target(record_path: &str, target: &str) -> String {
    if target.starts_with('/') {
        return target.to_string();
    }
    let base = record_path.rsplit_once('/').map(|(b, _)| b).unwrap_or("");
    join_path(base, target)
}

/// Registered route records behind a lock; share it with `Arc<Router>`.
#[derive(Debug, Default)]
pub struct Router {
    inner: RwLock<RouterInner>,
}

impl Router {
    pub fn new() -> Self { Self::default() }

    pub fn with_routes(defs: &[RouteDef]) -> AppResult<Self> {
        let r = Self::new();
        for d in defs {
            r.add_route(d)?;
        }
        Ok(r)
    }

    /// Register a top-level route and its children. A route whose name is
    /// already registered replaces the old one. Nothing is registered if any
    /// path in the subtree fails to compile.
    pub fn add_route(&self, def: &RouteDef) -> AppResult<()> {
        let mut pending = Vec::new();
        collect(def, "", None, None, &mut pending)?;
        debug!(target: "libris::router", "add_route '{}' ({} records)", def.path, pending.len());
        self.inner.write().commit(pending, None);
        Ok(())
    }

    /// Register `def` as a child of the route named `parent`.
    pub fn add_child_route(&self, parent: &str, def: &RouteDef) -> AppResult<()> {
        let mut inner = self.inner.write();
        let idx = inner
            .find_named(parent)
            .ok_or_else(|| AppError::not_found("route_not_found", format!("no route named '{}'", parent)))?;
        let (parent_id, parent_path) = (inner.entries[idx].id, inner.entries[idx].record.path.clone());
        let mut pending = Vec::new();
        collect(def, &parent_path, Some(parent), None, &mut pending)?;
        inner.commit(pending, Some(parent_id));
        Ok(())
    }

    pub fn has_route(&self, name: &str) -> bool { self.inner.read().find_named(name).is_some() }

    /// Remove the named record and everything registered below it.
    pub fn remove_route(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(idx) = inner.find_named(name) else { return false };
        let id = inner.entries[idx].id;
        let n = inner.remove_subtree(id);
        debug!(target: "libris::router", "removed route '{}' ({} records)", name, n);
        true
    }

    /// Every record in registration order.
    pub fn get_routes(&self) -> Vec<RouteRecord> { self.inner.read().entries.iter().map(|e| e.record.clone()).collect() }

    pub fn len(&self) -> usize { self.inner.read().entries.len() }
    pub fn is_empty(&self) -> bool { self.inner.read().entries.is_empty() }

    /// Resolve a location string, following record redirects. Query and hash
    /// carry over to a redirect target that does not set its own.
    pub fn resolve(&self, location: &str) -> AppResult<ResolvedLocation> {
        let inner = self.inner.read();
        let original = RawLocation::parse(location);
        let mut raw = original.clone();
        let mut redirected_from = None;
        for _ in 0..=MAX_RECORD_REDIRECTS {
            let Some((idx, params)) = inner.best_match(&raw.path) else {
                return Ok(ResolvedLocation { redirected_from, ..ResolvedLocation::unmatched(&raw) });
            };
            let record = &inner.entries[idx].record;
            if let Some(target) = &record.redirect {
                let mut next = RawLocation::parse(&redirect_target(&record.path, target));
                if next.query.is_empty() {
                    next.query = raw.query.clone();
                }
                if next.hash.is_empty() {
                    next.hash = raw.hash.clone();
                }
                redirected_from.get_or_insert_with(|| original.full_path());
                raw = next;
                continue;
            }
            return Ok(ResolvedLocation {
                path: raw.path.clone(),
                full_path: raw.full_path(),
                name: record.name.clone(),
                params,
                query: raw.query.clone(),
                hash: raw.hash.clone(),
                matched: inner.chain(idx),
                meta: record.meta.clone(),
                redirected_from,
            });
        }
        Err(AppError::conflict("redirect_loop", format!("too many route redirects resolving '{}'", location)))
    }

    /// Remove every gated record (non-empty `meta.roles`) with its
    /// descendants, named or not. Returns the number of records removed.
    pub fn reset_dynamic(&self) -> usize {
        let mut inner = self.inner.write();
        let gated: Vec<(u64, Option<String>, String)> = inner
            .entries
            .iter()
            .filter(|e| e.record.meta.roles.as_ref().map(|r| !r.is_empty()).unwrap_or(false))
            .map(|e| (e.id, e.record.name.clone(), e.record.path.clone()))
            .collect();
        let mut removed = 0;
        for (id, name, path) in gated {
            // Already gone when an ancestor was removed first
            if inner.index_of(id).is_none() {
                continue;
            }
            if name.is_none() {
                warn!(target: "libris::router", "removing unnamed gated route '{}'", path);
            }
            removed += inner.remove_subtree(id);
        }
        debug!(target: "libris::router", "reset_dynamic removed {} records", removed);
        removed
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
