//! Arena representation of a route tree.
//!
//! Nodes are addressed by [`RouteId`]; parent/child structure lives in an
//! adjacency map. A node with no entry in the map has had its children key
//! removed, which is distinct from nothing at all only while building; when
//! converted back to [`RouteDef`] both read as "no children".

use std::collections::HashMap;

use serde::Serialize;

use super::route::{join_path, RouteDef, RouteMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNode {
    pub path: String,
    pub name: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub meta: RouteMeta,
}

impl RouteNode {
    fn from_def(def: &RouteDef) -> Self {
        Self {
            path: def.path.clone(),
            name: def.name.clone(),
            component: def.component.clone(),
            redirect: def.redirect.clone(),
            meta: def.meta.clone(),
        }
    }

    fn to_def(&self) -> RouteDef {
        RouteDef {
            path: self.path.clone(),
            name: self.name.clone(),
            component: self.component.clone(),
            redirect: self.redirect.clone(),
            meta: self.meta.clone(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteForest {
    nodes: Vec<RouteNode>,
    children: HashMap<RouteId, Vec<RouteId>>,
    roots: Vec<RouteId>,
}

impl RouteForest {
    pub fn new() -> Self { Self::default() }

    pub fn from_defs(defs: &[RouteDef]) -> Self {
        let mut f = Self::new();
        for d in defs {
            f.insert_def(d, None);
        }
        f
    }

    fn insert_def(&mut self, def: &RouteDef, parent: Option<RouteId>) -> RouteId {
        let id = self.push(RouteNode::from_def(def), parent);
        for c in &def.children {
            self.insert_def(c, Some(id));
        }
        id
    }

    /// Append a node under `parent` (or as a new root).
    pub fn push(&mut self, node: RouteNode, parent: Option<RouteId>) -> RouteId {
        let id = RouteId(self.nodes.len());
        self.nodes.push(node);
        match parent {
            Some(p) => self.children.entry(p).or_default().push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Copy `id` and its whole subtree out of `src` under `parent`.
    pub fn graft(&mut self, src: &RouteForest, id: RouteId, parent: Option<RouteId>) -> RouteId {
        let new_id = self.push(src.node(id).clone(), parent);
        for &c in src.children(id) {
            self.graft(src, c, Some(new_id));
        }
        new_id
    }

    pub fn node(&self, id: RouteId) -> &RouteNode { &self.nodes[id.0] }
    pub fn node_mut(&mut self, id: RouteId) -> &mut RouteNode { &mut self.nodes[id.0] }

    pub fn children(&self, id: RouteId) -> &[RouteId] {
        self.children.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_children(&self, id: RouteId) -> bool { !self.children(id).is_empty() }

    /// Replace the child list of `id`; an empty list removes the key.
    pub fn set_children(&mut self, id: RouteId, kids: Vec<RouteId>) {
        if kids.is_empty() {
            self.children.remove(&id);
        } else {
            self.children.insert(id, kids);
        }
    }

    pub fn roots(&self) -> &[RouteId] { &self.roots }
    pub fn len(&self) -> usize { self.roots.len() }
    pub fn is_empty(&self) -> bool { self.roots.is_empty() }

    pub fn find_root(&self, name: &str) -> Option<RouteId> {
        self.roots.iter().copied().find(|&r| self.node(r).name.as_deref() == Some(name))
    }

    pub fn subtree(&self, id: RouteId) -> RouteDef {
        let mut def = self.node(id).to_def();
        def.children = self.children(id).iter().map(|&c| self.subtree(c)).collect();
        def
    }

    pub fn to_defs(&self) -> Vec<RouteDef> { self.roots.iter().map(|&r| self.subtree(r)).collect() }

    /// Every reachable name, pre-order.
    pub fn names(&self) -> Vec<String> {
        let mut out = Vec::new();
        for &r in &self.roots {
            self.walk(r, &mut |n| if let Some(name) = &n.name { out.push(name.clone()) });
        }
        out
    }

    fn walk(&self, id: RouteId, f: &mut impl FnMut(&RouteNode)) {
        f(self.node(id));
        for &c in self.children(id) {
            self.walk(c, f);
        }
    }

    /// Descendants of `id` (not `id` itself) in pre-order, each with its path
    /// resolved against the ancestry starting from `base_path`.
    pub fn resolved_descendants(&self, id: RouteId, base_path: &str) -> Vec<(RouteId, String)> {
        let mut out = Vec::new();
        self.collect_resolved(id, base_path, &mut out);
        out
    }

    fn collect_resolved(&self, id: RouteId, base: &str, out: &mut Vec<(RouteId, String)>) {
        for &c in self.children(id) {
            let full = join_path(base, &self.node(c).path);
            out.push((c, full.clone()));
            self.collect_resolved(c, &full, out);
        }
    }
}

/// Structural equality: same shape and same nodes, ids ignored.
impl PartialEq for RouteForest {
    fn eq(&self, other: &Self) -> bool { self.to_defs() == other.to_defs() }
}

impl From<Vec<RouteDef>> for RouteForest {
    fn from(defs: Vec<RouteDef>) -> Self { Self::from_defs(&defs) }
}
