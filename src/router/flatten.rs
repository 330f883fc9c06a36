//! Route-level promotion for menus that only render two levels.
//!
//! A top-level route qualifies when one of its children has children of its
//! own. Every descendant of a qualifying route is re-attached directly under it
//! with its path resolved to the absolute path the matcher would use, and with
//! its own children removed. Routes that do not qualify are copied unchanged.

use std::collections::HashSet;

use tracing::debug;

use super::forest::{RouteForest, RouteId};
use super::route::join_path;

/// Flatten every qualifying top-level route. Pure: the input is not touched.
pub fn flatten(routes: &RouteForest) -> RouteForest {
    let mut out = RouteForest::new();
    for &root in routes.roots() {
        if is_multi_level(routes, root) {
            promote_route_level(routes, root, &mut out);
        } else {
            out.graft(routes, root, None);
        }
    }
    out
}

/// Three or more levels below and including `id`.
pub fn is_multi_level(routes: &RouteForest, id: RouteId) -> bool {
    routes.children(id).iter().any(|&c| routes.has_children(c))
}

fn promote_route_level(routes: &RouteForest, root: RouteId, out: &mut RouteForest) {
    let root_node = routes.node(root);
    let base = join_path("", &root_node.path);
    let new_root = out.push(root_node.clone(), None);

    let mut seen: HashSet<String> = HashSet::new();
    let mut promoted = 0usize;
    for (id, full_path) in routes.resolved_descendants(root, &base) {
        let node = routes.node(id);
        // Names identify routes; unnamed ones fall back to their resolved path
        let key = match &node.name {
            Some(n) => format!("name:{}", n),
            None => format!("path:{}", full_path),
        };
        if !seen.insert(key) {
            continue;
        }
        let mut flat = node.clone();
        flat.path = full_path;
        out.push(flat, Some(new_root));
        promoted += 1;
    }
    debug!(target: "libris::router", "flattened '{}' into {} direct children", base, promoted);
}

#[cfg(test)]
#[path = "flatten_tests.rs"]
mod flatten_tests;
