use serde::{Deserialize, Serialize};

/// Presentation and access hints attached to a route.
///
/// Only `roles` participates in gating; the rest is consumed by menu,
/// breadcrumb and tab rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub el_icon: Option<String>,
    /// Hidden from the side menu.
    #[serde(default)]
    pub hidden: bool,
    /// Roles allowed to see the route. Absent or empty: any authenticated role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Defaults to shown when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breadcrumb: Option<bool>,
    /// Pinned in the tags view.
    #[serde(default)]
    pub affix: bool,
    #[serde(default)]
    pub always_show: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_menu: Option<String>,
    #[serde(default)]
    pub keep_alive: bool,
}

impl RouteMeta {
    pub fn titled(title: &str) -> Self { Self { title: Some(title.to_string()), ..Default::default() } }

    pub fn hidden() -> Self { Self { hidden: true, ..Default::default() } }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = Some(roles.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn role_requirement(&self) -> Option<&[String]> { self.roles.as_deref() }
}

/// Declarative, nested route definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Opaque view identifier resolved by the rendering layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    pub fn new(path: &str) -> Self { Self { path: path.to_string(), ..Default::default() } }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    pub fn redirect(mut self, to: &str) -> Self {
        self.redirect = Some(to.to_string());
        self
    }

    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn child(mut self, child: RouteDef) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: Vec<RouteDef>) -> Self {
        self.children = children;
        self
    }

    /// Every name in this subtree, pre-order.
    pub fn names(&self) -> Vec<String> {
        let mut out = Vec::new();
        fn walk(r: &RouteDef, out: &mut Vec<String>) {
            if let Some(n) = &r.name { out.push(n.clone()); }
            for c in &r.children { walk(c, out); }
        }
        walk(self, &mut out);
        out
    }

    /// Depth of the subtree counting this node as level 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

/// Join a route path onto its parent's resolved path the way the matcher does:
/// absolute children stand alone, empty children inherit the parent path.
pub fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child);
    }
    if child.is_empty() {
        return normalize_path(parent);
    }
    normalize_path(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

/// Collapse duplicate slashes and drop a trailing slash (root stays `/`).
pub fn normalize_path(p: &str) -> String {
    let mut out = String::with_capacity(p.len() + 1);
    if !p.starts_with('/') { out.push('/'); }
    let mut prev_slash = false;
    for ch in p.chars() {
        if ch == '/' {
            if prev_slash { continue; }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('/') { out.pop(); }
    out
}
