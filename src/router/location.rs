use std::collections::BTreeMap;

use serde::Serialize;

use super::route::{normalize_path, RouteMeta};

/// A registered route record as the live router sees it: absolute path,
/// flattened out of the nested definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    /// Name of the parent record, when it has one.
    pub parent: Option<String>,
}

/// Location split into its path, query and hash parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLocation {
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub hash: String,
}

impl RawLocation {
    pub fn parse(location: &str) -> Self {
        let (rest, hash) = match location.split_once('#') {
            Some((r, h)) => (r, format!("#{}", h)),
            None => (location, String::new()),
        };
        let (path, query) = match rest.split_once('?') {
            Some((p, q)) => (p, parse_query(q)),
            None => (rest, BTreeMap::new()),
        };
        Self { path: normalize_path(path), query, hash }
    }

    pub fn full_path(&self) -> String { compose_full_path(&self.path, &self.query, &self.hash) }
}

pub fn parse_query(q: &str) -> BTreeMap<String, String> {
    q.split('&')
        .filter(|kv| !kv.is_empty())
        .map(|kv| {
            let (k, v) = kv.split_once('=').unwrap_or((kv, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    urlencoding::decode(&s).map(|c| c.into_owned()).unwrap_or(s)
}

pub fn compose_full_path(path: &str, query: &BTreeMap<String, String>, hash: &str) -> String {
    let mut out = path.to_string();
    if !query.is_empty() {
        out.push('?');
        let parts: Vec<String> = query
            .iter()
            .map(|(k, v)| if v.is_empty() { urlencoding::encode(k).into_owned() } else { format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)) })
            .collect();
        out.push_str(&parts.join("&"));
    }
    out.push_str(hash);
    out
}

/// Result of resolving a location against the registered records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedLocation {
    pub path: String,
    pub full_path: String,
    pub name: Option<String>,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub hash: String,
    /// Ancestors first, the matched leaf last. Empty when nothing matched.
    pub matched: Vec<RouteRecord>,
    /// Leaf meta; default when nothing matched.
    pub meta: RouteMeta,
    /// Full path of the location originally asked for, when record redirects were followed.
    pub redirected_from: Option<String>,
}

impl ResolvedLocation {
    pub fn unmatched(raw: &RawLocation) -> Self {
        Self {
            path: raw.path.clone(),
            full_path: raw.full_path(),
            query: raw.query.clone(),
            hash: raw.hash.clone(),
            ..Default::default()
        }
    }

    pub fn is_matched(&self) -> bool { !self.matched.is_empty() }

    pub fn leaf(&self) -> Option<&RouteRecord> { self.matched.last() }
}
