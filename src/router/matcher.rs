//! Path pattern compilation and matching.
//!
//! Supported segment forms:
//! - `static` text
//! - `:name` (one segment)
//! - `:name(regex)` (custom pattern; may span slashes, e.g. `(.*)`)
//! - any param suffixed with `?` (optional), `*` (zero or more segments) or `+` (one or more)
//!
//! Matching is case-insensitive and tolerates a trailing slash.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{AppError, AppResult};

const DEFAULT_PARAM_RE: &str = "[^/]+";

// Per-segment scores, higher is more specific
const SCORE_STATIC: u16 = 80;
const SCORE_PARAM: u16 = 40;
const SCORE_CUSTOM_PARAM: u16 = 30;
const SCORE_OPTIONAL: u16 = 20;
const SCORE_CATCH_ALL: u16 = 10;
const SCORE_ROOT: u16 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    pub name: String,
    pub repeatable: bool,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    keys: Vec<ParamKey>,
    score: Vec<u16>,
}

impl PathPattern {
    /// Compile an absolute, normalized path pattern.
    pub fn compile(path: &str) -> AppResult<Self> {
        let mut re = String::from("(?i)^");
        let mut keys = Vec::new();
        let mut score = Vec::new();

        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            score.push(SCORE_ROOT);
        } else {
            for seg in split_segments(trimmed) {
                if let Some(rest) = seg.strip_prefix(':') {
                    let (name, custom, modifier) = parse_param(rest)
                        .ok_or_else(|| AppError::user("invalid_route_path", &format!("invalid param segment '{}' in '{}'", seg, path)))?;
                    let inner = custom.clone().unwrap_or_else(|| DEFAULT_PARAM_RE.to_string());
                    let group = format!("p{}", keys.len());
                    match modifier {
                        Modifier::One => re.push_str(&format!("/(?P<{}>{})", group, inner)),
                        Modifier::Optional => re.push_str(&format!("(?:/(?P<{}>{}))?", group, inner)),
                        Modifier::ZeroOrMore => re.push_str(&format!("(?:/(?P<{}>{}(?:/{})*))?", group, inner, inner)),
                        Modifier::OneOrMore => re.push_str(&format!("/(?P<{}>{}(?:/{})*)", group, inner, inner)),
                    }
                    let catch_all = matches!(modifier, Modifier::ZeroOrMore | Modifier::OneOrMore)
                        || custom.as_deref().map(|c| c.contains(".*") || c.contains(".+")).unwrap_or(false);
                    score.push(if catch_all {
                        SCORE_CATCH_ALL
                    } else if modifier == Modifier::Optional {
                        SCORE_OPTIONAL
                    } else if custom.is_some() {
                        SCORE_CUSTOM_PARAM
                    } else {
                        SCORE_PARAM
                    });
                    keys.push(ParamKey {
                        name: name.to_string(),
                        repeatable: matches!(modifier, Modifier::ZeroOrMore | Modifier::OneOrMore),
                        optional: matches!(modifier, Modifier::Optional | Modifier::ZeroOrMore),
                    });
                } else {
                    re.push('/');
                    re.push_str(&regex::escape(seg));
                    score.push(SCORE_STATIC);
                }
            }
        }
        re.push_str("/?$");
        let regex = Regex::new(&re).map_err(|e| AppError::user("invalid_route_path", &format!("'{}': {}", path, e)))?;
        Ok(Self { source: path.to_string(), regex, keys, score })
    }

    pub fn source(&self) -> &str { &self.source }
    pub fn keys(&self) -> &[ParamKey] { &self.keys }
    pub fn score(&self) -> &[u16] { &self.score }

    /// Decoded params when `path` matches; missing optional params are omitted.
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let mut params = BTreeMap::new();
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(m) = caps.name(&format!("p{}", i)) {
                params.insert(key.name.clone(), decode(m.as_str()));
            }
        }
        Some(params)
    }

    pub fn is_match(&self, path: &str) -> bool { self.regex.is_match(path) }
}

/// Order two patterns by specificity: `Greater` means `a` should win.
pub fn compare_scores(a: &[u16], b: &[u16]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    // Deeper wins on a shared prefix
    a.len().cmp(&b.len())
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map(|c| c.into_owned()).unwrap_or_else(|_| raw.to_string())
}

/// Split on `/`, but not inside a param's parenthesized regex.
fn split_segments(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in path.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            '/' if depth == 0 => {
                if i > start {
                    out.push(&path[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < path.len() {
        out.push(&path[start..]);
    }
    out
}

fn parse_param(rest: &str) -> Option<(&str, Option<String>, Modifier)> {
    let name_end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());
    if name_end == 0 {
        return None;
    }
    let name = &rest[..name_end];
    let mut tail = &rest[name_end..];
    let mut custom = None;
    if tail.starts_with('(') {
        let mut depth = 0i32;
        let mut close = None;
        for (i, ch) in tail.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close?;
        custom = Some(tail[1..close].to_string());
        tail = &tail[close + 1..];
    }
    let modifier = match tail {
        "" => Modifier::One,
        "?" => Modifier::Optional,
        "*" => Modifier::ZeroOrMore,
        "+" => Modifier::OneOrMore,
        _ => return None,
    };
    Some((name, custom, modifier))
}
