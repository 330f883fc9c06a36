//! Built-in route tables.
//!
//! `constant_routes` are registered at start and never removed.
//! `dynamic_routes` are gated by `meta.roles` and registered once per session
//! after the role set is known. Every gated route carries a unique name so
//! it can be deregistered on logout.

use std::path::Path;

use anyhow::{Context, Result};

use super::route::{RouteDef, RouteMeta};

pub const LAYOUTS: &str = "layouts";

pub fn constant_routes() -> Vec<RouteDef> {
    vec![
        RouteDef::new("/redirect")
            .component(LAYOUTS)
            .meta(RouteMeta::hidden())
            .child(RouteDef::new(":path(.*)").component("redirect")),
        RouteDef::new("/403").component("error-page/403").meta(RouteMeta::hidden()),
        RouteDef::new("/404").component("error-page/404").meta(RouteMeta::hidden()),
        RouteDef::new("/login").component("login").meta(RouteMeta::hidden()),
    ]
}

pub fn dynamic_routes() -> Vec<RouteDef> {
    let staff = ["admin", "user"];
    vec![
        RouteDef::new("/")
            .named("Notice")
            .component(LAYOUTS)
            .redirect("/notice")
            .meta(RouteMeta { always_show: true, ..RouteMeta::titled("Notice Management") }.with_roles(&staff))
            .child(
                RouteDef::new("notice")
                    .named("notice")
                    .component("notice/index")
                    .meta(RouteMeta { svg_icon: Some("notice".into()), ..RouteMeta::titled("Announcements") }.with_roles(&staff)),
            ),
        RouteDef::new("/book")
            .named("BookManagement")
            .component(LAYOUTS)
            .redirect("/book/list")
            .meta(RouteMeta { always_show: true, ..RouteMeta::titled("Book Management") }.with_roles(&staff))
            .child(
                RouteDef::new("list")
                    .named("bookList")
                    .component("book/list")
                    .meta(RouteMeta { keep_alive: true, ..RouteMeta::titled("Book List") }.with_roles(&staff)),
            )
            .child(
                RouteDef::new("record")
                    .named("recordList")
                    .component("book/record")
                    .meta(RouteMeta::titled("Borrow Records").with_roles(&staff)),
            ),
        RouteDef::new("/dashboard")
            .named("Dashboard")
            .component(LAYOUTS)
            .redirect("/dashboard/index")
            .meta(RouteMeta::default().with_roles(&["root"]))
            .child(
                RouteDef::new("index")
                    .named("dashboard")
                    .component("dashboard/index")
                    .meta(RouteMeta { svg_icon: Some("dashboard".into()), affix: true, ..RouteMeta::titled("Dashboard") }.with_roles(&["root"])),
            ),
        RouteDef::new("/userbook")
            .named("SmartRecommendation")
            .component(LAYOUTS)
            .redirect("/userbook/list")
            .meta(RouteMeta { always_show: true, ..RouteMeta::titled("Smart Recommendation") }.with_roles(&["user"]))
            .child(
                RouteDef::new("list")
                    .named("userbookList")
                    .component("userbook/list")
                    .meta(RouteMeta { keep_alive: true, ..RouteMeta::titled("Recommended Books") }.with_roles(&["user"])),
            ),
        RouteDef::new("/adminList")
            .named("UserManagement")
            .component(LAYOUTS)
            .redirect("/adminList/list")
            .meta(RouteMeta { always_show: true, ..RouteMeta::titled("User Management") }.with_roles(&["root"]))
            .child(
                RouteDef::new("list")
                    .named("adminList")
                    .component("adminList/list")
                    .meta(RouteMeta::titled("Users").with_roles(&["root"])),
            ),
    ]
}

/// Load a route table from a JSON array of route definitions.
pub fn load_routes(path: impl AsRef<Path>) -> Result<Vec<RouteDef>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading route table {}", path.display()))?;
    parse_routes(&text).with_context(|| format!("parsing route table {}", path.display()))
}

pub fn parse_routes(json: &str) -> Result<Vec<RouteDef>> {
    Ok(serde_json::from_str(json)?)
}
