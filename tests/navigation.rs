use std::path::Path;

use futures::future::join_all;
use libris::app::AppContext;
use libris::config::{AppConfig, RouterConfig};
use libris::guard::NavigationError;
use libris::identity::UserType;
use libris::router::{constant_routes, dynamic_routes, RouteDef, RouteMeta};

fn durable(dir: &Path) -> AppConfig { AppConfig { storage_dir: Some(dir.to_path_buf()), ..Default::default() } }

#[tokio::test]
async fn restart_restores_session_and_preloads_routes() {
    let dir = tempfile::tempdir().unwrap();
    {
        let app = AppContext::new(durable(dir.path())).unwrap();
        app.login_offline("ada", UserType::Admin).unwrap();
        let out = app.navigate("/book/list").await.unwrap();
        assert!(out.replaced, "first visit replays after materializing");
    }

    let app = AppContext::new(durable(dir.path())).unwrap();
    assert_eq!(app.session.token(), "token-admin");
    assert_eq!(app.bootstrap().await.unwrap(), 2);
    assert_eq!(app.session.username(), "ada");

    let out = app.navigate("/book/list").await.unwrap();
    assert!(out.redirects.is_empty());
    assert!(!out.replaced);
    assert_eq!(out.location.name.as_deref(), Some("bookList"));
}

#[tokio::test]
async fn tabs_survive_restart_only_when_cached() {
    let dir = tempfile::tempdir().unwrap();
    {
        let app = AppContext::new(durable(dir.path())).unwrap();
        app.login_offline("ada", UserType::Admin).unwrap();
        app.navigate("/book/list").await.unwrap();
        app.navigate("/book/record").await.unwrap();
        assert_eq!(app.tags_view.visited_views().len(), 2);
    }
    let app = AppContext::new(durable(dir.path())).unwrap();
    assert!(app.tags_view.visited_views().is_empty());
    app.settings.update(|c| c.cache_tags_view = true).unwrap();
    drop(app);

    let app = AppContext::new(durable(dir.path())).unwrap();
    let paths: Vec<String> = app.tags_view.visited_views().into_iter().map(|t| t.path).collect();
    assert_eq!(paths, vec!["/book/list", "/book/record"]);
    assert_eq!(app.tags_view.cached_views(), vec!["bookList"]);
}

#[tokio::test]
async fn concurrent_first_navigations_materialize_once() {
    let app = AppContext::new(AppConfig::default()).unwrap();
    app.login_offline("ada", UserType::Admin).unwrap();
    let targets = ["/", "/book/list", "/book/record", "/book/list?page=3"];
    let results = join_all(targets.iter().map(|t| app.navigate(t))).await;

    let (last, earlier) = results.split_last().unwrap();
    for r in earlier {
        assert!(matches!(r, Err(NavigationError::Cancelled(_))));
    }
    let last = last.as_ref().unwrap();
    assert_eq!(last.location.full_path, "/book/list?page=3");
    assert_eq!(last.location.query.get("page").map(String::as_str), Some("3"));
    assert_eq!(app.progress.finished(), 1);
    // every gated record registered exactly once
    let names: Vec<String> = app.router.get_routes().into_iter().filter_map(|r| r.name).collect();
    assert_eq!(names.iter().filter(|n| *n == "bookList").count(), 1);
}

#[tokio::test]
async fn static_mode_registers_everything_but_still_checks_roles() {
    let cfg = AppConfig { router: RouterConfig { dynamic: false, ..Default::default() }, ..Default::default() };
    let app = AppContext::new(cfg).unwrap();
    app.login_offline("ada", UserType::User).unwrap();

    let out = app.navigate("/adminList/list").await.unwrap();
    assert_eq!(out.location.path, "/403");
    assert!(app.router.has_route("adminList"));
    assert!(app.router.has_route("dashboard"));
}

#[tokio::test]
async fn custom_tables_and_forbidden_constant_route() {
    let mut constant = constant_routes();
    constant.push(RouteDef::new("/audit").named("Audit").meta(RouteMeta::titled("Audit").with_roles(&["root"])));
    let gated = vec![RouteDef::new("/reports")
        .named("Reports")
        .meta(RouteMeta::titled("Reports").with_roles(&["admin"]))
        .child(
            RouteDef::new("monthly")
                .named("Monthly")
                .meta(RouteMeta::titled("Monthly"))
                .child(RouteDef::new("detail/:id").named("MonthlyDetail").meta(RouteMeta::titled("Detail"))),
        )];
    let cfg = AppConfig { router: RouterConfig { third_level_route_cache: true, ..Default::default() }, ..Default::default() };
    let app = AppContext::with_route_tables(cfg, constant, gated).unwrap();
    app.login_offline("ada", UserType::Admin).unwrap();

    assert_eq!(app.navigate("/audit").await.unwrap().location.path, "/403");

    let out = app.navigate("/reports/monthly/detail/42").await.unwrap();
    assert_eq!(out.location.name.as_deref(), Some("MonthlyDetail"));
    assert_eq!(out.location.params.get("id").map(String::as_str), Some("42"));
    // flattened: the leaf hangs directly off the root
    assert_eq!(out.location.matched.len(), 2);
    assert_eq!(app.title.get(), "Detail | Library Admin");
}

#[tokio::test]
async fn unknown_path_after_login_is_not_found() {
    let app = AppContext::new(AppConfig::default()).unwrap();
    app.login_offline("ada", UserType::User).unwrap();
    let out = app.navigate("/no/such/page").await.unwrap();
    assert_eq!(out.location.path, "/404");
    assert_eq!(out.redirects.last().map(String::as_str), Some("/404"));
}
